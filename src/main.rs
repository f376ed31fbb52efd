use std::sync::Arc;

use tracing::info;

use datalens::application::{AnalyzeUseCase, IngestUseCase, SummarizeOptions};
use datalens::domain::error::AppError;
use datalens::infrastructure::config::Settings;
use datalens::infrastructure::db::analyses::AnalysisRepository;
use datalens::infrastructure::db::connection::{connect_pool, init_db};
use datalens::infrastructure::db::uploads::UploadRepository;
use datalens::infrastructure::storage::ensure_upload_root;
use datalens::interfaces::http::{start_server, AppState};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .try_init();

    let settings = Settings::load()?;

    ensure_upload_root(&settings.upload_dir)
        .map_err(|e| AppError::IoError(format!("Failed to create upload dir: {}", e)))?;

    let pool = connect_pool(&settings.database_url).await?;
    init_db(&pool).await?;

    let uploads = Arc::new(UploadRepository::new(pool.clone()));
    let analyses = Arc::new(AnalysisRepository::new(pool));

    let summarize_options = SummarizeOptions {
        preview_rows: settings.preview_rows,
        type_sample_rows: settings.type_sample_rows,
    };

    let state = Arc::new(AppState {
        ingest_use_case: IngestUseCase::new(uploads.clone()),
        analyze_use_case: Arc::new(AnalyzeUseCase::new(
            uploads.clone(),
            analyses.clone(),
            summarize_options,
        )),
        uploads,
        analyses,
        settings: settings.clone(),
    });

    info!(
        host = %settings.host,
        port = settings.port,
        database_url = %settings.database_url,
        "Starting datalens"
    );

    start_server(state)?.await?;
    Ok(())
}
