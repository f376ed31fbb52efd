use std::sync::Arc;

use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::{delete, dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use validator::Validate;

use crate::application::{AnalyzeUseCase, IngestUseCase, SavedFile};
use crate::domain::analysis::Analysis;
use crate::domain::error::{AppError, Result};
use crate::domain::upload::{DataUpload, FileKind, UploadStatus};
use crate::infrastructure::config::Settings;
use crate::infrastructure::db::analyses::AnalysisRepository;
use crate::infrastructure::db::uploads::UploadRepository;
use crate::infrastructure::storage;

pub struct AppState {
    pub ingest_use_case: IngestUseCase,
    pub analyze_use_case: Arc<AnalyzeUseCase>,
    pub uploads: Arc<UploadRepository>,
    pub analyses: Arc<AnalysisRepository>,
    pub settings: Settings,
}

#[derive(Serialize)]
struct UploadAccepted {
    upload_id: i64,
    filename: String,
    status: UploadStatus,
    message: String,
}

#[derive(Serialize)]
struct AnalysisResponse {
    analysis_id: i64,
    data_upload_id: i64,
    analysis_type: String,
    confidence: Option<f64>,
    created_at: chrono::DateTime<chrono::Utc>,
    summary: serde_json::Value,
}

impl AnalysisResponse {
    fn from_analysis(analysis: Analysis) -> Result<Self> {
        let summary = serde_json::from_str(&analysis.result)
            .map_err(|e| AppError::Internal(format!("Stored summary is not valid JSON: {}", e)))?;
        Ok(Self {
            analysis_id: analysis.id,
            data_upload_id: analysis.data_upload_id,
            analysis_type: analysis.analysis_type,
            confidence: analysis.confidence,
            created_at: analysis.created_at,
            summary,
        })
    }
}

#[derive(Deserialize, Validate)]
struct ListQuery {
    #[validate(range(min = 1, max = 500))]
    limit: Option<i64>,
}

fn error_response(err: &AppError) -> HttpResponse {
    match err {
        AppError::NotFound(_) => HttpResponse::NotFound().body(err.to_string()),
        AppError::ValidationError(_) => HttpResponse::BadRequest().body(err.to_string()),
        _ => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the datalens API"
    }))
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" }))
}

#[post("/upload")]
async fn upload_file(data: web::Data<AppState>, mut payload: Multipart) -> impl Responder {
    let file_part = match read_file_part(&mut payload, data.settings.max_upload_bytes).await {
        Ok(part) => part,
        Err(err) => return error_response(&err),
    };

    let stored_path = storage::stored_file_path(&data.settings.upload_dir, file_part.kind);
    if let Err(err) = tokio::fs::write(&stored_path, &file_part.body).await {
        return error_response(&AppError::IoError(format!(
            "Failed to store upload: {}",
            err
        )));
    }

    let saved = SavedFile {
        filename: file_part.filename,
        kind: file_part.kind,
        stored_path: stored_path.clone(),
        size_bytes: file_part.body.len() as i64,
        checksum: file_part.checksum,
    };

    match data.ingest_use_case.execute(saved).await {
        Ok(upload) => {
            spawn_analysis(data.analyze_use_case.clone(), upload.clone());
            HttpResponse::Ok().json(UploadAccepted {
                upload_id: upload.id,
                filename: upload.filename,
                status: upload.status,
                message: "File uploaded successfully and is being processed.".to_string(),
            })
        }
        Err(err) => {
            // The row was never written; do not keep the orphaned file.
            storage::remove_stored_file(&stored_path.to_string_lossy());
            error_response(&err)
        }
    }
}

#[get("/uploads")]
async fn list_uploads(data: web::Data<AppState>, query: web::Query<ListQuery>) -> impl Responder {
    if let Err(err) = query.validate() {
        return error_response(&AppError::ValidationError(err.to_string()));
    }
    let limit = query.limit.unwrap_or(50);

    match data.uploads.list(limit).await {
        Ok(uploads) => HttpResponse::Ok().json(uploads),
        Err(err) => error_response(&err),
    }
}

#[get("/uploads/{id}")]
async fn get_upload(data: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    match data.uploads.get(path.into_inner()).await {
        Ok(upload) => HttpResponse::Ok().json(upload),
        Err(err) => error_response(&err),
    }
}

#[delete("/uploads/{id}")]
async fn delete_upload(data: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();

    let upload = match data.uploads.get(id).await {
        Ok(upload) => upload,
        Err(err) => return error_response(&err),
    };

    if let Err(err) = data.analyses.delete_for_upload(id).await {
        return error_response(&err);
    }
    if let Err(err) = data.uploads.delete(id).await {
        return error_response(&err);
    }
    storage::remove_stored_file(&upload.stored_path);

    info!(upload_id = id, "Upload deleted");
    HttpResponse::Ok().json(serde_json::json!({
        "upload_id": id,
        "message": "Upload deleted"
    }))
}

#[get("/uploads/{id}/analysis")]
async fn get_upload_analysis(data: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();

    // Distinguish "no such upload" from "not analyzed yet".
    if let Err(err) = data.uploads.get(id).await {
        return error_response(&err);
    }

    match data.analyses.latest_for_upload(id).await {
        Ok(analysis) => match AnalysisResponse::from_analysis(analysis) {
            Ok(response) => HttpResponse::Ok().json(response),
            Err(err) => error_response(&err),
        },
        Err(err) => error_response(&err),
    }
}

#[get("/analyses/{id}")]
async fn get_analysis(data: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    match data.analyses.get(path.into_inner()).await {
        Ok(analysis) => match AnalysisResponse::from_analysis(analysis) {
            Ok(response) => HttpResponse::Ok().json(response),
            Err(err) => error_response(&err),
        },
        Err(err) => error_response(&err),
    }
}

/// The validated file part of a multipart upload, fully buffered.
struct FilePart {
    filename: String,
    kind: FileKind,
    body: Vec<u8>,
    checksum: String,
}

async fn read_file_part(payload: &mut Multipart, max_bytes: u64) -> Result<FilePart> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            AppError::ValidationError(format!("Invalid multipart payload: {}", e))
        })?;

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()));
        let Some(filename) = filename else {
            // Not a file field; skip it.
            continue;
        };

        let content_type = field.content_type().map(|mime| mime.essence_str().to_string());
        let kind = FileKind::from_upload(content_type.as_deref(), &filename)?;

        let mut body: Vec<u8> = Vec::new();
        let mut hasher = Sha256::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::ValidationError(format!("Failed to read upload body: {}", e))
            })?;
            if (body.len() + chunk.len()) as u64 > max_bytes {
                return Err(AppError::ValidationError(format!(
                    "File exceeds the maximum upload size of {} bytes",
                    max_bytes
                )));
            }
            hasher.update(&chunk);
            body.extend_from_slice(&chunk);
        }

        return Ok(FilePart {
            filename,
            kind,
            checksum: hex::encode(hasher.finalize()),
            body,
        });
    }

    Err(AppError::ValidationError(
        "No file field in upload".to_string(),
    ))
}

fn spawn_analysis(analyze: Arc<AnalyzeUseCase>, upload: DataUpload) {
    tokio::spawn(async move {
        // Failures are logged and recorded on the upload row by the use case.
        let _ = analyze.run(&upload).await;
    });
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(health)
        .service(upload_file)
        .service(list_uploads)
        .service(get_upload_analysis)
        .service(get_upload)
        .service(delete_upload)
        .service(get_analysis);
}

pub fn start_server(state: Arc<AppState>) -> std::io::Result<Server> {
    let bind_addr = (state.settings.host.clone(), state.settings.port);
    let cors_origin = state.settings.cors_origin.clone();
    let data = web::Data::from(state);

    let server = HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };

        App::new()
            .wrap(cors)
            .app_data(data.clone())
            .configure(configure_routes)
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::SummarizeOptions;
    use crate::infrastructure::db::connection::{init_db, memory_pool};
    use actix_web::test;

    async fn test_state(upload_dir: std::path::PathBuf) -> web::Data<AppState> {
        test_state_with(Settings {
            upload_dir,
            ..Settings::default()
        })
        .await
    }

    async fn test_state_with(settings: Settings) -> web::Data<AppState> {
        let pool = memory_pool().await;
        init_db(&pool).await.unwrap();
        let uploads = Arc::new(UploadRepository::new(pool.clone()));
        let analyses = Arc::new(AnalysisRepository::new(pool));

        web::Data::new(AppState {
            ingest_use_case: IngestUseCase::new(uploads.clone()),
            analyze_use_case: Arc::new(AnalyzeUseCase::new(
                uploads.clone(),
                analyses.clone(),
                SummarizeOptions::default(),
            )),
            uploads,
            analyses,
            settings,
        })
    }

    fn multipart_body(filename: &str, content_type: &str, content: &str) -> (String, String) {
        let boundary = "----datalens-test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n{content}\r\n--{boundary}--\r\n"
        );
        (
            format!("multipart/form-data; boundary={boundary}"),
            body,
        )
    }

    #[actix_web::test]
    async fn test_index_and_health() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path().to_path_buf()).await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_routes)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert!(resp.status().is_success());

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_web::test]
    async fn test_upload_accepts_csv() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path().to_path_buf()).await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure_routes),
        )
        .await;

        let (content_type, body) =
            multipart_body("sales.csv", "text/csv", "id,name\n1,Alice\n2,Bob");
        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let accepted: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(accepted["status"], "processing");
        assert_eq!(accepted["filename"], "sales.csv");

        let upload_id = accepted["upload_id"].as_i64().unwrap();
        let upload = state.uploads.get(upload_id).await.unwrap();
        assert_eq!(upload.filename, "sales.csv");
        assert!(std::path::Path::new(&upload.stored_path).exists());
    }

    #[actix_web::test]
    async fn test_upload_rejects_unsupported_type() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path().to_path_buf()).await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_routes)).await;

        let (content_type, body) = multipart_body("notes.txt", "text/plain", "hello");
        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_upload_rejects_oversized_file() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state_with(Settings {
            upload_dir: tmp.path().to_path_buf(),
            max_upload_bytes: 8,
            ..Settings::default()
        })
        .await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure_routes),
        )
        .await;

        // 22 bytes, well past the 8-byte cap.
        let (content_type, body) =
            multipart_body("big.csv", "text/csv", "id,name\n1,Alice\n2,Bob\n");
        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

        // Nothing was recorded or stored.
        assert!(state.uploads.list(10).await.unwrap().is_empty());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);

        // A body of exactly max_upload_bytes is still accepted.
        let (content_type, body) = multipart_body("tiny.csv", "text/csv", "a,b\n1,2\n");
        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(state.uploads.list(10).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_get_upload_missing_is_404() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path().to_path_buf()).await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_routes)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/uploads/42").to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_list_limit_is_validated() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path().to_path_buf()).await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_routes)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/uploads?limit=0").to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/uploads").to_request(),
        )
        .await;
        assert!(resp.status().is_success());
    }
}
