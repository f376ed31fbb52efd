use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

/// Runtime settings, merged from defaults, an optional `datalens.toml`,
/// and `DATALENS_`-prefixed environment variables (highest precedence).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub preview_rows: usize,
    pub type_sample_rows: usize,
    /// Allowed CORS origin; permissive when unset.
    pub cors_origin: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: "sqlite://data/datalens.db".to_string(),
            upload_dir: PathBuf::from("data/uploads"),
            max_upload_bytes: 25 * 1024 * 1024,
            preview_rows: 5,
            type_sample_rows: 2000,
            cors_origin: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("datalens.toml"))
            .merge(Env::prefixed("DATALENS_"))
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.port, 8000);
        assert!(settings.max_upload_bytes > 0);
        assert!(settings.preview_rows > 0);
    }

    #[test]
    fn test_env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DATALENS_PORT", "9001");
            jail.set_env("DATALENS_MAX_UPLOAD_BYTES", "1024");
            let settings = Settings::load().expect("settings load");
            assert_eq!(settings.port, 9001);
            assert_eq!(settings.max_upload_bytes, 1024);
            Ok(())
        });
    }
}
