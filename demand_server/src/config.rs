//! Server configuration read from the environment

use std::env;
use std::path::PathBuf;

/// Frontend development origin allowed by default
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed to make credentialed cross-origin requests
    pub allowed_origin: String,
    pub scaler_path: PathBuf,
    pub model_dir: PathBuf,
    /// Limit on the whole multipart body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.into(),
            scaler_path: PathBuf::from("scaler.json"),
            model_dir: PathBuf::from("demand_model"),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `ALLOWED_ORIGIN`, `SCALER_PATH`, `MODEL_DIR` and
    /// `MAX_UPLOAD_BYTES`; unset or unparsable values keep their defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            allowed_origin: env::var("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin),
            scaler_path: env::var("SCALER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.scaler_path),
            model_dir: env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
        }
    }

    /// Get bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
