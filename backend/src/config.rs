use std::{env, path::PathBuf};

/// File extensions accepted by the upload endpoint.
pub const ALLOWED_FILE_TYPES: &[&str] = &["jpg", "jpeg", "png", "gif", "pdf", "doc", "docx"];

/// Upload size cap: 10 MB.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Server configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub bind_addr: String,
    pub port: String,
    pub site_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let db_path = env::var("ECHHAPA_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/echhapa.db"));
        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let site_url = env::var("SITE_URL")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Self {
            db_path,
            uploads_dir,
            bind_addr,
            port,
            site_url,
        }
    }
}
