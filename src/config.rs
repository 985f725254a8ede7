// Configuration module
// Loads typed configuration from an optional config file, environment
// variables and built-in defaults.

use serde::Deserialize;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Servable tree configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Root of the servable tree. When unset, the directory containing the
    /// executable is used so the binary can sit next to the site files.
    pub root: Option<String>,
    /// Document served for `/` and for directories that contain one.
    pub index_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the specified file path (without extension).
    /// The file is optional; defaults cover every key.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("RECITE"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("site.index_file", "index.html")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Resolve the servable root to a canonical path.
    pub fn resolve_root(&self) -> io::Result<PathBuf> {
        let root = match &self.site.root {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_exe()?
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory")
                })?,
        };
        root.canonicalize()
    }
}

/// Shared state handed to every connection. Immutable after startup, so
/// request handling needs no locks.
pub struct AppState {
    pub config: Config,
    /// Canonicalized servable root; every request resolves under this path.
    pub root: PathBuf,
}

impl AppState {
    pub fn new(config: Config, root: PathBuf) -> Self {
        Self { config, root }
    }
}
