//! Server configuration.
//!
//! Values start from defaults, are overlaid by the YAML file named in
//! `RAWHTTP_CONFIG` (when set), and finally `LISTEN` overrides the listen
//! address.
//!
//! ```yaml
//! server:
//!   listen_addr: 0.0.0.0:9999
//!   workers: 64
//!   mode: static
//! framing:
//!   allowed_methods: [GET, POST]
//!   buffer_capacity: 4096
//!   header_match: exact
//! static_files:
//!   root: ./public
//!   whitelist: [/index.html, /classic.html]
//!   templates: [/classic.html]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::http::headers::HeaderMatch;
use crate::http::request::Method;

pub const CONFIG_ENV: &str = "RAWHTTP_CONFIG";
pub const LISTEN_ENV: &str = "LISTEN";

const MIN_BUFFER_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub framing: FramingConfig,
    pub static_files: StaticFilesConfig,
}

/// What the server does with a successfully framed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServeMode {
    /// Serve whitelisted files from `static_files.root`.
    #[default]
    Static,
    /// Acknowledge every request with an empty `200 OK`.
    Ack,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Maximum number of connections handled concurrently.
    pub workers: usize,
    pub mode: ServeMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            workers: 64,
            mode: ServeMode::Static,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    pub allowed_methods: Vec<Method>,
    /// Size of the single bounded read holding request line and headers.
    pub buffer_capacity: usize,
    pub max_body_size: usize,
    pub read_timeout_ms: u64,
    pub header_match: HeaderMatch,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            allowed_methods: vec![Method::GET, Method::POST],
            buffer_capacity: 4096,
            max_body_size: 1024 * 1024,
            read_timeout_ms: 10_000,
            header_match: HeaderMatch::Exact,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    pub whitelist: Vec<String>,
    /// Whitelisted paths whose `{time}` placeholder is substituted.
    pub templates: Vec<String>,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        let whitelist = [
            "/index.html",
            "/spring.svg",
            "/spring.png",
            "/resources.html",
            "/styles.css",
            "/app.js",
            "/links.html",
            "/forms.html",
            "/classic.html",
            "/events.html",
            "/events.js",
        ];

        Self {
            root: PathBuf::from("./public"),
            whitelist: whitelist.iter().map(|p| p.to_string()).collect(),
            templates: vec!["/classic.html".to_string()],
        }
    }
}

impl Config {
    /// Loads configuration from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(addr) = std::env::var(LISTEN_ENV) {
            cfg.server.listen_addr = addr;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.workers == 0 {
            return Err(ConfigError::Invalid("server.workers must be at least 1".into()));
        }

        if self.framing.buffer_capacity < MIN_BUFFER_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "framing.buffer_capacity must be at least {MIN_BUFFER_CAPACITY}"
            )));
        }

        if self.framing.allowed_methods.is_empty() {
            return Err(ConfigError::Invalid("framing.allowed_methods is empty".into()));
        }

        let sf = &self.static_files;
        if let Some(bad) = sf
            .whitelist
            .iter()
            .chain(&sf.templates)
            .find(|p| !p.starts_with('/'))
        {
            return Err(ConfigError::Invalid(format!(
                "static path {bad:?} must start with '/'"
            )));
        }

        Ok(())
    }
}
