//! Static file serving restricted to a whitelist of request paths.
//!
//! Only paths listed in `static_files.whitelist` are ever mapped to disk,
//! so request paths are never resolved against the filesystem directly.
//! Paths listed in `static_files.templates` are read as text and get their
//! `{time}` placeholder substituted before being sent.

pub mod template;

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context;

use crate::config::StaticFilesConfig;
use crate::http::mime::mime_type_for_path;
use crate::http::request::ParsedRequest;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

#[derive(Debug, Clone)]
pub struct StaticSite {
    root: PathBuf,
    whitelist: HashSet<String>,
    templates: HashSet<String>,
}

impl StaticSite {
    pub fn new(cfg: &StaticFilesConfig) -> Self {
        Self {
            root: cfg.root.clone(),
            whitelist: cfg.whitelist.iter().cloned().collect(),
            templates: cfg.templates.iter().cloned().collect(),
        }
    }

    pub fn is_whitelisted(&self, path: &str) -> bool {
        self.whitelist.contains(path)
    }

    /// Builds the response for a framed request.
    pub async fn respond(&self, req: &ParsedRequest) -> Response {
        let path = req.path_without_query();

        if !self.is_whitelisted(path) {
            tracing::debug!(path, "path not whitelisted");
            return Response::not_found();
        }

        match self.load(path).await {
            Ok(body) => ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", mime_type_for_path(path))
                .body(body)
                .build(),
            Err(e) => {
                tracing::error!(path, error = %e, "failed to load static file");
                Response::internal_error()
            }
        }
    }

    async fn load(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let file = self.root.join(path.trim_start_matches('/'));

        if self.templates.contains(path) {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading template {}", file.display()))?;
            return Ok(template::render_now(&text).into_bytes());
        }

        tokio::fs::read(&file)
            .await
            .with_context(|| format!("reading {}", file.display()))
    }
}
