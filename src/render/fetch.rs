// SPDX-License-Identifier: PMPL-1.0-or-later
//! Static renderer: loads HTML and its linked stylesheets over HTTP or from
//! disk and resolves styles without executing scripts.

use super::style::{self, LinkedSheets};
use super::{RenderedPage, Renderer};
use crate::config::RenderConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Renderer for `http(s)://` and `file://` URLs
#[derive(Debug, Clone)]
pub struct StaticRenderer {
    client: reqwest::Client,
}

impl StaticRenderer {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::InvalidInput(format!("Not a local path: {}", url)))?;
                debug!("Reading {}", path.display());
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| Error::Render(format!("{}: {}", path.display(), e)))
            }
            "http" | "https" => {
                debug!("Fetching {}", url);
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| Error::Render(format!("{}: {}", url, e)))?;
                response
                    .text()
                    .await
                    .map_err(|e| Error::Render(format!("{}: {}", url, e)))
            }
            other => Err(Error::InvalidInput(format!(
                "Unsupported URL scheme '{}'",
                other
            ))),
        }
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn render(&self, url: &Url) -> Result<RenderedPage> {
        let source = self.fetch(url).await?;

        let mut sheets = LinkedSheets::new();
        for href in style::linked_stylesheets(&source, url) {
            match self.fetch(&href).await {
                Ok(css) => {
                    sheets.insert(href.to_string(), css);
                }
                Err(e) => warn!("Skipping stylesheet {}: {}", href, e),
            }
        }

        let document = style::render_with_stylesheets(&source, Some(url.clone()), &sheets);
        let page = RenderedPage::new(url.clone(), document);
        info!(
            "Rendered {} ({} nodes, {} stylesheets, {} bytes)",
            url,
            page.document.dom().len(),
            sheets.len(),
            page.html.len()
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_render_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<html><body><p>Hi</p></body></html>").unwrap();

        let renderer = StaticRenderer::new(&RenderConfig::default()).unwrap();
        let url = Url::from_file_path(&path).unwrap();
        let page = renderer.render(&url).await.unwrap();
        assert!(page.html.contains("<p>Hi</p>"));
        assert_eq!(page.url, url);
    }

    #[tokio::test]
    async fn test_linked_stylesheet_is_applied() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("site.css"), "p { color: #eee }").unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(
            &path,
            r#"<html><head><link rel="stylesheet" href="site.css"><link rel="stylesheet" href="gone.css"></head><body><p>Hi</p></body></html>"#,
        )
        .unwrap();

        let renderer = StaticRenderer::new(&RenderConfig::default()).unwrap();
        let page = renderer.render(&Url::from_file_path(&path).unwrap()).await.unwrap();
        let p = page.document.dom().find_first("p").unwrap();
        assert_eq!(page.document.style(p).unwrap().color, "#eee");
    }

    #[tokio::test]
    async fn test_missing_file_is_render_error() {
        let renderer = StaticRenderer::new(&RenderConfig::default()).unwrap();
        let url = Url::parse("file:///nonexistent/wcagbot/page.html").unwrap();
        let err = renderer.render(&url).await.unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let renderer = StaticRenderer::new(&RenderConfig::default()).unwrap();
        let url = Url::parse("ftp://example.com/page.html").unwrap();
        let err = renderer.render(&url).await.unwrap_err();
        assert!(err.is_input_error());
    }
}
