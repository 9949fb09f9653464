// SPDX-License-Identifier: PMPL-1.0-or-later
//! Page scanner: render a URL, run the checks, normalize the findings.

use crate::analyzers;
use crate::config::{AnalysisConfig, Config};
use crate::error::{Error, Result};
use crate::findings::ScanSnapshot;
use crate::normalize;
use crate::render::{RenderedPage, Renderer};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Turn user input into a URL; anything without a scheme is a local path
pub fn parse_target(input: &str) -> Result<Url> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidInput("URL is required".to_string()));
    }

    match Url::parse(input) {
        // single-letter schemes are Windows drive letters
        Ok(url) if url.scheme().len() > 1 => Ok(url),
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = std::path::absolute(Path::new(input))?;
            Url::from_file_path(&path)
                .map_err(|_| Error::InvalidInput(format!("Invalid path: {}", input)))
        }
        Err(e) => Err(Error::Url(e)),
    }
}

/// Render `target` and scan it
pub async fn scan(target: &str, renderer: &dyn Renderer, config: &Config) -> Result<ScanSnapshot> {
    let url = parse_target(target)?;
    info!("Scanning {}", url);

    let limit = Duration::from_secs(config.render.timeout_secs);
    let page = tokio::time::timeout(limit, renderer.render(&url))
        .await
        .map_err(|_| {
            Error::Render(format!(
                "Timed out after {}s loading {}",
                config.render.timeout_secs, url
            ))
        })??;

    Ok(analyze_page(&page, &config.analysis))
}

/// Run the checks over an already rendered page
pub fn analyze_page(page: &RenderedPage, config: &AnalysisConfig) -> ScanSnapshot {
    let raw = analyzers::scan_document(&page.document, config);
    debug!("Checks produced {} raw records", raw.len());

    let mut findings = normalize::normalize(&raw);
    if config.locate_lines {
        normalize::enrich(&mut findings, &page.html, config.max_snippet_len);
    }

    let snapshot = ScanSnapshot::new(page.url.as_str(), page.html.clone(), findings);
    info!("{}", snapshot.summary());
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::Criterion;
    use async_trait::async_trait;

    struct FixedRenderer(&'static str);

    #[async_trait]
    impl Renderer for FixedRenderer {
        async fn render(&self, url: &Url) -> Result<RenderedPage> {
            Ok(RenderedPage::from_source(url.clone(), self.0))
        }
    }

    struct SlowRenderer;

    #[async_trait]
    impl Renderer for SlowRenderer {
        async fn render(&self, url: &Url) -> Result<RenderedPage> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(RenderedPage::from_source(url.clone(), "<p>late</p>"))
        }
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(
            parse_target("https://example.com/a").unwrap().as_str(),
            "https://example.com/a"
        );
        assert_eq!(parse_target("page.html").unwrap().scheme(), "file");
        assert!(parse_target("   ").unwrap_err().is_input_error());
        assert!(parse_target("http://[::1").is_err());
    }

    #[tokio::test]
    async fn test_scan_with_renderer() {
        let renderer = FixedRenderer(
            "<html><body>\n<h1>Title</h1>\n<img src=\"cat.png\">\n</body></html>",
        );
        let snapshot = scan("https://example.com/", &renderer, &Config::default())
            .await
            .unwrap();

        assert_eq!(snapshot.url, "https://example.com/");
        let alt = snapshot.by_criterion(Criterion::AltText);
        assert_eq!(alt.len(), 1);
        assert_eq!(alt[0].details, "Image src=\"https://example.com/cat.png\"");
        assert_eq!(alt[0].line_number, Some(3));
        assert_eq!(snapshot.by_criterion(Criterion::Landmark).len(), 4);
        assert_eq!(snapshot.summary(), format!("Analyzed https://example.com/; {} issues found.", snapshot.len()));
    }

    #[tokio::test]
    async fn test_locate_can_be_disabled() {
        let renderer = FixedRenderer("<html><body>\n<img src=\"cat.png\">\n</body></html>");
        let mut config = Config::default();
        config.analysis.locate_lines = false;
        let snapshot = scan("https://example.com/", &renderer, &config).await.unwrap();
        assert!(snapshot.findings.iter().all(|f| f.line_number.is_none()));
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let err = scan("", &FixedRenderer("<p></p>"), &Config::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_timeout() {
        let mut config = Config::default();
        config.render.timeout_secs = 5;
        let err = scan("https://example.com/", &SlowRenderer, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Render(_)));
        assert!(err.to_string().contains("Timed out after 5s"));
    }
}
