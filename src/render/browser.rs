// SPDX-License-Identifier: PMPL-1.0-or-later
//! Headless Chrome renderer.
//!
//! The page is loaded over the DevTools protocol and left to run its
//! scripts and stylesheets. One in-page evaluation reads `getComputedStyle`
//! for every element in document order, focusing each interactive element
//! to read its focused style too. The live DOM is then captured with
//! `page.content()` and the style list is aligned with its elements.

use super::{ComputedStyle, ElementStyle, RenderedDocument, RenderedPage, Renderer, INTERACTIVE_TAGS};
use crate::config::RenderConfig;
use crate::dom::Document;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use serde::Deserialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Entries searched ahead when the captured DOM and the style list disagree
const ALIGN_WINDOW: usize = 8;

const STYLE_SCRIPT: &str = r#"(() => {
  const interactive = new Set(__INTERACTIVE__);
  const read = (el) => {
    const s = getComputedStyle(el);
    return {
      color: s.color,
      backgroundColor: s.backgroundColor,
      outline: s.outlineStyle + ' ' + s.outlineWidth,
      fontSize: s.fontSize,
      display: s.display,
    };
  };
  const entries = [];
  for (const el of document.querySelectorAll('*')) {
    const entry = { tag: el.localName, normal: read(el), focused: null };
    if (interactive.has(el.localName)) {
      el.focus({ preventScroll: true, focusVisible: true });
      if (document.activeElement === el) {
        entry.focused = read(el);
      }
      el.blur();
    }
    entries.push(entry);
  }
  return entries;
})()"#;

/// Computed style as reported by `getComputedStyle`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrowserStyle {
    color: String,
    background_color: String,
    outline: String,
    font_size: String,
    display: String,
}

impl From<BrowserStyle> for ComputedStyle {
    fn from(style: BrowserStyle) -> Self {
        Self {
            color: style.color,
            background_color: style.background_color,
            outline: style.outline,
            font_size: style.font_size,
            display: style.display,
        }
    }
}

/// One element's styles, in `querySelectorAll('*')` order
#[derive(Debug, Clone, Deserialize)]
struct ElementEntry {
    tag: String,
    normal: BrowserStyle,
    focused: Option<BrowserStyle>,
}

/// Renderer backed by a headless Chrome instance
#[derive(Debug, Clone)]
pub struct BrowserRenderer {
    chrome_path: Option<PathBuf>,
    timeout: Duration,
    user_agent: String,
}

impl BrowserRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            chrome_path: config.chrome_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            user_agent: config.user_agent.clone(),
        }
    }

    async fn launch(&self) -> Result<(Browser, tokio::task::JoinHandle<()>)> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.timeout)
            .arg(format!("--user-agent={}", self.user_agent));
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(Error::Render)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Render(format!("Failed to launch browser: {}", e)))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        debug!("Browser launched");
        Ok((browser, handle))
    }

    async fn capture(&self, browser: &Browser, url: &Url) -> Result<RenderedPage> {
        let page = browser
            .new_page(url.as_str())
            .await
            .map_err(|e| page_error(url, e))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| page_error(url, e))?;

        let entries: Vec<ElementEntry> = page
            .evaluate(style_script())
            .await
            .map_err(|e| page_error(url, e))?
            .into_value()
            .map_err(|e| page_error(url, e))?;
        let html = page.content().await.map_err(|e| page_error(url, e))?;

        let document = assemble_document(&html, entries, Some(url.clone()));
        Ok(RenderedPage::new(url.clone(), document))
    }
}

fn page_error(url: &Url, e: impl Display) -> Error {
    Error::Render(format!("{}: {}", url, e))
}

fn style_script() -> String {
    let tags: Vec<String> = INTERACTIVE_TAGS.iter().map(|t| format!("'{}'", t)).collect();
    STYLE_SCRIPT.replace("__INTERACTIVE__", &format!("[{}]", tags.join(", ")))
}

/// Parse the captured HTML and attach the browser's styles to its elements.
///
/// Entries are matched to elements in document order by tag. An element
/// with no matching entry nearby is left without a style.
fn assemble_document(html: &str, entries: Vec<ElementEntry>, base_url: Option<Url>) -> RenderedDocument {
    let dom = Document::parse(html);
    let mut styles: Vec<Option<ElementStyle>> = vec![None; dom.len()];
    let mut cursor = 0;
    let mut skipped = 0;
    let mut unstyled = 0;

    for id in dom.elements() {
        let tag = dom.tag(id).unwrap_or_default();
        let offset = entries[cursor.min(entries.len())..]
            .iter()
            .take(ALIGN_WINDOW)
            .position(|e| e.tag.eq_ignore_ascii_case(tag));
        let Some(offset) = offset else {
            unstyled += 1;
            continue;
        };
        let entry = &entries[cursor + offset];
        styles[id.index()] = Some(ElementStyle {
            normal: entry.normal.clone().into(),
            focused: entry.focused.clone().map(Into::into),
        });
        skipped += offset;
        cursor += offset + 1;
    }

    if skipped > 0 || unstyled > 0 {
        warn!(
            "Computed styles did not line up with the captured DOM ({} entries skipped, {} elements unstyled)",
            skipped, unstyled
        );
    }
    RenderedDocument::new(dom, styles, base_url)
}

#[async_trait]
impl Renderer for BrowserRenderer {
    #[instrument(skip_all, fields(url = %url))]
    async fn render(&self, url: &Url) -> Result<RenderedPage> {
        match url.scheme() {
            "http" | "https" => {}
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::InvalidInput(format!("Not a local path: {}", url)))?;
                tokio::fs::metadata(&path)
                    .await
                    .map_err(|e| Error::Render(format!("{}: {}", path.display(), e)))?;
            }
            other => {
                return Err(Error::InvalidInput(format!(
                    "Unsupported URL scheme '{}'",
                    other
                )))
            }
        }

        let (mut browser, handle) = self.launch().await?;
        let result = self.capture(&browser, url).await;

        if let Err(e) = browser.close().await {
            debug!("Closing browser failed: {}", e);
        }
        let _ = browser.wait().await;
        handle.abort();

        let page = result?;
        info!(
            "Rendered {} in Chrome ({} nodes, {} bytes)",
            url,
            page.document.dom().len(),
            page.html.len()
        );
        Ok(page)
    }
}
