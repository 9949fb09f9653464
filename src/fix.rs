// SPDX-License-Identifier: PMPL-1.0-or-later
//! Automated fixes.
//!
//! Replays the findings of a [`ScanSnapshot`] against its HTML and returns
//! the patched document. Fixes are blunt (forced colors, a fixed outline,
//! placeholder alt text and landmark regions); they make the issue visible
//! as fixed, they do not verify it.

use crate::analyzers::landmarks::LANDMARKS;
use crate::config::FixConfig;
use crate::dom::{Document, NodeId, QueryIndex};
use crate::error::{Error, Result};
use crate::findings::{Criterion, NormalizedFinding, ScanSnapshot};
use crate::render::style::split_top_level;
use tracing::{debug, info};

const HEADER_HTML: &str = "<header><h1>Header</h1></header>";
const NAV_HTML: &str = "<nav>Main Navigation</nav>";
const MAIN_HTML: &str = "<main>Main Content</main>";
const FOOTER_HTML: &str = "<footer>Footer Info</footer>";

/// Apply every finding's fix to the snapshot HTML
pub fn apply_fixes(snapshot: &ScanSnapshot, config: &FixConfig) -> Result<String> {
    if snapshot.html.trim().is_empty() {
        return Err(Error::NoSnapshot);
    }

    let (mut dom, index) = Document::parse_with_index(&snapshot.html);
    let mut applied = 0usize;
    let mut skipped = 0usize;

    for finding in &snapshot.findings {
        let changed = match finding.criterion {
            Criterion::Contrast => {
                let contrast = [
                    ("color", format!("{} !important", config.color)),
                    ("background-color", format!("{} !important", config.background_color)),
                ];
                for_each_target(&index, finding, |id| force_declarations(&mut dom, id, &contrast))
            }
            Criterion::FocusIndicator => {
                let outline = format!("outline:{}", config.outline);
                for_each_target(&index, finding, |id| append_declaration(&mut dom, id, &outline))
            }
            Criterion::AltText => {
                for_each_target(&index, finding, |id| fill_alt(&mut dom, id, &config.alt_text))
            }
            Criterion::Heading => {
                let size = format!("font-size:{}", config.heading_font_size);
                for_each_target(&index, finding, |id| append_declaration(&mut dom, id, &size))
            }
            Criterion::Landmark => insert_landmarks(&mut dom, &finding.details),
        };
        if changed {
            applied += 1;
        } else {
            skipped += 1;
        }
    }

    info!(
        "Applied fixes for {} of {} findings on {} ({} left unchanged)",
        applied,
        snapshot.findings.len(),
        snapshot.url,
        skipped
    );
    Ok(dom.to_html())
}

/// Run `fix` on every element the finding's selector matches in the
/// document as parsed; returns whether anything changed
fn for_each_target(
    index: &QueryIndex,
    finding: &NormalizedFinding,
    mut fix: impl FnMut(NodeId) -> bool,
) -> bool {
    let Some(selector) = finding.selector.as_deref() else {
        debug!("{} finding has no selector, skipping", finding.criterion);
        return false;
    };
    let targets = match index.select(selector) {
        Ok(targets) => targets,
        Err(e) => {
            debug!("Skipping unparseable selector {:?}: {}", selector, e);
            return false;
        }
    };
    if targets.is_empty() {
        debug!("Selector {:?} matched nothing", selector);
    }
    targets.into_iter().fold(false, |changed, id| fix(id) || changed)
}

fn property_of(declaration: &str) -> String {
    declaration
        .split_once(':')
        .map(|(p, _)| p.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Set properties in the inline style, replacing earlier declarations of them.
/// Other declarations are kept as written.
fn force_declarations(dom: &mut Document, id: NodeId, declarations: &[(&str, String)]) -> bool {
    let existing = dom.attr(id, "style").unwrap_or_default().to_string();
    let kept: Vec<&str> = split_top_level(&existing, ';')
        .into_iter()
        .filter(|d| !d.trim().is_empty())
        .filter(|d| {
            let property = property_of(d);
            !declarations.iter().any(|(p, _)| *p == property)
        })
        .collect();
    let forced: Vec<String> = declarations
        .iter()
        .map(|(p, v)| format!("{}:{}", p, v))
        .collect();

    let kept = kept.join(";");
    let kept = kept.trim();
    let style = if kept.is_empty() {
        forced.join("; ")
    } else {
        format!("{}; {}", kept, forced.join("; "))
    };
    if style == existing {
        return false;
    }
    dom.set_attr(id, "style", &style);
    true
}

/// Append a declaration to the inline style unless it is already there
fn append_declaration(dom: &mut Document, id: NodeId, declaration: &str) -> bool {
    let existing = dom.attr(id, "style").unwrap_or_default().to_string();
    if split_top_level(&existing, ';').iter().any(|d| d.trim() == declaration) {
        return false;
    }
    let trimmed = existing.trim_end();
    let separator = if trimmed.is_empty() || trimmed.ends_with(';') { "" } else { ";" };
    dom.set_attr(id, "style", &format!("{}{}{};", trimmed, separator, declaration));
    true
}

fn fill_alt(dom: &mut Document, id: NodeId, alt_text: &str) -> bool {
    let has_alt = dom
        .attr(id, "alt")
        .map(|alt| !alt.trim().is_empty())
        .unwrap_or(false);
    if has_alt {
        return false;
    }
    dom.set_attr(id, "alt", alt_text);
    true
}

/// Insert the landmark regions named in a landmark finding's message
fn insert_landmarks(dom: &mut Document, message: &str) -> bool {
    let Some(body) = dom.find_first("body") else {
        debug!("Document has no <body>, cannot insert landmarks");
        return false;
    };

    let mut changed = false;
    for (tag, _) in LANDMARKS {
        if !message.contains(&format!("<{}>", tag)) || dom.find_first(tag).is_some() {
            continue;
        }
        match tag {
            "header" => {
                for node in dom.create_fragment(HEADER_HTML).into_iter().rev() {
                    dom.prepend_child(body, node);
                }
            }
            "nav" => {
                let anchor = dom.find_all("header").last().copied();
                place_after_or_prepend(dom, body, anchor, NAV_HTML);
            }
            "main" => {
                let anchor = dom
                    .elements()
                    .into_iter()
                    .filter(|id| matches!(dom.tag(*id), Some("header") | Some("nav")))
                    .last();
                place_after_or_prepend(dom, body, anchor, MAIN_HTML);
            }
            "footer" => {
                for node in dom.create_fragment(FOOTER_HTML) {
                    dom.append_child(body, node);
                }
            }
            _ => continue,
        }
        debug!("Inserted <{}> landmark", tag);
        changed = true;
    }
    changed
}

fn place_after_or_prepend(dom: &mut Document, body: NodeId, anchor: Option<NodeId>, html: &str) {
    let nodes = dom.create_fragment(html);
    match anchor {
        Some(anchor) => {
            for node in nodes.into_iter().rev() {
                dom.insert_after(anchor, node);
            }
        }
        None => {
            for node in nodes.into_iter().rev() {
                dom.prepend_child(body, node);
            }
        }
    }
}
