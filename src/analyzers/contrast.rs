// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast check - WCAG 1.4.3 Contrast (Minimum) (Level AA)
//!
//! Every rendered element with visible text is checked: its computed text
//! color against its effective background (the nearest non-transparent
//! background up the ancestor chain, composited when semi-transparent, white
//! at the canvas). Ratios use the WCAG relative luminance formula.
//! - AA: 4.5:1 for normal text

use crate::analyzers::selector::build_selector;
use crate::analyzers::Check;
use crate::dom::NodeId;
use crate::findings::{ContrastRecord, RawFindings};
use crate::render::RenderedDocument;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// WCAG AA minimum for normal text
pub const DEFAULT_MIN_RATIO: f64 = 4.5;

const SUGGESTION: &str = "Ensure contrast ≥ 4.5:1 per WCAG 2.1 AA.";

static FUNCTIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(rgba?|hsla?)\(\s*([^)]*?)\s*\)$").expect("valid regex")
});

/// An sRGB color with alpha in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f64,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha <= 0.0
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0
    }

    /// Composite this color over an opaque backdrop
    pub fn over(self, backdrop: Color) -> Color {
        let a = self.alpha.clamp(0.0, 1.0);
        let mix = |top: u8, bottom: u8| (a * top as f64 + (1.0 - a) * bottom as f64).round() as u8;
        Color::rgb(
            mix(self.r, backdrop.r),
            mix(self.g, backdrop.g),
            mix(self.b, backdrop.b),
        )
    }
}

/// Parse a CSS color value.
///
/// Supports hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`), `rgb()`/`rgba()`
/// and `hsl()`/`hsla()` in comma or space syntax, `transparent` and the named
/// colors below. Anything else (`currentcolor`, `var(..)`, `color-mix(..)`)
/// yields `None`.
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim().to_ascii_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        parse_hex(hex)
    } else if value.starts_with("rgb") || value.starts_with("hsl") {
        parse_functional(&value)
    } else if value == "transparent" {
        Some(Color {
            alpha: 0.0,
            ..Color::BLACK
        })
    } else {
        named_color(&value)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1].repeat(2), 16).ok();
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let (r, g, b, a) = match hex.len() {
        3 => (digit(0)?, digit(1)?, digit(2)?, 255),
        4 => (digit(0)?, digit(1)?, digit(2)?, digit(3)?),
        6 => (pair(0)?, pair(2)?, pair(4)?, 255),
        8 => (pair(0)?, pair(2)?, pair(4)?, pair(6)?),
        _ => return None,
    };
    Some(Color {
        r,
        g,
        b,
        alpha: a as f64 / 255.0,
    })
}

fn parse_functional(value: &str) -> Option<Color> {
    let caps = FUNCTIONAL_RE.captures(value)?;
    let (channels, alpha) = split_arguments(&caps[2])?;

    let alpha = match alpha {
        Some(a) => match a.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? / 100.0,
            None => a.parse::<f64>().ok()?,
        },
        None => 1.0,
    };

    let (r, g, b) = if caps[1].starts_with("hsl") {
        let hue = parse_hue(channels[0])?;
        let percent = |s: &str| -> Option<f64> {
            let v: f64 = s.strip_suffix('%').unwrap_or(s).parse().ok()?;
            Some((v / 100.0).clamp(0.0, 1.0))
        };
        hsl_to_rgb(hue, percent(channels[1])?, percent(channels[2])?)
    } else {
        let channel = |s: &str| -> Option<u8> {
            let v = match s.strip_suffix('%') {
                Some(pct) => pct.parse::<f64>().ok()? * 255.0 / 100.0,
                None => s.parse::<f64>().ok()?,
            };
            Some(v.round().clamp(0.0, 255.0) as u8)
        };
        (channel(channels[0])?, channel(channels[1])?, channel(channels[2])?)
    };

    Some(Color {
        r,
        g,
        b,
        alpha: alpha.clamp(0.0, 1.0),
    })
}

/// Three channel arguments plus an optional alpha, in comma or space syntax
fn split_arguments(args: &str) -> Option<(Vec<&str>, Option<&str>)> {
    if args.contains(',') {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        return match parts.len() {
            3 => Some((parts, None)),
            4 => Some((parts[..3].to_vec(), Some(parts[3]))),
            _ => None,
        };
    }
    let (channels, alpha) = match args.split_once('/') {
        Some((c, a)) => (c, Some(a.trim())),
        None => (args, None),
    };
    let parts: Vec<&str> = channels.split_whitespace().collect();
    (parts.len() == 3).then_some((parts, alpha))
}

/// Hue in degrees, normalized to `[0, 360)`
fn parse_hue(value: &str) -> Option<f64> {
    let degrees = if let Some(turns) = value.strip_suffix("turn") {
        turns.parse::<f64>().ok()? * 360.0
    } else if let Some(rad) = value.strip_suffix("rad") {
        rad.parse::<f64>().ok()?.to_degrees()
    } else {
        value.strip_suffix("deg").unwrap_or(value).parse().ok()?
    };
    Some(degrees.rem_euclid(360.0))
}

fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (u8, u8, u8) {
    let a = saturation * lightness.min(1.0 - lightness);
    let channel = |n: f64| {
        let k = (n + hue / 30.0) % 12.0;
        let v = lightness - a * (k - 3.0).min(9.0 - k).clamp(-1.0, 1.0);
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };
    (channel(0.0), channel(8.0), channel(4.0))
}

fn named_color(name: &str) -> Option<Color> {
    let (r, g, b) = match name {
        "white" => (255, 255, 255),
        "black" => (0, 0, 0),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "gray" | "grey" => (128, 128, 128),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "lime" => (0, 255, 0),
        "aqua" | "cyan" => (0, 255, 255),
        "teal" => (0, 128, 128),
        "navy" => (0, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "purple" => (128, 0, 128),
        "orange" => (255, 165, 0),
        "pink" => (255, 192, 203),
        "brown" => (165, 42, 42),
        "gold" => (255, 215, 0),
        "beige" => (245, 245, 220),
        "ivory" => (255, 255, 240),
        "khaki" => (240, 230, 140),
        "coral" => (255, 127, 80),
        "salmon" => (250, 128, 114),
        "tomato" => (255, 99, 71),
        "crimson" => (220, 20, 60),
        "indigo" => (75, 0, 130),
        "violet" => (238, 130, 238),
        "orchid" => (218, 112, 214),
        "tan" => (210, 180, 140),
        "chocolate" => (210, 105, 30),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "dimgray" | "dimgrey" => (105, 105, 105),
        "gainsboro" => (220, 220, 220),
        "whitesmoke" => (245, 245, 245),
        "darkblue" => (0, 0, 139),
        "darkred" => (139, 0, 0),
        "darkgreen" => (0, 100, 0),
        "lightblue" => (173, 216, 230),
        "lightgreen" => (144, 238, 144),
        "lightyellow" => (255, 255, 224),
        "steelblue" => (70, 130, 180),
        "slategray" | "slategrey" => (112, 128, 144),
        "royalblue" => (65, 105, 225),
        "skyblue" => (135, 206, 235),
        "rebeccapurple" => (102, 51, 153),
        _ => return None,
    };
    Some(Color::rgb(r, g, b))
}

/// Calculate relative luminance per WCAG 2.x
/// <https://www.w3.org/TR/WCAG21/#dfn-relative-luminance>
pub fn relative_luminance(color: Color) -> f64 {
    let linear = [color.r, color.g, color.b].map(|c| {
        let v = c as f64 / 255.0;
        if v <= 0.03928 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    });
    0.2126 * linear[0] + 0.7152 * linear[1] + 0.0722 * linear[2]
}

/// Calculate contrast ratio between two colors
/// Returns a ratio >= 1.0 (e.g., 4.5, 7.0, 21.0)
pub fn contrast_ratio(fg: Color, bg: Color) -> f64 {
    let l1 = relative_luminance(fg);
    let l2 = relative_luminance(bg);
    let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}

/// The opaque background an element's text is drawn on, or `None` when a
/// background in the chain cannot be parsed
pub fn effective_background(document: &RenderedDocument, id: NodeId) -> Option<Color> {
    let mut layers = Vec::new();
    let mut base = Color::WHITE;
    let mut current = Some(id);

    while let Some(node) = current {
        if let Some(style) = document.style(node) {
            let color = parse_color(&style.background_color)?;
            if color.is_opaque() {
                base = color;
                break;
            }
            if !color.is_transparent() {
                layers.push(color);
            }
        }
        current = document.dom().parent_element(node);
    }

    Some(layers.into_iter().rev().fold(base, |backdrop, layer| layer.over(backdrop)))
}

/// Contrast check for rendered text
pub struct ContrastCheck {
    min_ratio: f64,
}

impl ContrastCheck {
    pub fn new(min_ratio: f64) -> Self {
        Self { min_ratio }
    }

    fn ratio_for(&self, document: &RenderedDocument, id: NodeId) -> Option<f64> {
        let style = document.style(id)?;
        let Some(bg) = effective_background(document, id) else {
            debug!("Skipping element with unparseable background");
            return None;
        };
        let Some(fg) = parse_color(&style.color) else {
            debug!("Skipping element with unparseable color {:?}", style.color);
            return None;
        };
        Some(contrast_ratio(fg.over(bg), bg))
    }
}

impl Default for ContrastCheck {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RATIO)
    }
}

impl Check for ContrastCheck {
    fn name(&self) -> &str {
        "Color Contrast"
    }

    fn description(&self) -> &str {
        "Checks text contrast against its effective background (WCAG 1.4.3)"
    }

    fn run(&self, document: &RenderedDocument, findings: &mut RawFindings) {
        let dom = document.dom();
        for id in dom.elements() {
            if !document.is_rendered(id) || document.inner_text(id).is_empty() {
                continue;
            }
            let Some(ratio) = self.ratio_for(document, id) else {
                continue;
            };
            if ratio < self.min_ratio {
                let ratio = (ratio * 100.0).round() / 100.0;
                findings.contrast_issues.push(ContrastRecord {
                    selector: build_selector(dom, id),
                    ratio,
                    message: format!("Low contrast ({:.2}:1)", ratio),
                    suggestion: SUGGESTION.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Vec<ContrastRecord> {
        let doc = RenderedDocument::from_html(html, None);
        let mut findings = RawFindings::new();
        ContrastCheck::default().run(&doc, &mut findings);
        findings.contrast_issues
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_color("#fff"), Some(Color::WHITE));
        assert_eq!(parse_color("#000000"), Some(Color::BLACK));
        assert_eq!(parse_color("#FF0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(parse_color("#0000").map(|c| c.is_transparent()), Some(true));
        assert_eq!(parse_color("#ffffff80").map(|c| c.r), Some(255));
        assert_eq!(parse_color("#ggg"), None);
        assert_eq!(parse_color("#12345"), None);
    }

    #[test]
    fn test_parse_rgb_color() {
        assert_eq!(parse_color("rgb(255, 0, 0)"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(parse_color("rgb(0 128 0)"), Some(Color::rgb(0, 128, 0)));
        assert_eq!(parse_color("rgb(100%, 0%, 0%)"), Some(Color::rgb(255, 0, 0)));
        let c = parse_color("rgba(0, 0, 0, 0.5)").unwrap();
        assert!((c.alpha - 0.5).abs() < f64::EPSILON);
        assert!(parse_color("rgba(0, 0, 0, 0)").unwrap().is_transparent());
        assert!(parse_color("rgb(1, 2)").is_none());
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(parse_color("Navy"), Some(Color::rgb(0, 0, 128)));
        assert!(parse_color("transparent").unwrap().is_transparent());
        assert_eq!(parse_color("currentcolor"), None);
        assert_eq!(parse_color("var(--text)"), None);
    }

    #[test]
    fn test_parse_hsl_color() {
        assert_eq!(parse_color("hsl(0, 0%, 93%)"), Some(Color::rgb(237, 237, 237)));
        assert_eq!(parse_color("hsl(0 100% 50%)"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(parse_color("hsl(120deg, 100%, 25%)"), Some(Color::rgb(0, 128, 0)));
        assert_eq!(parse_color("hsl(240, 100%, 50%)"), Some(Color::rgb(0, 0, 255)));
        let translucent = parse_color("hsla(0, 0%, 0%, 0.5)").unwrap();
        assert!((translucent.alpha - 0.5).abs() < f64::EPSILON);
        assert!(parse_color("hsl(0, 0%)").is_none());
    }

    #[test]
    fn test_light_hsl_text_is_reported() {
        let issues = run(r#"<body><span style="color:hsl(0,0%,93%)">faint</span></body>"#);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_contrast_ratio_black_white() {
        let ratio = contrast_ratio(Color::BLACK, Color::WHITE);
        assert!((ratio - 21.0).abs() < 0.01, "Black on white should be 21:1, got {:.2}", ratio);
        assert_eq!(ratio, contrast_ratio(Color::WHITE, Color::BLACK));
    }

    #[test]
    fn test_contrast_ratio_same_color() {
        let grey = Color::rgb(128, 128, 128);
        assert!((contrast_ratio(grey, grey) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_relative_luminance() {
        assert!((relative_luminance(Color::WHITE) - 1.0).abs() < 1e-9);
        assert!(relative_luminance(Color::BLACK).abs() < 1e-9);
    }

    #[test]
    fn test_low_contrast_is_reported() {
        let issues = run(r#"<body><p style="color:#aaa;background-color:#ccc">faint</p></body>"#);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].selector.ends_with("p:nth-of-type(1)"));
        assert!(issues[0].ratio < 4.5);
        assert_eq!(issues[0].message, format!("Low contrast ({:.2}:1)", issues[0].ratio));
    }

    #[test]
    fn test_black_on_black_ratio() {
        let issues = run(r#"<body><p style="color:#000;background:#000">text</p></body>"#);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].ratio, 1.0);
        assert_eq!(issues[0].message, "Low contrast (1.00:1)");
    }

    #[test]
    fn test_background_is_inherited_from_ancestor() {
        let issues = run(
            r#"<body><div style="background-color:#000"><section><p>dark on dark</p></section></div></body>"#,
        );
        // div, section and p all draw default black text on the black div
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.ratio == 1.0));
    }

    #[test]
    fn test_good_contrast_passes() {
        assert!(run("<body><p>plain black on white</p></body>").is_empty());
        assert!(run(r#"<body style="background:#000"><p style="color:#fff">inverse</p></body>"#)
            .iter()
            .all(|i| !i.selector.ends_with("p:nth-of-type(1)")));
    }

    #[test]
    fn test_semi_transparent_background_is_composited() {
        let doc = RenderedDocument::from_html(
            r#"<body style="background:#000"><p style="background-color:rgba(255,255,255,0.5)">x</p></body>"#,
            None,
        );
        let p = doc.dom().find_first("p").unwrap();
        assert_eq!(effective_background(&doc, p), Some(Color::rgb(128, 128, 128)));
    }

    #[test]
    fn test_canvas_defaults_to_white() {
        let doc = RenderedDocument::from_html("<p>x</p>", None);
        let p = doc.dom().find_first("p").unwrap();
        assert_eq!(effective_background(&doc, p), Some(Color::WHITE));
    }

    #[test]
    fn test_unparseable_colors_are_skipped() {
        let issues = run(r#"<body><p style="color:color-mix(in srgb, red, blue);background:#fff">mixed</p></body>"#);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_hidden_and_empty_elements_are_skipped() {
        let issues = run(
            r#"<body><p style="display:none;color:#eee">hidden</p><div style="color:#eee">   </div></body>"#,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_threshold_is_configurable() {
        // #767676 on white is about 4.54:1
        let html = r#"<body><p style="color:#767676">grey</p></body>"#;
        let doc = RenderedDocument::from_html(html, None);
        let mut strict = RawFindings::new();
        ContrastCheck::new(7.0).run(&doc, &mut strict);
        assert_eq!(strict.contrast_issues.len(), 1);
        assert!(run(html).is_empty());
    }
}
