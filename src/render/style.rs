// SPDX-License-Identifier: PMPL-1.0-or-later
//! Style resolution for the static renderer.
//!
//! A small cascade over the properties the checks read: user-agent defaults,
//! author rules from `<style>` blocks and linked stylesheets (ordered by
//! specificity, then source order), inline `style` attributes, then
//! `!important` declarations in the same order. `color` and `font-size`
//! inherit; backgrounds and outlines do not. Custom properties inherit and
//! are substituted into `var()` references. Rules with
//! `:focus`/`:focus-visible` only apply to the focused style. Selectors
//! `scraper` cannot match (`:hover`, pseudo-elements) are ignored.

use super::{ComputedStyle, ElementStyle, RenderedDocument, INTERACTIVE_TAGS};
use crate::dom::Document;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Elements the user-agent stylesheet never displays
const HIDDEN_TAGS: &[&str] = &[
    "head", "script", "style", "title", "meta", "link", "base", "template", "noscript",
];

/// User-agent heading sizes, in em
const HEADING_SCALE: &[(&str, &str)] = &[
    ("h1", "2em"),
    ("h2", "1.5em"),
    ("h3", "1.17em"),
    ("h4", "1em"),
    ("h5", "0.83em"),
    ("h6", "0.67em"),
];

const ROOT_FONT_PX: f64 = 16.0;

const MAX_VAR_DEPTH: usize = 16;

const OUTLINE_STYLES: &[&str] = &[
    "none", "hidden", "auto", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset",
    "outset",
];

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));
static IMPORTANT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*!\s*important\s*$").expect("valid regex"));
static FOCUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":focus(?:-visible)?").expect("valid regex"));
static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d*\.?\d+)(px|em|rem|%|pt|pc|in|cm|mm|ex|ch|vw|vh)?$").expect("valid regex")
});

/// A single `property: value` pair
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Stylesheet sources for `<link rel="stylesheet">`, keyed by resolved URL
pub type LinkedSheets = HashMap<String, String>;

type CustomProperties = HashMap<String, String>;

/// Split on `separator` where it is outside parentheses and quoted strings
pub fn split_top_level(value: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == separator && depth == 0 => {
                parts.push(&value[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

/// Parse the body of a rule or a `style` attribute
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    split_top_level(block, ';')
        .into_iter()
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let important = IMPORTANT_RE.is_match(value);
            let value = IMPORTANT_RE.replace(value, "").trim().to_string();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some(Declaration {
                property,
                value,
                important,
            })
        })
        .collect()
}

struct StyleRule {
    selector: Selector,
    focus: bool,
    specificity: (u32, u32, u32),
    order: usize,
    declarations: Vec<Declaration>,
}

/// Parse HTML and compute a style for every element
pub fn render_document(source: &str, base_url: Option<Url>) -> RenderedDocument {
    render_with_stylesheets(source, base_url, &LinkedSheets::new())
}

/// Like [`render_document`], with the contents of linked stylesheets
pub fn render_with_stylesheets(
    source: &str,
    base_url: Option<Url>,
    sheets: &LinkedSheets,
) -> RenderedDocument {
    let html = Html::parse_document(source);
    let dom = Document::from_html(&html);
    let rules = collect_rules(&html, base_url.as_ref(), sheets);
    debug!("Collected {} style rules", rules.len());

    let mut styles: Vec<Option<ElementStyle>> = vec![None; dom.len()];
    let mut custom: Vec<Option<CustomProperties>> = vec![None; dom.len()];
    let elements = html
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap);

    for (element, id) in elements.zip(dom.elements()) {
        let tag = dom.tag(id).unwrap_or_default();
        let parent_id = dom.parent_element(id);
        let parent = parent_id
            .and_then(|p| styles[p.index()].as_ref())
            .map(|s| s.normal.clone());
        let inherited = parent_id
            .and_then(|p| custom[p.index()].clone())
            .unwrap_or_default();
        let inline = dom.attr(id, "style").map(parse_declarations).unwrap_or_default();
        let hidden = dom.attr(id, "hidden").is_some();

        let resolve = |focused: bool| {
            let (specified, vars) =
                cascade(tag, &element, &rules, &inline, focused, hidden, &inherited);
            (compute(&specified, parent.as_ref()), vars)
        };

        let (normal, vars) = resolve(false);
        let focused = INTERACTIVE_TAGS.contains(&tag).then(|| resolve(true).0);
        styles[id.index()] = Some(ElementStyle { normal, focused });
        custom[id.index()] = Some(vars);
    }

    RenderedDocument::new(dom, styles, base_url)
}

/// Stylesheet URLs linked from a page, in document order
pub fn linked_stylesheets(source: &str, base_url: &Url) -> Vec<Url> {
    let html = Html::parse_document(source);
    let link_sel = Selector::parse("link[rel]").expect("valid selector");
    let mut urls: Vec<Url> = Vec::new();
    for link in html.select(&link_sel) {
        if let Some(url) = stylesheet_href(&link, Some(base_url)) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}

/// Resolved `href` of a screen stylesheet link
fn stylesheet_href(link: &ElementRef<'_>, base_url: Option<&Url>) -> Option<Url> {
    let element = link.value();
    let is_stylesheet = element
        .attr("rel")?
        .split_whitespace()
        .any(|rel| rel.eq_ignore_ascii_case("stylesheet"));
    if !is_stylesheet || !element.attr("media").map(media_applies).unwrap_or(true) {
        return None;
    }
    let href = element.attr("href")?.trim();
    match base_url {
        Some(base) => base.join(href).ok(),
        None => Url::parse(href).ok(),
    }
}

fn collect_rules(html: &Html, base_url: Option<&Url>, sheets: &LinkedSheets) -> Vec<StyleRule> {
    let sheet_sel = Selector::parse("style, link[rel]").expect("valid selector");
    let mut rules = Vec::new();

    for element in html.select(&sheet_sel) {
        if element.value().name() == "link" {
            let Some(href) = stylesheet_href(&element, base_url) else {
                continue;
            };
            match sheets.get(href.as_str()) {
                Some(css) => compile_rules(css, &mut rules),
                None => debug!("Stylesheet {} was not loaded", href),
            }
            continue;
        }
        if let Some(media) = element.value().attr("media") {
            if !media_applies(media) {
                continue;
            }
        }
        let css: String = element.text().collect();
        compile_rules(&css, &mut rules);
    }

    rules.sort_by_key(|r| (r.specificity, r.order));
    rules
}

fn compile_rules(css: &str, rules: &mut Vec<StyleRule>) {
    let css = COMMENT_RE.replace_all(css, "");
    let mut blocks = Vec::new();
    split_blocks(&css, &mut blocks);

    for (prelude, body) in blocks {
        let declarations = parse_declarations(&body);
        if declarations.is_empty() {
            continue;
        }
        for part in prelude.split(',') {
            let part = part.trim();
            if part.is_empty() || part.contains(":focus-within") {
                continue;
            }
            let focus = FOCUS_RE.is_match(part);
            let mut text = FOCUS_RE.replace_all(part, "").to_string();
            if text.trim().is_empty()
                || text.ends_with(|c: char| c.is_whitespace() || matches!(c, '>' | '+' | '~'))
            {
                text.push('*');
            }
            let selector = match Selector::parse(&text) {
                Ok(s) => s,
                Err(_) => {
                    debug!("Skipping unsupported selector {:?}", part);
                    continue;
                }
            };
            let (a, b, c) = specificity(&text);
            rules.push(StyleRule {
                selector,
                focus,
                specificity: (a, b + u32::from(focus), c),
                order: rules.len(),
                declarations: declarations.clone(),
            });
        }
    }
}

/// Split a stylesheet into `(selector, declarations)` blocks, descending into
/// at-rules that apply on screen and dropping the rest
fn split_blocks(css: &str, out: &mut Vec<(String, String)>) {
    let mut rest = css;
    while let Some(open) = rest.find('{') {
        let head = &rest[..open];
        let prelude = head.rsplit_once(';').map(|(_, p)| p).unwrap_or(head).trim();

        let mut depth = 0usize;
        let mut close = None;
        for (i, c) in rest[open..].char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else {
            break;
        };

        let body = &rest[open + 1..close];
        match prelude.strip_prefix('@') {
            Some(at_rule) => {
                if at_rule_applies(at_rule) {
                    split_blocks(body, out);
                }
            }
            None => out.push((prelude.to_string(), body.to_string())),
        }
        rest = &rest[close + 1..];
    }
}

fn at_rule_applies(at_rule: &str) -> bool {
    let lower = at_rule.to_ascii_lowercase();
    if let Some(query) = lower.strip_prefix("media") {
        return media_applies(query);
    }
    lower.starts_with("supports") || lower.starts_with("layer") || lower.starts_with("container")
}

fn media_applies(query: &str) -> bool {
    let query = query.to_ascii_lowercase();
    !(query.contains("print") && !query.contains("screen"))
        && !query.contains("speech")
        && !query.contains("prefers-color-scheme: dark")
}

/// (ids, classes/attributes/pseudo-classes, types)
fn specificity(selector: &str) -> (u32, u32, u32) {
    let (mut a, mut b, mut c) = (0, 0, 0);
    let mut prev = ' ';
    let mut in_brackets = false;
    for ch in selector.chars() {
        match ch {
            '[' => {
                in_brackets = true;
                b += 1;
            }
            ']' => in_brackets = false,
            _ if in_brackets => {}
            '#' => a += 1,
            '.' | ':' => b += 1,
            ch if ch.is_ascii_alphabetic() && matches!(prev, ' ' | '>' | '+' | '~' | '(') => c += 1,
            _ => {}
        }
        prev = ch;
    }
    (a, b, c)
}

/// Collect the winning specified values and custom properties for one element
fn cascade(
    tag: &str,
    element: &ElementRef<'_>,
    rules: &[StyleRule],
    inline: &[Declaration],
    focused: bool,
    hidden: bool,
    inherited: &CustomProperties,
) -> (HashMap<String, String>, CustomProperties) {
    let mut specified = HashMap::new();

    if HIDDEN_TAGS.contains(&tag) || hidden {
        specified.insert("display".to_string(), "none".to_string());
    }
    if let Some((_, size)) = HEADING_SCALE.iter().find(|(h, _)| *h == tag) {
        specified.insert("font-size".to_string(), size.to_string());
    }
    if focused {
        specified.insert("outline-style".to_string(), "auto".to_string());
        specified.insert("outline-width".to_string(), "1px".to_string());
    }

    let matching: Vec<&StyleRule> = rules
        .iter()
        .filter(|r| (focused || !r.focus) && r.selector.matches(element))
        .collect();

    let mut ordered: Vec<&Declaration> = Vec::new();
    for important in [false, true] {
        for rule in &matching {
            ordered.extend(rule.declarations.iter().filter(|d| d.important == important));
        }
        ordered.extend(inline.iter().filter(|d| d.important == important));
    }

    let mut declared = inherited.clone();
    for decl in ordered.iter().filter(|d| d.property.starts_with("--")) {
        declared.insert(decl.property.clone(), decl.value.clone());
    }
    let vars: CustomProperties = declared
        .iter()
        .filter_map(|(name, value)| Some((name.clone(), substitute_vars(value, &declared, 0)?)))
        .collect();

    for decl in ordered.iter().filter(|d| !d.property.starts_with("--")) {
        if decl.value.contains("var(") {
            let value = substitute_vars(&decl.value, &vars, 0).unwrap_or_else(|| "unset".to_string());
            apply(
                &mut specified,
                &Declaration {
                    property: decl.property.clone(),
                    value,
                    important: decl.important,
                },
            );
        } else {
            apply(&mut specified, decl);
        }
    }

    (specified, vars)
}

/// Replace `var(--name, fallback)` references. `None` when a reference has
/// neither a value nor a fallback.
fn substitute_vars(value: &str, vars: &CustomProperties, depth: usize) -> Option<String> {
    if depth > MAX_VAR_DEPTH {
        return None;
    }
    let mut out = String::new();
    let mut rest = value;
    while let Some(start) = rest.find("var(") {
        out.push_str(&rest[..start]);
        let args_start = start + "var(".len();
        let close = args_start + closing_paren(&rest[args_start..])?;
        let args = &rest[args_start..close];

        let name = split_top_level(args, ',')[0];
        let fallback = args.get(name.len() + 1..);
        let replacement = match vars.get(&name.trim().to_ascii_lowercase()) {
            Some(v) => substitute_vars(v, vars, depth + 1)?,
            None => substitute_vars(fallback?.trim(), vars, depth + 1)?,
        };
        out.push_str(&replacement);
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    Some(out)
}

/// Byte offset of the `)` closing an already opened parenthesis
fn closing_paren(value: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn apply(specified: &mut HashMap<String, String>, decl: &Declaration) {
    let value = decl.value.trim().to_string();
    match decl.property.as_str() {
        "background" => {
            specified.insert("background-color".to_string(), background_color_of(&value));
        }
        "outline" => {
            let (style, width) = parse_outline(&value);
            specified.insert("outline-style".to_string(), style);
            specified.insert("outline-width".to_string(), width);
        }
        "color" | "background-color" | "outline-style" | "outline-width" | "font-size"
        | "display" => {
            specified.insert(decl.property.clone(), value);
        }
        _ => {}
    }
}

/// Pick the color layer out of a `background` shorthand
fn background_color_of(value: &str) -> String {
    let lower = value.to_ascii_lowercase();
    if matches!(lower.as_str(), "inherit" | "none" | "initial" | "unset") {
        return if lower == "inherit" { lower } else { "transparent".to_string() };
    }
    split_tokens(&lower)
        .into_iter()
        .find(|t| looks_like_color(t))
        .unwrap_or_else(|| "transparent".to_string())
}

fn looks_like_color(token: &str) -> bool {
    const NOT_COLORS: &[&str] = &[
        "none", "repeat", "repeat-x", "repeat-y", "no-repeat", "space", "round", "center", "top",
        "bottom", "left", "right", "fixed", "scroll", "local", "cover", "contain", "auto",
        "border-box", "padding-box", "content-box", "text",
    ];
    token.starts_with('#')
        || token.starts_with("rgb")
        || token.starts_with("hsl")
        || (token.chars().all(|c| c.is_ascii_alphabetic()) && !NOT_COLORS.contains(&token))
}

/// Split on whitespace that is not inside parentheses
fn split_tokens(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in value.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Split an `outline` shorthand into (style, width); missing parts reset
fn parse_outline(value: &str) -> (String, String) {
    let mut style = None;
    let mut width = None;
    for token in split_tokens(&value.to_ascii_lowercase()) {
        if OUTLINE_STYLES.contains(&token.as_str()) {
            style = Some(token);
        } else if matches!(token.as_str(), "thin" | "medium" | "thick") || LENGTH_RE.is_match(&token) {
            width = Some(token);
        }
    }
    (
        style.unwrap_or_else(|| "none".to_string()),
        width.unwrap_or_else(|| "medium".to_string()),
    )
}

fn outline_width_px(width: &str) -> String {
    match width {
        "thin" => "1px".to_string(),
        "medium" | "initial" | "unset" | "inherit" => "3px".to_string(),
        "thick" => "5px".to_string(),
        "0" => "0px".to_string(),
        other => other.to_string(),
    }
}

/// Turn specified values into computed values
fn compute(specified: &HashMap<String, String>, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let initial = ComputedStyle::default();
    let parent = parent.unwrap_or(&initial);
    let get = |key: &str| specified.get(key).map(|v| v.to_ascii_lowercase());

    let color = match get("color").as_deref() {
        None | Some("inherit") | Some("currentcolor") | Some("unset") => parent.color.clone(),
        Some("initial") => initial.color.clone(),
        Some(v) => v.to_string(),
    };

    let background_color = match get("background-color").as_deref() {
        None | Some("initial") | Some("unset") => initial.background_color.clone(),
        Some("inherit") => parent.background_color.clone(),
        Some("currentcolor") => color.clone(),
        Some(v) => v.to_string(),
    };

    let outline_style = match get("outline-style") {
        Some(style) if OUTLINE_STYLES.contains(&style.as_str()) => style,
        _ => "none".to_string(),
    };
    let outline_width = if matches!(outline_style.as_str(), "none" | "hidden") {
        "0px".to_string()
    } else {
        outline_width_px(&get("outline-width").unwrap_or_else(|| "medium".to_string()))
    };

    let parent_px = parse_px(&parent.font_size).unwrap_or(ROOT_FONT_PX);
    let font_px = get("font-size")
        .and_then(|v| font_size_px(&v, parent_px))
        .unwrap_or(parent_px);

    ComputedStyle {
        color,
        background_color,
        outline: format!("{} {}", outline_style, outline_width),
        font_size: format_px(font_px),
        display: get("display").unwrap_or_else(|| initial.display.clone()),
    }
}

fn parse_px(value: &str) -> Option<f64> {
    value.strip_suffix("px")?.parse().ok()
}

fn font_size_px(value: &str, parent_px: f64) -> Option<f64> {
    let keyword = match value {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" | "initial" => Some(ROOT_FONT_PX),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "xxx-large" => Some(48.0),
        "smaller" => Some(parent_px / 1.2),
        "larger" => Some(parent_px * 1.2),
        "inherit" | "unset" => Some(parent_px),
        _ => None,
    };
    if keyword.is_some() {
        return keyword;
    }

    let caps = LENGTH_RE.captures(value)?;
    let n: f64 = caps[1].parse().ok()?;
    match caps.get(2).map(|m| m.as_str()) {
        Some("px") => Some(n),
        Some("em") => Some(n * parent_px),
        Some("rem") => Some(n * ROOT_FONT_PX),
        Some("%") => Some(n * parent_px / 100.0),
        Some("pt") => Some(n * 4.0 / 3.0),
        None if n == 0.0 => Some(0.0),
        _ => None,
    }
}

/// Format a pixel size the way browsers report it (`18.72px`, `32px`)
pub fn format_px(px: f64) -> String {
    let rounded = (px * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}px", rounded as i64)
    } else {
        format!("{}px", rounded)
    }
}
