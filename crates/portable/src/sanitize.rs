//! Allow-list HTML sanitizer on top of ammonia.
//!
//! Elements that can execute or embed foreign content are dropped together
//! with their children. Unknown elements are unwrapped. Attributes are kept
//! only when allow-listed, URL-bearing ones only with a safe scheme, and
//! `data:` URLs only as image sources.

use std::borrow::Cow;
use std::collections::HashSet;

use ammonia::{Builder, UrlRelative};

use crate::dom::{parse_style, serialize_style};

const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "caption", "code", "col", "colgroup", "del", "div", "em",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "li", "mark",
    "ol", "p", "pre", "s", "small", "span", "strike", "strong", "sub", "sup", "table", "tbody",
    "td", "tfoot", "th", "thead", "tr", "u", "ul",
];

const DROPPED_WITH_CONTENT: &[&str] = &[
    "applet", "base", "button", "embed", "form", "frame", "frameset", "head", "iframe", "input",
    "link", "math", "meta", "noembed", "noframes", "noscript", "object", "option", "script",
    "select", "style", "svg", "template", "textarea", "title",
];

const ALLOWED_ATTRIBUTES: &[&str] = &[
    "align", "alt", "class", "colspan", "dir", "height", "href", "rel", "rowspan", "src", "style",
    "target", "title", "width",
];

/// `data` is let through here and narrowed to image sources by
/// [`filter_attribute`].
const URL_SCHEMES: &[&str] = &["data", "http", "https", "mailto", "tel"];

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

fn set(items: &'static [&'static str]) -> HashSet<&'static str> {
    items.iter().copied().collect()
}

fn builder() -> Builder<'static> {
    let mut builder = Builder::empty();
    builder
        .tags(set(ALLOWED_TAGS))
        .clean_content_tags(set(DROPPED_WITH_CONTENT))
        .generic_attributes(set(ALLOWED_ATTRIBUTES))
        .url_schemes(set(URL_SCHEMES))
        .url_relative(UrlRelative::PassThrough)
        .link_rel(None)
        .strip_comments(true)
        .attribute_filter(filter_attribute);
    builder
}

/// Cleans an untrusted HTML string. Never fails; malformed input yields the
/// best-effort cleaned output.
pub fn sanitize(html: &str) -> String {
    builder().clean(html).to_string()
}

fn filter_attribute<'u>(element: &str, attribute: &str, value: &'u str) -> Option<Cow<'u, str>> {
    match attribute {
        "style" => {
            let kept: Vec<(String, String)> = parse_style(value)
                .into_iter()
                .filter(|(name, value)| is_safe_declaration(name, value))
                .collect();
            if kept.is_empty() {
                log::debug!("sanitizer dropped style on <{element}>");
                return None;
            }
            Some(Cow::Owned(serialize_style(&kept)))
        }
        "href" | "src" if url_scheme(value).as_deref() == Some("data") => {
            let image = element == "img" && attribute == "src" && is_image_data(value);
            image.then_some(Cow::Borrowed(value))
        }
        _ => Some(Cow::Borrowed(value)),
    }
}

fn is_image_data(url: &str) -> bool {
    url.trim_start().to_ascii_lowercase().starts_with("data:image/")
}

/// Scheme of a URL, lowercased, ignoring whitespace and control characters
/// browsers also ignore. `None` for relative URLs.
fn url_scheme(url: &str) -> Option<String> {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    let colon = cleaned.find(':')?;
    let before = &cleaned[..colon];
    if before.is_empty() || before.contains(['/', '?', '#']) {
        return None;
    }
    Some(before.to_ascii_lowercase())
}

fn is_safe_url(url: &str, allow_image_data: bool) -> bool {
    match url_scheme(url) {
        None => true,
        Some(scheme) if SAFE_SCHEMES.contains(&scheme.as_str()) => true,
        Some(scheme) if scheme == "data" => allow_image_data && is_image_data(url),
        Some(_) => false,
    }
}

fn is_safe_declaration(name: &str, value: &str) -> bool {
    if matches!(name, "behavior" | "-moz-binding") {
        return false;
    }
    let lowered = value.to_ascii_lowercase();
    if lowered.contains("expression(") || lowered.contains("javascript:") {
        return false;
    }

    let mut rest = lowered.as_str();
    while let Some(start) = rest.find("url(") {
        let after = &rest[start + 4..];
        let end = after.find(')').unwrap_or(after.len());
        let target = after[..end].trim().trim_matches(['"', '\'']);
        if !is_safe_url(target, true) {
            return false;
        }
        rest = &after[end..];
    }
    true
}
