//! Post-processing of model output before it is stored or rendered.

use std::sync::LazyLock;

use regex::Regex;

static HTML_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```html.*?```").expect("valid regex"));

static MARKUP_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Remove every fenced block tagged `html`, shortest match, across lines.
///
/// Surrounding text and whitespace are left exactly as they were.
pub fn strip_html_fences(raw: &str) -> String {
    HTML_FENCE_RE.replace_all(raw, "").into_owned()
}

/// Remove `<...>` markup fragments from a single line of text.
pub fn strip_markup_tags(line: &str) -> String {
    MARKUP_TAG_RE.replace_all(line, "").into_owned()
}
