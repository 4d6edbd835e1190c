//! Inline span rendering.
//!
//! Inline markup is handled by four regex substitutions applied in a fixed
//! order: code spans, links, bold, italic. Each pass sees the output of the
//! previous one, so emphasis markers inside an already rendered `<code>`
//! element are still rewritten.

use regex::Regex;
use std::sync::LazyLock;

static CODE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`(.*?)`").expect("code span pattern is valid"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").expect("link pattern is valid"));
static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("strong pattern is valid"));
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("emphasis pattern is valid"));

/// Render inline markup within a single line of visible text.
///
/// Text is not HTML-escaped; only the span delimiters are replaced.
pub fn render_inline(text: &str) -> String {
    let text = CODE_SPAN.replace_all(text, "<code>${1}</code>");
    let text = LINK.replace_all(&text, r#"<a href="${2}">${1}</a>"#).into_owned();
    let text = STRONG.replace_all(&text, "<strong>${1}</strong>").into_owned();
    EMPHASIS.replace_all(&text, "<em>${1}</em>").into_owned()
}
