//! Embedded stylesheet placed at the top of every converted document.

/// CSS rules shipped with the binary.
const DEFAULT_CSS: &str = include_str!("../templates/style.css");

/// Returns the built-in stylesheet wrapped in a `<style>` element.
pub fn default_stylesheet() -> String {
    wrap_css(DEFAULT_CSS)
}

/// Wraps raw CSS rules in a `<style>` element.
///
/// A trailing newline is added when the rules do not end with one, so the
/// closing tag always sits on its own line.
pub fn wrap_css(css: &str) -> String {
    if css.ends_with('\n') {
        format!("<style>\n{css}</style>")
    } else {
        format!("<style>\n{css}\n</style>")
    }
}
