//! Convert a compact Markdown dialect into a self-contained HTML document.
//!
//! The output is an embedded `<style>` element followed by one line of
//! markup per block. No `<html>` or `<body>` wrapper is added.

pub mod cli;
pub mod commands;
pub mod config;
pub mod inline;
pub mod output;
pub mod parser;
pub mod style;

pub use inline::render_inline;

/// Summary text for a `:::details` block that does not name one.
pub const DEFAULT_SUMMARY: &str = "詳細";

/// Options controlling document-level output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Complete `<style>` element placed first, or `None` to omit it.
    pub stylesheet: Option<String>,
    /// Summary used for details blocks without one.
    pub default_summary: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            stylesheet: Some(style::default_stylesheet()),
            default_summary: DEFAULT_SUMMARY.to_string(),
        }
    }
}

/// Convert Markdown to HTML with the built-in stylesheet.
pub fn convert(markdown: &str) -> String {
    convert_with(markdown, &RenderOptions::default())
}

/// Convert Markdown to HTML with explicit options.
///
/// Line endings are normalized to `\n` and surrounding whitespace of the
/// whole document is trimmed before the lines are parsed.
pub fn convert_with(markdown: &str, options: &RenderOptions) -> String {
    let normalized = markdown.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.trim().split('\n').collect();
    parser::parse(&lines, options).render()
}
