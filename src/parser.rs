//! Line-scanning block parser.
//!
//! The parser walks the input one line at a time and classifies each line
//! into a block context: code fence, details block, list item or list
//! continuation, heading, blockquote, paragraph. Open containers are tracked
//! by a [`Mode`], a details marker and a stack of list frames, and every
//! container except a code fence is closed when the input ends.

use regex::Regex;
use std::sync::LazyLock;

use crate::RenderOptions;
use crate::inline::render_inline;
use crate::output::{Attachment, Fragment, ListKind, Output, escape_html};

const FENCE: &str = "```";
const DETAILS_OPEN: &str = ":::details";
const DETAILS_CLOSE: &str = ":::";
const QUOTE: &str = "> ";
const UNORDERED_MARKER: &str = "- ";

static ORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\. ").expect("ordered marker pattern is valid"));

/// Exclusive block context the parser is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Default,
    /// Inside a top-level fenced code block.
    Code { awaiting_first_line: bool },
    /// Inside a `> ` quote run.
    Blockquote,
}

/// One open list level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ListFrame {
    indent: usize,
    kind: ListKind,
}

/// Parse lines of Markdown into output fragments.
///
/// The lines are expected to be newline-free; see [`crate::convert_with`]
/// for the normalization applied to whole documents.
pub fn parse(lines: &[&str], options: &RenderOptions) -> Output {
    let mut parser = BlockParser::new(lines, options);
    parser.run();
    parser.finish()
}

struct BlockParser<'a> {
    lines: &'a [&'a str],
    cursor: usize,
    mode: Mode,
    /// A details block is open. Details blocks only ever open outside lists.
    details: bool,
    /// Open list levels; an empty stack is the base level outside any list.
    lists: Vec<ListFrame>,
    out: Output,
    default_summary: &'a str,
}

impl<'a> BlockParser<'a> {
    fn new(lines: &'a [&'a str], options: &'a RenderOptions) -> Self {
        let mut out = Output::new();
        if let Some(style) = &options.stylesheet {
            out.push(Fragment::Stylesheet(style.clone()));
        }
        Self {
            lines,
            cursor: 0,
            mode: Mode::Default,
            details: false,
            lists: Vec::new(),
            out,
            default_summary: &options.default_summary,
        }
    }

    fn run(&mut self) {
        while let Some(&line) = self.lines.get(self.cursor) {
            self.step(line);
        }
    }

    /// Handle the line under the cursor. Every path either advances the
    /// cursor or changes state so the next call advances it.
    fn step(&mut self, line: &'a str) {
        if self.lists.is_empty() && line.starts_with(FENCE) {
            self.toggle_fence();
            self.cursor += 1;
            return;
        }

        if let Mode::Code {
            awaiting_first_line,
        } = self.mode
        {
            let escaped = escape_html(line);
            if awaiting_first_line {
                self.out.attach(Attachment::CodeText(escaped));
                self.mode = Mode::Code {
                    awaiting_first_line: false,
                };
            } else {
                self.out.push(Fragment::CodeLine(escaped));
            }
            self.cursor += 1;
            return;
        }

        if let Some(summary) = line.strip_prefix(DETAILS_OPEN) {
            self.open_details(summary);
            self.cursor += 1;
            return;
        }

        if self.details && line.starts_with(DETAILS_CLOSE) {
            self.close_details();
            self.cursor += 1;
            return;
        }

        let indent = leading_spaces(line);
        let content = line.trim_start_matches(' ');

        if let Some((kind, text)) = list_marker(content) {
            self.list_item(indent, kind, text);
            self.cursor += 1;
        } else if self.is_continuation(line, indent) {
            self.continuation(line, indent, content);
        } else {
            self.fallback(line);
        }
    }

    fn toggle_fence(&mut self) {
        if matches!(self.mode, Mode::Code { .. }) {
            tracing::trace!(line = self.cursor, "code block closed");
            self.out.push(Fragment::CodeClose);
            self.mode = Mode::Default;
        } else {
            self.close_blockquote();
            tracing::trace!(line = self.cursor, "code block opened");
            self.out.push(Fragment::CodeOpen);
            self.mode = Mode::Code {
                awaiting_first_line: true,
            };
        }
    }

    fn open_details(&mut self, summary: &str) {
        if self.details {
            self.close_details();
        }
        self.close_lists();
        self.close_blockquote();

        let summary = match summary.trim() {
            "" => self.default_summary,
            text => text,
        };
        tracing::trace!(line = self.cursor, summary, "details opened");
        self.out.push(Fragment::DetailsOpen(escape_html(summary)));
        self.details = true;
    }

    fn close_details(&mut self) {
        if !self.details {
            return;
        }
        self.details = false;
        self.close_lists();
        self.close_blockquote();
        tracing::trace!(line = self.cursor, "details closed");
        self.out.push(Fragment::DetailsClose);
    }

    fn list_item(&mut self, indent: usize, kind: ListKind, text: &str) {
        self.close_blockquote();

        while let Some(top) = self.lists.last().copied() {
            if indent < top.indent || (indent == top.indent && kind != top.kind) {
                self.pop_list();
            } else {
                break;
            }
        }

        if self.lists.last().is_none_or(|top| indent > top.indent) {
            tracing::trace!(line = self.cursor, indent, ?kind, "list opened");
            if self.out.ends_with_open_item() {
                self.out.attach(Attachment::ListOpen(kind));
            } else {
                self.out.push(Fragment::ListOpen(kind));
            }
            self.lists.push(ListFrame { indent, kind });
        } else {
            self.out.push(Fragment::ListItemClose);
        }

        self.out.push(Fragment::ListItem(render_inline(text)));
    }

    fn is_continuation(&self, line: &str, indent: usize) -> bool {
        !line.trim().is_empty() && self.lists.last().is_some_and(|top| indent > top.indent)
    }

    fn continuation(&mut self, line: &str, indent: usize, content: &str) {
        self.close_blockquote();
        if content.starts_with(FENCE) {
            self.list_code_block(indent);
        } else {
            self.out
                .attach(Attachment::LineBreak(render_inline(line.trim())));
            self.cursor += 1;
        }
    }

    /// Consume a fenced code block nested in a list item, starting at the
    /// opening fence under the cursor. Lines are de-indented by the fence's
    /// own indent. The cursor ends up past the closing fence, or at the end
    /// of input when the fence is never closed.
    fn list_code_block(&mut self, fence_indent: usize) {
        tracing::trace!(line = self.cursor, fence_indent, "list code block opened");
        self.out.push(Fragment::CodeOpen);
        self.cursor += 1;

        let mut first = true;
        while let Some(&line) = self.lines.get(self.cursor) {
            self.cursor += 1;
            if line.trim_start().starts_with(FENCE) {
                self.out.push(Fragment::CodeClose);
                return;
            }
            let escaped = escape_html(strip_indent(line, fence_indent));
            if first {
                self.out.attach(Attachment::CodeText(escaped));
                first = false;
            } else {
                self.out.push(Fragment::CodeLine(escaped));
            }
        }
        tracing::debug!("list code block reached end of input without a closing fence");
    }

    fn fallback(&mut self, line: &str) {
        self.close_lists();

        // A fence right after a list item is picked up on the next step,
        // now that no list is open.
        if line.starts_with(FENCE) {
            return;
        }

        let trimmed = line.trim_start();
        if !trimmed.starts_with(QUOTE) {
            self.close_blockquote();
        }

        if trimmed.starts_with('#') {
            self.heading(trimmed);
        } else if let Some(text) = trimmed.strip_prefix(QUOTE) {
            if self.mode != Mode::Blockquote {
                tracing::trace!(line = self.cursor, "blockquote opened");
                self.out.push(Fragment::BlockquoteOpen);
                self.mode = Mode::Blockquote;
            }
            self.out.push(Fragment::Paragraph(vec![render_inline(text)]));
        } else if !trimmed.is_empty() {
            self.paragraph();
            return;
        }
        self.cursor += 1;
    }

    fn heading(&mut self, trimmed: &str) {
        let level = trimmed.chars().take_while(|&c| c == '#').count();
        let content = trimmed.trim_start_matches('#').trim();
        self.out.push(Fragment::Heading {
            level,
            content: render_inline(content),
        });
    }

    /// Collect the line under the cursor and every following line up to the
    /// next blank line or block marker into one paragraph.
    fn paragraph(&mut self) {
        let start = self.cursor;
        let mut rendered = Vec::new();
        while let Some(&line) = self.lines.get(self.cursor) {
            if self.cursor > start && ends_paragraph(line) {
                break;
            }
            rendered.push(render_inline(line.trim()));
            self.cursor += 1;
        }
        tracing::trace!(line = start, lines = rendered.len(), "paragraph collected");
        self.out.push(Fragment::Paragraph(rendered));
    }

    fn pop_list(&mut self) {
        if let Some(frame) = self.lists.pop() {
            tracing::trace!(line = self.cursor, indent = frame.indent, "list closed");
            self.out.push(Fragment::ListClose(frame.kind));
        }
    }

    fn close_lists(&mut self) {
        while !self.lists.is_empty() {
            self.pop_list();
        }
    }

    fn close_blockquote(&mut self) {
        if self.mode == Mode::Blockquote {
            tracing::trace!(line = self.cursor, "blockquote closed");
            self.out.push(Fragment::BlockquoteClose);
            self.mode = Mode::Default;
        }
    }

    /// Close every container still open at the end of input. An open code
    /// fence is left as-is.
    fn finish(mut self) -> Output {
        self.close_lists();
        self.close_blockquote();
        if self.details {
            self.details = false;
            self.out.push(Fragment::DetailsClose);
        }
        if matches!(self.mode, Mode::Code { .. }) {
            tracing::debug!("code block left open at end of input");
        }
        tracing::debug!(
            lines = self.lines.len(),
            fragments = self.out.fragment_count(),
            "document parsed"
        );
        self.out
    }
}

/// Number of leading space characters.
fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Recognize an item marker at the start of de-indented content, returning
/// the list kind and the item text after the marker.
fn list_marker(content: &str) -> Option<(ListKind, &str)> {
    if let Some(text) = content.strip_prefix(UNORDERED_MARKER) {
        return Some((ListKind::Unordered, text));
    }
    ORDERED_MARKER
        .find(content)
        .map(|m| (ListKind::Ordered, &content[m.end()..]))
}

/// Whether a line stops paragraph collection.
fn ends_paragraph(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty()
        || trimmed.starts_with(UNORDERED_MARKER)
        || ORDERED_MARKER.is_match(trimmed)
        || trimmed.starts_with('#')
        || trimmed.starts_with('>')
        || trimmed.starts_with(FENCE)
        || trimmed.starts_with(DETAILS_CLOSE)
}

/// Remove `width` leading characters. Lines shorter than that are kept whole.
fn strip_indent(line: &str, width: usize) -> &str {
    match line.char_indices().nth(width) {
        Some((idx, _)) => &line[idx..],
        None if line.chars().count() == width => "",
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(markdown: &str) -> String {
        let options = RenderOptions {
            stylesheet: None,
            ..RenderOptions::default()
        };
        let lines: Vec<&str> = markdown.split('\n').collect();
        parse(&lines, &options).render()
    }

    fn flat(markdown: &str) -> String {
        body(markdown).replace('\n', "")
    }

    #[test]
    fn nested_list_closes_in_order() {
        assert_eq!(
            flat("- a\n  - b\n- c"),
            "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>"
        );
    }

    #[test]
    fn nested_list_opens_on_parent_item_line() {
        assert_eq!(
            body("- a\n  - b\n- c"),
            "<ul>\n<li>a<ul>\n<li>b\n</li></ul>\n</li>\n<li>c\n</li></ul>"
        );
    }

    #[test]
    fn three_level_list_unwinds_completely() {
        assert_eq!(
            flat("- a\n  - b\n    - c\n- d"),
            "<ul><li>a<ul><li>b<ul><li>c</li></ul></li></ul></li><li>d</li></ul>"
        );
    }

    #[test]
    fn ordered_list_items() {
        assert_eq!(
            flat("1. one\n2. two\n10. ten"),
            "<ol><li>one</li><li>two</li><li>ten</li></ol>"
        );
    }

    #[test]
    fn list_kind_change_at_same_depth_starts_new_list() {
        assert_eq!(
            body("1. one\n2. two\n- three"),
            "<ol>\n<li>one\n</li>\n<li>two\n</li></ol>\n<ul>\n<li>three\n</li></ul>"
        );
    }

    #[test]
    fn ordered_list_nested_in_unordered() {
        assert_eq!(
            flat("- a\n  1. x\n  2. y\n- b"),
            "<ul><li>a<ol><li>x</li><li>y</li></ol></li><li>b</li></ul>"
        );
    }

    #[test]
    fn list_items_render_inline_markup() {
        assert_eq!(
            flat("- **bold** item\n- see [here](/x)"),
            r#"<ul><li><strong>bold</strong> item</li><li>see <a href="/x">here</a></li></ul>"#
        );
    }

    #[test]
    fn continuation_line_joins_current_item() {
        assert_eq!(
            body("- item\n  more *text*"),
            "<ul>\n<li>item<br>more <em>text</em>\n</li></ul>"
        );
    }

    #[test]
    fn unindented_line_after_list_is_a_paragraph() {
        assert_eq!(body("- item\ntext"), "<ul>\n<li>item\n</li></ul>\n<p>text</p>");
    }

    #[test]
    fn blank_line_ends_list() {
        assert_eq!(
            body("- a\n\n- b"),
            "<ul>\n<li>a\n</li></ul>\n<ul>\n<li>b\n</li></ul>"
        );
    }

    #[test]
    fn code_fence_inside_list_item_is_deindented_by_fence_indent() {
        let markdown = "- step\n  ```\n  cargo build\n    nested <arg>\n  ```\n- next";
        assert_eq!(
            body(markdown),
            "<ul>\n<li>step\n<pre><code>cargo build\n  nested &lt;arg&gt;\n</code></pre>\n</li>\n<li>next\n</li></ul>"
        );
    }

    #[test]
    fn short_lines_in_list_code_block_are_kept() {
        let markdown = "- step\n    ```\n  x\n\n    ```";
        assert_eq!(
            body(markdown),
            "<ul>\n<li>step\n<pre><code>  x\n\n</code></pre>\n</li></ul>"
        );
    }

    #[test]
    fn fenced_code_block() {
        assert_eq!(body("```\nx=1\n```"), "<pre><code>x=1\n</code></pre>");
    }

    #[test]
    fn fenced_code_is_escaped_and_not_inline_rendered() {
        assert_eq!(
            body("```rust\nif a < b && *c* {\n}\n```"),
            "<pre><code>if a &lt; b &amp;&amp; *c* {\n}\n</code></pre>"
        );
    }

    #[test]
    fn code_block_keeps_markdown_markers_literal() {
        assert_eq!(
            body("```\n# not a heading\n- not a list\n:::details no\n```"),
            "<pre><code># not a heading\n- not a list\n:::details no\n</code></pre>"
        );
    }

    #[test]
    fn unterminated_code_fence_is_left_open() {
        let html = body("```\nlet x;\nlet y;");
        assert_eq!(html, "<pre><code>let x;\nlet y;");
        assert!(!html.contains("</code></pre>"));
    }

    #[test]
    fn unterminated_code_fence_in_list_item_is_left_open() {
        let html = body("- a\n  ```\n  x");
        assert_eq!(html, "<ul>\n<li>a\n<pre><code>x\n</li></ul>");
        assert!(!html.contains("</code></pre>"));
    }

    #[test]
    fn fence_after_list_closes_list_first() {
        assert_eq!(
            body("- a\n```\ncode\n```"),
            "<ul>\n<li>a\n</li></ul>\n<pre><code>code\n</code></pre>"
        );
    }

    #[test]
    fn heading_levels() {
        assert_eq!(body("# One"), "<h1>One</h1>");
        assert_eq!(body("### Title"), "<h3>Title</h3>");
        assert_eq!(body("###### Six  "), "<h6>Six</h6>");
    }

    #[test]
    fn heading_deeper_than_six_is_emitted_literally() {
        assert_eq!(body("####### deep"), "<h7>deep</h7>");
    }

    #[test]
    fn heading_renders_inline_markup() {
        assert_eq!(body("## Use `cargo`"), "<h2>Use <code>cargo</code></h2>");
    }

    #[test]
    fn blockquote_single_line() {
        assert_eq!(
            body("> quoted line"),
            "<blockquote>\n<p>quoted line</p>\n</blockquote>"
        );
    }

    #[test]
    fn blockquote_lines_become_separate_paragraphs() {
        assert_eq!(
            body("> one\n> *two*\nafter"),
            "<blockquote>\n<p>one</p>\n<p><em>two</em></p>\n</blockquote>\n<p>after</p>"
        );
    }

    #[test]
    fn blank_line_closes_blockquote() {
        assert_eq!(
            body("> a\n\n> b"),
            "<blockquote>\n<p>a</p>\n</blockquote>\n<blockquote>\n<p>b</p>\n</blockquote>"
        );
    }

    #[test]
    fn list_interrupts_blockquote() {
        assert_eq!(
            body("> q\n- a"),
            "<blockquote>\n<p>q</p>\n</blockquote>\n<ul>\n<li>a\n</li></ul>"
        );
    }

    #[test]
    fn code_fence_interrupts_blockquote() {
        assert_eq!(
            body("> a\n```\nx\n```"),
            "<blockquote>\n<p>a</p>\n</blockquote>\n<pre><code>x\n</code></pre>"
        );
    }

    #[test]
    fn consecutive_lines_form_one_paragraph() {
        assert_eq!(body("line one\nline two"), "<p>line one<br>line two</p>");
    }

    #[test]
    fn paragraph_lines_are_trimmed_and_rendered() {
        assert_eq!(body("  *a*  \n   b"), "<p><em>a</em><br>b</p>");
    }

    #[test]
    fn paragraph_stops_at_block_markers() {
        assert_eq!(
            body("text\n# Head\nmore\n> quote"),
            "<p>text</p>\n<h1>Head</h1>\n<p>more</p>\n<blockquote>\n<p>quote</p>\n</blockquote>"
        );
        assert_eq!(body("text\n1. one"), "<p>text</p>\n<ol>\n<li>one\n</li></ol>");
    }

    #[test]
    fn blank_lines_separate_paragraphs() {
        assert_eq!(body("a\n\n\nb"), "<p>a</p>\n<p>b</p>");
    }

    #[test]
    fn lines_that_only_look_like_markers_still_make_progress() {
        assert_eq!(body(">no space"), "<p>>no space</p>");
        assert_eq!(body(":::"), "<p>:::</p>");
        assert_eq!(body("  ```"), "<p>```</p>");
        assert_eq!(body("a\n>b"), "<p>a</p>\n<p>>b</p>");
    }

    #[test]
    fn details_block_with_summary() {
        assert_eq!(
            body(":::details More info\nbody text\n:::"),
            "<details><summary>More info</summary>\n<p>body text</p>\n</details>"
        );
    }

    #[test]
    fn details_summary_falls_back_and_is_escaped() {
        assert_eq!(body(":::details\n:::"), "<details><summary>詳細</summary>\n</details>");
        assert_eq!(
            body(":::details a < b\n:::"),
            "<details><summary>a &lt; b</summary>\n</details>"
        );
    }

    #[test]
    fn unclosed_details_is_closed_at_end() {
        assert_eq!(
            body(":::details S\n> q"),
            "<details><summary>S</summary>\n<blockquote>\n<p>q</p>\n</blockquote>\n</details>"
        );
    }

    #[test]
    fn details_close_closes_lists_opened_inside() {
        assert_eq!(
            body(":::details\n- a\n:::\nafter"),
            "<details><summary>詳細</summary>\n<ul>\n<li>a\n</li></ul>\n</details>\n<p>after</p>"
        );
    }

    #[test]
    fn details_after_list_item_closes_the_list_first() {
        assert_eq!(
            body("- a\n:::details S\nbody\n:::"),
            "<ul>\n<li>a\n</li></ul>\n<details><summary>S</summary>\n<p>body</p>\n</details>"
        );
    }

    #[test]
    fn list_inside_details_stays_inside_details() {
        let html = flat("- a\n  - b\n:::details S\n- c\ntext\n- d\n:::");
        assert_eq!(
            html,
            "<ul><li>a<ul><li>b</li></ul></li></ul>\
             <details><summary>S</summary><ul><li>c</li></ul><p>text</p><ul><li>d</li></ul></details>"
        );
    }

    #[test]
    fn second_details_open_closes_the_first() {
        assert_eq!(
            flat(":::details A\n:::details B\n:::"),
            "<details><summary>A</summary></details><details><summary>B</summary></details>"
        );
    }

    #[test]
    fn code_fence_inside_details() {
        assert_eq!(
            body(":::details Code\n```\n:::\n```\n:::"),
            "<details><summary>Code</summary>\n<pre><code>:::\n</code></pre>\n</details>"
        );
    }

    #[test]
    fn lists_are_closed_at_end_of_input() {
        assert_eq!(flat("- a\n  - b"), "<ul><li>a<ul><li>b</li></ul></li></ul>");
    }

    #[test]
    fn empty_input_produces_nothing() {
        assert_eq!(body(""), "");
    }

    #[test]
    fn stylesheet_is_the_first_fragment() {
        let options = RenderOptions {
            stylesheet: Some("<style>\n</style>".to_string()),
            ..RenderOptions::default()
        };
        let out = parse(&["# T"], &options);
        assert_eq!(out.render(), "<style>\n</style>\n<h1>T</h1>");
    }

    #[test]
    fn list_marker_recognizes_both_kinds() {
        assert_eq!(list_marker("- a"), Some((ListKind::Unordered, "a")));
        assert_eq!(list_marker("12. b"), Some((ListKind::Ordered, "b")));
        assert_eq!(list_marker("-a"), None);
        assert_eq!(list_marker("1.b"), None);
        assert_eq!(list_marker("a. b"), None);
    }

    #[test]
    fn strip_indent_handles_short_lines() {
        assert_eq!(strip_indent("    code", 2), "  code");
        assert_eq!(strip_indent("  ", 2), "");
        assert_eq!(strip_indent("x", 2), "x");
        assert_eq!(strip_indent("", 2), "");
    }

    fn count(html: &str, needle: &str) -> usize {
        html.matches(needle).count()
    }

    fn assert_balanced(html: &str) {
        for (open, close) in [
            ("<ul>", "</ul>"),
            ("<ol>", "</ol>"),
            ("<li>", "</li>"),
            ("<blockquote>", "</blockquote>"),
            ("<details>", "</details>"),
            ("<pre><code>", "</code></pre>"),
        ] {
            assert_eq!(
                count(html, open),
                count(html, close),
                "unbalanced {open} in:\n{html}"
            );
        }
    }

    #[test]
    fn tags_are_balanced_for_mixed_documents() {
        let documents = [
            "- a\n  - b\n    1. c\n- d",
            "- a\n    - b\n  - c\nparagraph",
            "> q\n> r\n- a\n  more\n\ntext",
            ":::details\n- a\n  - b\n> q\n:::",
            ":::details X\n```\ncode\n```",
            "- a\n  - b\n:::details S\nbody\n- c\n:::\n- d",
            "1. a\n- b\n  1. c\n  - d\n1. e",
            "- a\n  ```\n  x\n  ```\n  - b\n- c",
            "# h\n\n> q\n\n- a\n\n```\nx\n```\n\n:::details\nbody",
            "   - odd\n - shallower\n- base",
        ];
        for markdown in documents {
            assert_balanced(&body(markdown));
        }
    }

    #[test]
    fn list_depth_follows_indentation() {
        let html = flat("- a\n  - b\n    - c\n  - d\n- e");
        let depth_at = |marker: &str| {
            let pos = html.find(marker).unwrap_or_else(|| panic!("{marker} missing"));
            let before = &html[..pos];
            count(before, "<ul>") - count(before, "</ul>")
        };
        assert_eq!(depth_at("<li>a"), 1);
        assert_eq!(depth_at("<li>b"), 2);
        assert_eq!(depth_at("<li>c"), 3);
        assert_eq!(depth_at("<li>d"), 2);
        assert_eq!(depth_at("<li>e"), 1);
    }
}
