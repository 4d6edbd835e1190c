//! Structured output buffer for the block parser.
//!
//! The parser never edits emitted HTML text. Each block becomes a
//! [`Fragment`], and content that belongs on the same output line as the
//! previous block (a nested list opening, the first line of a code block, a
//! continuation line of a list item) is attached to the last fragment as an
//! [`Attachment`]. Rendering turns every fragment into exactly one line.

/// Kind of list opened by an item marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `- item`
    Unordered,
    /// `1. item`
    Ordered,
}

impl ListKind {
    /// The HTML element name for this list kind.
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// One line of output HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A complete `<style>` element.
    Stylesheet(String),
    /// `<pre><code>`
    CodeOpen,
    /// One escaped line of code.
    CodeLine(String),
    /// `</code></pre>`
    CodeClose,
    /// `<details><summary>…</summary>` with an escaped summary.
    DetailsOpen(String),
    /// `</details>`
    DetailsClose,
    /// `<ul>` or `<ol>` on its own line.
    ListOpen(ListKind),
    /// `<li>` followed by rendered inline content.
    ListItem(String),
    /// `</li>` closing a sibling item.
    ListItemClose,
    /// `</li></ul>` or `</li></ol>`: closes the last item and its list.
    ListClose(ListKind),
    /// `<blockquote>`
    BlockquoteOpen,
    /// `</blockquote>`
    BlockquoteClose,
    /// A heading with rendered inline content. Levels above 6 are kept as-is.
    Heading { level: usize, content: String },
    /// A quoted line inside a blockquote, or a collected paragraph.
    /// Each entry is one rendered source line; entries are joined by `<br>`.
    Paragraph(Vec<String>),
}

/// Content appended to the end of the previous fragment's line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// A nested list opening tag placed right after its parent item.
    ListOpen(ListKind),
    /// The first escaped line of a code block.
    CodeText(String),
    /// A `<br>` followed by rendered continuation text.
    LineBreak(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    fragment: Fragment,
    attachments: Vec<Attachment>,
}

/// Append-only sequence of fragments.
#[derive(Debug, Default)]
pub struct Output {
    entries: Vec<Entry>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment on its own line.
    pub fn push(&mut self, fragment: Fragment) {
        self.entries.push(Entry {
            fragment,
            attachments: Vec::new(),
        });
    }

    /// Attach content to the end of the last fragment.
    ///
    /// The parser only attaches after it has pushed the fragment the content
    /// belongs to, so there is always a last fragment.
    pub fn attach(&mut self, attachment: Attachment) {
        if let Some(entry) = self.entries.last_mut() {
            entry.attachments.push(attachment);
        }
    }

    /// Whether the last line is a bare list item: an `<li>` with no nested
    /// list already attached.
    pub fn ends_with_open_item(&self) -> bool {
        self.entries.last().is_some_and(|entry| {
            matches!(entry.fragment, Fragment::ListItem(_))
                && !entry
                    .attachments
                    .iter()
                    .any(|a| matches!(a, Attachment::ListOpen(_)))
        })
    }

    /// Number of output lines.
    pub fn fragment_count(&self) -> usize {
        self.entries.len()
    }

    /// Render every fragment as one line, joined with `\n`.
    pub fn render(&self) -> String {
        let mut html = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                html.push('\n');
            }
            render_fragment(&mut html, &entry.fragment);
            for attachment in &entry.attachments {
                render_attachment(&mut html, attachment);
            }
        }
        html
    }
}

fn render_fragment(html: &mut String, fragment: &Fragment) {
    match fragment {
        Fragment::Stylesheet(style) => html.push_str(style),
        Fragment::CodeOpen => html.push_str("<pre><code>"),
        Fragment::CodeLine(line) => html.push_str(line),
        Fragment::CodeClose => html.push_str("</code></pre>"),
        Fragment::DetailsOpen(summary) => {
            html.push_str("<details><summary>");
            html.push_str(summary);
            html.push_str("</summary>");
        }
        Fragment::DetailsClose => html.push_str("</details>"),
        Fragment::ListOpen(kind) => push_tag(html, "<", kind.tag()),
        Fragment::ListItem(content) => {
            html.push_str("<li>");
            html.push_str(content);
        }
        Fragment::ListItemClose => html.push_str("</li>"),
        Fragment::ListClose(kind) => {
            html.push_str("</li>");
            push_tag(html, "</", kind.tag());
        }
        Fragment::BlockquoteOpen => html.push_str("<blockquote>"),
        Fragment::BlockquoteClose => html.push_str("</blockquote>"),
        Fragment::Heading { level, content } => {
            html.push_str(&format!("<h{level}>{content}</h{level}>"));
        }
        Fragment::Paragraph(lines) => {
            html.push_str("<p>");
            html.push_str(&lines.join("<br>"));
            html.push_str("</p>");
        }
    }
}

fn render_attachment(html: &mut String, attachment: &Attachment) {
    match attachment {
        Attachment::ListOpen(kind) => push_tag(html, "<", kind.tag()),
        Attachment::CodeText(text) => html.push_str(text),
        Attachment::LineBreak(text) => {
            html.push_str("<br>");
            html.push_str(text);
        }
    }
}

fn push_tag(html: &mut String, open: &str, name: &str) {
    html.push_str(open);
    html.push_str(name);
    html.push('>');
}

/// Escape text for use in HTML content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
