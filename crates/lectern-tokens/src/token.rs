//! Token types.
//!
//! Tokens follow the block+inline taxonomy used by markdown-it style
//! tokenizers: block tokens form a flat sequence with explicit open/close
//! pairs, and every run of inline content is wrapped in a single
//! [`TokenKind::Inline`] token whose children hold the inline tokens.

use std::fmt;

/// Block container that is represented by an open/close token pair.
///
/// Paragraphs are not containers: they have dedicated token kinds because
/// the structural matchers address them directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Container {
    Heading,
    BlockQuote,
    BulletList,
    OrderedList,
    ListItem,
    FootnoteDefinition,
    DefinitionList,
    DefinitionTerm,
    DefinitionDescription,
    Table,
    TableHead,
    TableRow,
    TableCell,
    Metadata,
}

impl Container {
    fn as_str(self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::BlockQuote => "blockquote",
            Self::BulletList => "bullet_list",
            Self::OrderedList => "ordered_list",
            Self::ListItem => "list_item",
            Self::FootnoteDefinition => "footnote",
            Self::DefinitionList => "dl",
            Self::DefinitionTerm => "dt",
            Self::DefinitionDescription => "dd",
            Self::Table => "table",
            Self::TableHead => "thead",
            Self::TableRow => "tr",
            Self::TableCell => "td",
            Self::Metadata => "front_matter",
        }
    }
}

/// Inline markup with an open/close pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Mark {
    Emphasis,
    Strong,
    Strikethrough,
    Superscript,
    Subscript,
}

impl Mark {
    fn as_str(self) -> &'static str {
        match self {
            Self::Emphasis => "em",
            Self::Strong => "strong",
            Self::Strikethrough => "s",
            Self::Superscript => "sup",
            Self::Subscript => "sub",
        }
    }
}

/// Kind of a [`Token`].
///
/// The [`Display`](fmt::Display) implementation yields the conventional
/// type name (`paragraph_open`, `code_inline`, `fence`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TokenKind {
    // Block level
    ParagraphOpen,
    ParagraphClose,
    /// Run of inline content; the inline tokens are its children.
    Inline,
    /// Fenced code block (backticks or tildes).
    Fence,
    /// Indented code block.
    CodeBlock,
    HtmlBlock,
    /// Thematic break.
    Rule,
    Open(Container),
    Close(Container),

    // Inline level
    Text,
    CodeInline,
    /// Image; `src` attribute holds the target, children hold the alt text.
    Image,
    /// Link start; `href` attribute holds the target.
    LinkOpen,
    LinkClose,
    SoftBreak,
    HardBreak,
    HtmlInline,
    MarkOpen(Mark),
    MarkClose(Mark),
    Math,
    FootnoteRef,
    TaskMarker,
}

impl TokenKind {
    /// Whether this kind holds the body of a code block.
    #[must_use]
    pub fn is_code(self) -> bool {
        matches!(self, Self::Fence | Self::CodeBlock)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParagraphOpen => f.write_str("paragraph_open"),
            Self::ParagraphClose => f.write_str("paragraph_close"),
            Self::Inline => f.write_str("inline"),
            Self::Fence => f.write_str("fence"),
            Self::CodeBlock => f.write_str("code_block"),
            Self::HtmlBlock => f.write_str("html_block"),
            Self::Rule => f.write_str("hr"),
            Self::Open(container) => write!(f, "{}_open", container.as_str()),
            Self::Close(container) => write!(f, "{}_close", container.as_str()),
            Self::Text => f.write_str("text"),
            Self::CodeInline => f.write_str("code_inline"),
            Self::Image => f.write_str("image"),
            Self::LinkOpen => f.write_str("link_open"),
            Self::LinkClose => f.write_str("link_close"),
            Self::SoftBreak => f.write_str("softbreak"),
            Self::HardBreak => f.write_str("hardbreak"),
            Self::HtmlInline => f.write_str("html_inline"),
            Self::MarkOpen(mark) => write!(f, "{}_open", mark.as_str()),
            Self::MarkClose(mark) => write!(f, "{}_close", mark.as_str()),
            Self::Math => f.write_str("math"),
            Self::FootnoteRef => f.write_str("footnote_ref"),
            Self::TaskMarker => f.write_str("task_marker"),
        }
    }
}

/// A single markdown token.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    pub kind: TokenKind,
    /// Text payload: code block body, HTML block source, code span text,
    /// raw inline source for [`TokenKind::Inline`].
    pub content: String,
    /// Fence info string (empty for everything else).
    pub info: String,
    /// Attributes such as `src`, `href` and `title`.
    pub attrs: Vec<(String, String)>,
    /// Inline children of [`TokenKind::Inline`] and [`TokenKind::Image`].
    pub children: Vec<Token>,
    /// Source lines covered by the token: zero-based, end exclusive.
    ///
    /// Only block-level opening and leaf tokens carry a map.
    pub map: Option<(usize, usize)>,
    /// Set on the paragraph pair implied around tight list item text.
    pub hidden: bool,
}

impl Token {
    /// Create an empty token of the given kind.
    #[must_use]
    pub fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            content: String::new(),
            info: String::new(),
            attrs: Vec::new(),
            children: Vec::new(),
            map: None,
            hidden: false,
        }
    }

    /// Set the text payload.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Set the inline children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Token>) -> Self {
        self.children = children;
        self
    }

    /// Set the source line map.
    #[must_use]
    pub fn with_map(mut self, start: usize, end: usize) -> Self {
        self.map = Some((start, end));
        self
    }

    /// Look up an attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(TokenKind::ParagraphOpen.to_string(), "paragraph_open");
        assert_eq!(TokenKind::CodeInline.to_string(), "code_inline");
        assert_eq!(TokenKind::Open(Container::BulletList).to_string(), "bullet_list_open");
        assert_eq!(TokenKind::Close(Container::ListItem).to_string(), "list_item_close");
        assert_eq!(TokenKind::MarkOpen(Mark::Strong).to_string(), "strong_open");
    }

    #[test]
    fn test_attr_lookup() {
        let token = Token::new(TokenKind::Image)
            .with_attr("src", "a.png")
            .with_attr("title", "");
        assert_eq!(token.attr("src"), Some("a.png"));
        assert_eq!(token.attr("title"), Some(""));
        assert_eq!(token.attr("href"), None);
    }

    #[test]
    fn test_is_code() {
        assert!(TokenKind::Fence.is_code());
        assert!(TokenKind::CodeBlock.is_code());
        assert!(!TokenKind::HtmlBlock.is_code());
    }
}
