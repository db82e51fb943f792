//! Structural shapes recognized in a markdown token stream.
//!
//! Each [`Rule`] describes a run of top-level tokens, where the directive
//! text comes from and what gets attached to the fragment. [`RULES`] lists
//! them in priority order: the bare shapes are prefixes of the longer ones
//! and come last.

use std::path::Path;
use std::sync::LazyLock;

use lectern_tokens::{Token, TokenKind};
use regex::Regex;

use crate::pattern::DirectivePattern;
use crate::{Fragment, Reference};

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<!--\s*(.+?)\s*-->\s*").unwrap());

/// Expected token at one position of a shape.
#[derive(Clone, Copy, Debug)]
enum Slot {
    Is(TokenKind),
    Either(TokenKind, TokenKind),
    /// HTML block whose source is exactly the given tag.
    Html(&'static str),
}

impl Slot {
    fn accepts(self, token: &Token) -> bool {
        match self {
            Self::Is(kind) => token.kind == kind,
            Self::Either(a, b) => token.kind == a || token.kind == b,
            Self::Html(tag) => {
                token.kind == TokenKind::HtmlBlock && token.content.trim_end() == tag
            }
        }
    }
}

const P_OPEN: Slot = Slot::Is(TokenKind::ParagraphOpen);
const INLINE: Slot = Slot::Is(TokenKind::Inline);
const P_CLOSE: Slot = Slot::Is(TokenKind::ParagraphClose);
const CODE: Slot = Slot::Either(TokenKind::Fence, TokenKind::CodeBlock);
const HTML: Slot = Slot::Is(TokenKind::HtmlBlock);
const DETAILS: Slot = Slot::Html("<details>");
const END_DETAILS: Slot = Slot::Html("</details>");

/// Where the directive text of a shape is read from.
#[derive(Clone, Copy, Debug)]
enum Source {
    /// Inline token whose only child is a code span.
    CodeSpan(usize),
    /// Inline token whose only child is a link around a code span.
    LinkedCodeSpan(usize),
    /// HTML block holding a single comment.
    Comment(usize),
}

impl Source {
    fn directive_text(self, window: &[Token]) -> Option<&str> {
        match self {
            Self::CodeSpan(i) => match window[i].children.as_slice() {
                [code] if code.kind == TokenKind::CodeInline => Some(code.content.as_str()),
                _ => None,
            },
            Self::LinkedCodeSpan(i) => linked_code_span(&window[i]).map(|(code, _)| code),
            Self::Comment(i) => COMMENT
                .captures(&window[i].content)
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str()),
        }
    }
}

/// What a shape attaches to its fragment.
#[derive(Clone, Copy, Debug)]
enum Attachment {
    Nothing,
    /// Body of the code block at the index.
    Content(usize),
    /// Source of the image that is the only child of the inline token.
    Image(usize),
    /// Target of the link around the directive code span.
    LinkTarget(usize),
}

impl Attachment {
    fn attach(self, fragment: Fragment, window: &[Token], base: Option<&Path>) -> Option<Fragment> {
        match self {
            Self::Nothing => Some(fragment),
            Self::Content(i) => Some(fragment.with_content(window[i].content.as_str())),
            Self::Image(i) => {
                let src = match window[i].children.as_slice() {
                    [image] if image.kind == TokenKind::Image => image.attr("src")?,
                    _ => return None,
                };
                (!src.is_empty()).then(|| fragment.with_reference(Reference::resolve(src, base)))
            }
            Self::LinkTarget(i) => {
                let (_, href) = linked_code_span(&window[i])?;
                Some(fragment.with_reference(Reference::resolve(href, base)))
            }
        }
    }
}

/// Code span text and link target of `[`code`](target)`.
fn linked_code_span(inline: &Token) -> Option<(&str, &str)> {
    match inline.children.as_slice() {
        [open, code, close]
            if open.kind == TokenKind::LinkOpen
                && code.kind == TokenKind::CodeInline
                && close.kind == TokenKind::LinkClose =>
        {
            let href = open.attr("href").filter(|href| !href.is_empty())?;
            Some((code.content.as_str(), href))
        }
        _ => None,
    }
}

/// Values shared by all rules during one scan.
pub(crate) struct MatchContext<'a> {
    pub(crate) pattern: &'a DirectivePattern,
    pub(crate) external_files: Option<&'a Path>,
}

/// One structural shape.
#[derive(Debug)]
pub(crate) struct Rule {
    pub(crate) name: &'static str,
    slots: &'static [Slot],
    source: Source,
    attachment: Attachment,
}

impl Rule {
    /// Match the shape at `offset`.
    ///
    /// Returns the fragment and the number of tokens the shape covers.
    pub(crate) fn try_match(
        &self,
        tokens: &[Token],
        offset: usize,
        context: &MatchContext<'_>,
    ) -> Option<(Fragment, usize)> {
        let window = tokens.get(offset..offset + self.slots.len())?;
        if !self.slots.iter().zip(window).all(|(slot, token)| slot.accepts(token)) {
            return None;
        }

        let text = self.source.directive_text(window)?;
        let fragment = context.pattern.match_whole(text)?;
        let fragment = self
            .attachment
            .attach(fragment, window, context.external_files)?;

        let start = window[0].map.map_or(0, |(start, _)| start);
        let end = window
            .iter()
            .rev()
            .find_map(|token| token.map)
            .map_or(start + 1, |(_, end)| end);
        Some((fragment.with_lines(start, end), window.len()))
    }
}

/// All shapes, highest priority first.
pub(crate) static RULES: [Rule; 9] = [
    // `@name args`
    //
    // ```
    // content
    // ```
    Rule {
        name: "code_span_code_block",
        slots: &[P_OPEN, INLINE, P_CLOSE, CODE],
        source: Source::CodeSpan(1),
        attachment: Attachment::Content(3),
    },
    // `@name args`
    //
    // ![](path/to/image)
    Rule {
        name: "code_span_image",
        slots: &[P_OPEN, INLINE, P_CLOSE, P_OPEN, INLINE, P_CLOSE],
        source: Source::CodeSpan(1),
        attachment: Attachment::Image(4),
    },
    // `@name args`
    //
    // <details>
    //
    // ```
    // content
    // ```
    //
    // </details>
    Rule {
        name: "code_span_details_code_block",
        slots: &[P_OPEN, INLINE, P_CLOSE, DETAILS, CODE, END_DETAILS],
        source: Source::CodeSpan(1),
        attachment: Attachment::Content(4),
    },
    // `@name args`
    //
    // <details>
    //
    // ![](path/to/image)
    //
    // </details>
    Rule {
        name: "code_span_details_image",
        slots: &[
            P_OPEN,
            INLINE,
            P_CLOSE,
            DETAILS,
            P_OPEN,
            INLINE,
            P_CLOSE,
            END_DETAILS,
        ],
        source: Source::CodeSpan(1),
        attachment: Attachment::Image(5),
    },
    // [`@name args`](path/to/content)
    Rule {
        name: "linked_code_span",
        slots: &[P_OPEN, INLINE, P_CLOSE],
        source: Source::LinkedCodeSpan(1),
        attachment: Attachment::LinkTarget(1),
    },
    // <!-- @name args -->
    //
    // ```
    // content
    // ```
    Rule {
        name: "comment_code_block",
        slots: &[HTML, CODE],
        source: Source::Comment(0),
        attachment: Attachment::Content(1),
    },
    // <!-- @name args -->
    //
    // ![](path/to/image)
    Rule {
        name: "comment_image",
        slots: &[HTML, P_OPEN, INLINE, P_CLOSE],
        source: Source::Comment(0),
        attachment: Attachment::Image(2),
    },
    // `@name args`
    Rule {
        name: "code_span",
        slots: &[P_OPEN, INLINE, P_CLOSE],
        source: Source::CodeSpan(1),
        attachment: Attachment::Nothing,
    },
    // <!-- @name args -->
    Rule {
        name: "comment",
        slots: &[HTML],
        source: Source::Comment(0),
        attachment: Attachment::Nothing,
    },
];
