//! Flattening of the pulldown-cmark event stream into [`Token`]s.

use std::mem;
use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::lines::LineIndex;
use crate::token::{Container, Mark, Token, TokenKind};

/// Tokenizer configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Enable GitHub Flavored Markdown (tables, strikethrough, task lists).
    ///
    /// Default: `true`
    pub gfm: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self { gfm: true }
    }
}

impl TokenizerOptions {
    /// Enable or disable GitHub Flavored Markdown features.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    fn parser_options(self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
        } else {
            Options::empty()
        }
    }
}

/// Tokenize markdown with default options.
///
/// # Example
///
/// ```
/// use lectern_tokens::{tokenize, TokenKind};
///
/// let tokens = tokenize("`@note`\n\n```\nbody\n```\n");
/// let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     [
///         TokenKind::ParagraphOpen,
///         TokenKind::Inline,
///         TokenKind::ParagraphClose,
///         TokenKind::Fence,
///     ]
/// );
/// assert_eq!(tokens[3].content, "body\n");
/// ```
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_with(source, TokenizerOptions::default())
}

/// Tokenize markdown into a flat block token sequence.
///
/// Link and image targets are kept exactly as written (after markdown
/// escape processing); no link validation or normalization is applied.
#[must_use]
pub fn tokenize_with(source: &str, options: TokenizerOptions) -> Vec<Token> {
    let parser = Parser::new_ext(source, options.parser_options());
    let mut builder = TokenStreamBuilder::new(source);
    for (event, range) in parser.into_offset_iter() {
        builder.process_event(event, range);
    }
    builder.finish()
}

/// Inline children collected for the current block.
#[derive(Default)]
struct InlineState {
    children: Vec<Token>,
    span: Option<Range<usize>>,
    /// Open images with the children of their parent level.
    images: Vec<(Token, Vec<Token>)>,
}

impl InlineState {
    fn extend_span(&mut self, range: &Range<usize>) {
        self.span = Some(match self.span.take() {
            Some(span) => span.start.min(range.start)..span.end.max(range.end),
            None => range.clone(),
        });
    }

    fn push(&mut self, token: Token, range: &Range<usize>) {
        self.extend_span(range);
        self.children.push(token);
    }

    fn start_image(&mut self, image: Token, range: &Range<usize>) {
        self.extend_span(range);
        let parent = mem::take(&mut self.children);
        self.images.push((image, parent));
    }

    fn end_image(&mut self) {
        if let Some((image, parent)) = self.images.pop() {
            let alt = mem::replace(&mut self.children, parent);
            self.children.push(image.with_children(alt));
        }
    }

    fn take(&mut self) -> Option<(Vec<Token>, Range<usize>)> {
        let span = self.span.take()?;
        Some((mem::take(&mut self.children), span))
    }
}

struct TokenStreamBuilder<'s> {
    source: &'s str,
    lines: LineIndex,
    tokens: Vec<Token>,
    inline: InlineState,
    /// Code block being collected.
    code: Option<Token>,
    /// HTML block being collected.
    html: Option<Token>,
    /// Open containers, innermost last.
    containers: Vec<Container>,
    in_paragraph: bool,
}

impl<'s> TokenStreamBuilder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            tokens: Vec::new(),
            inline: InlineState::default(),
            code: None,
            html: None,
            containers: Vec::new(),
            in_paragraph: false,
        }
    }

    fn finish(mut self) -> Vec<Token> {
        self.flush_inline();
        self.tokens
    }

    fn mapped(&self, token: Token, range: &Range<usize>) -> Token {
        let (start, end) = self.lines.span(range);
        token.with_map(start, end)
    }

    /// Emit pending inline content as a single inline token.
    ///
    /// Text sitting directly in a list item (tight lists) is wrapped in a
    /// hidden paragraph pair so it has the same shape as loose list text.
    fn flush_inline(&mut self) {
        let Some((children, span)) = self.inline.take() else {
            return;
        };
        let implicit =
            !self.in_paragraph && self.containers.last() == Some(&Container::ListItem);

        if implicit {
            let mut open = self.mapped(Token::new(TokenKind::ParagraphOpen), &span);
            open.hidden = true;
            self.tokens.push(open);
        }

        let token = Token::new(TokenKind::Inline)
            .with_content(self.source[span.clone()].trim())
            .with_children(children);
        let token = self.mapped(token, &span);
        self.tokens.push(token);

        if implicit {
            let mut close = Token::new(TokenKind::ParagraphClose);
            close.hidden = true;
            self.tokens.push(close);
        }
    }

    fn open_block(&mut self, kind: TokenKind, range: &Range<usize>) {
        self.flush_inline();
        match kind {
            TokenKind::ParagraphOpen => self.in_paragraph = true,
            TokenKind::Open(container) => self.containers.push(container),
            _ => {}
        }
        let token = self.mapped(Token::new(kind), range);
        self.tokens.push(token);
    }

    fn close_block(&mut self, kind: TokenKind) {
        self.flush_inline();
        match kind {
            TokenKind::ParagraphClose => self.in_paragraph = false,
            TokenKind::Close(_) => {
                self.containers.pop();
            }
            _ => {}
        }
        self.tokens.push(Token::new(kind));
    }

    fn push_inline(&mut self, kind: TokenKind, content: String, range: &Range<usize>) {
        self.inline.push(Token::new(kind).with_content(content), range);
    }

    fn process_event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start_tag(tag, &range),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                if let Some(code) = &mut self.code {
                    code.content.push_str(&text);
                } else {
                    self.push_inline(TokenKind::Text, text.to_string(), &range);
                }
            }
            Event::Code(code) => self.push_inline(TokenKind::CodeInline, code.to_string(), &range),
            Event::Html(html) => {
                if let Some(block) = &mut self.html {
                    block.content.push_str(&html);
                } else {
                    self.push_inline(TokenKind::HtmlInline, html.to_string(), &range);
                }
            }
            Event::InlineHtml(html) => {
                self.push_inline(TokenKind::HtmlInline, html.to_string(), &range);
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.push_inline(TokenKind::Math, math.to_string(), &range);
            }
            Event::FootnoteReference(label) => {
                self.push_inline(TokenKind::FootnoteRef, label.to_string(), &range);
            }
            Event::SoftBreak => self.inline.push(Token::new(TokenKind::SoftBreak), &range),
            Event::HardBreak => self.inline.push(Token::new(TokenKind::HardBreak), &range),
            Event::Rule => self.open_block(TokenKind::Rule, &range),
            Event::TaskListMarker(checked) => {
                let marker = if checked { "x" } else { " " };
                self.push_inline(TokenKind::TaskMarker, marker.to_owned(), &range);
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>, range: &Range<usize>) {
        match tag {
            Tag::Paragraph => self.open_block(TokenKind::ParagraphOpen, range),
            Tag::Heading { .. } => self.open_block(TokenKind::Open(Container::Heading), range),
            Tag::BlockQuote(_) => self.open_block(TokenKind::Open(Container::BlockQuote), range),
            Tag::CodeBlock(kind) => {
                self.flush_inline();
                let token = match kind {
                    CodeBlockKind::Fenced(info) => {
                        let mut token = Token::new(TokenKind::Fence);
                        token.info = info.to_string();
                        token
                    }
                    CodeBlockKind::Indented => Token::new(TokenKind::CodeBlock),
                };
                self.code = Some(self.mapped(token, range));
            }
            Tag::HtmlBlock => {
                self.flush_inline();
                self.html = Some(self.mapped(Token::new(TokenKind::HtmlBlock), range));
            }
            Tag::List(start) => {
                let container = if start.is_some() {
                    Container::OrderedList
                } else {
                    Container::BulletList
                };
                self.open_block(TokenKind::Open(container), range);
            }
            Tag::Item => self.open_block(TokenKind::Open(Container::ListItem), range),
            Tag::FootnoteDefinition(_) => {
                self.open_block(TokenKind::Open(Container::FootnoteDefinition), range);
            }
            Tag::MetadataBlock(_) => self.open_block(TokenKind::Open(Container::Metadata), range),
            Tag::DefinitionList => {
                self.open_block(TokenKind::Open(Container::DefinitionList), range);
            }
            Tag::DefinitionListTitle => {
                self.open_block(TokenKind::Open(Container::DefinitionTerm), range);
            }
            Tag::DefinitionListDefinition => {
                self.open_block(TokenKind::Open(Container::DefinitionDescription), range);
            }
            Tag::Table(_) => self.open_block(TokenKind::Open(Container::Table), range),
            Tag::TableHead => self.open_block(TokenKind::Open(Container::TableHead), range),
            Tag::TableRow => self.open_block(TokenKind::Open(Container::TableRow), range),
            Tag::TableCell => self.open_block(TokenKind::Open(Container::TableCell), range),
            Tag::Emphasis => self.push_mark(TokenKind::MarkOpen(Mark::Emphasis), range),
            Tag::Strong => self.push_mark(TokenKind::MarkOpen(Mark::Strong), range),
            Tag::Strikethrough => self.push_mark(TokenKind::MarkOpen(Mark::Strikethrough), range),
            Tag::Superscript => self.push_mark(TokenKind::MarkOpen(Mark::Superscript), range),
            Tag::Subscript => self.push_mark(TokenKind::MarkOpen(Mark::Subscript), range),
            Tag::Link {
                dest_url, title, ..
            } => {
                let token = Token::new(TokenKind::LinkOpen)
                    .with_attr("href", dest_url.to_string())
                    .with_attr("title", title.to_string());
                self.inline.push(token, range);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let token = Token::new(TokenKind::Image)
                    .with_attr("src", dest_url.to_string())
                    .with_attr("title", title.to_string());
                self.inline.start_image(token, range);
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.close_block(TokenKind::ParagraphClose),
            TagEnd::Heading(_) => self.close_block(TokenKind::Close(Container::Heading)),
            TagEnd::BlockQuote(_) => self.close_block(TokenKind::Close(Container::BlockQuote)),
            TagEnd::CodeBlock => {
                if let Some(token) = self.code.take() {
                    self.tokens.push(token);
                }
            }
            TagEnd::HtmlBlock => {
                if let Some(token) = self.html.take() {
                    self.tokens.push(token);
                }
            }
            TagEnd::List(ordered) => {
                let container = if ordered {
                    Container::OrderedList
                } else {
                    Container::BulletList
                };
                self.close_block(TokenKind::Close(container));
            }
            TagEnd::Item => self.close_block(TokenKind::Close(Container::ListItem)),
            TagEnd::FootnoteDefinition => {
                self.close_block(TokenKind::Close(Container::FootnoteDefinition));
            }
            TagEnd::MetadataBlock(_) => self.close_block(TokenKind::Close(Container::Metadata)),
            TagEnd::DefinitionList => {
                self.close_block(TokenKind::Close(Container::DefinitionList));
            }
            TagEnd::DefinitionListTitle => {
                self.close_block(TokenKind::Close(Container::DefinitionTerm));
            }
            TagEnd::DefinitionListDefinition => {
                self.close_block(TokenKind::Close(Container::DefinitionDescription));
            }
            TagEnd::Table => self.close_block(TokenKind::Close(Container::Table)),
            TagEnd::TableHead => self.close_block(TokenKind::Close(Container::TableHead)),
            TagEnd::TableRow => self.close_block(TokenKind::Close(Container::TableRow)),
            TagEnd::TableCell => self.close_block(TokenKind::Close(Container::TableCell)),
            TagEnd::Emphasis => self.close_mark(Mark::Emphasis),
            TagEnd::Strong => self.close_mark(Mark::Strong),
            TagEnd::Strikethrough => self.close_mark(Mark::Strikethrough),
            TagEnd::Superscript => self.close_mark(Mark::Superscript),
            TagEnd::Subscript => self.close_mark(Mark::Subscript),
            TagEnd::Link => self.inline.children.push(Token::new(TokenKind::LinkClose)),
            TagEnd::Image => self.inline.end_image(),
        }
    }

    fn push_mark(&mut self, kind: TokenKind, range: &Range<usize>) {
        self.inline.push(Token::new(kind), range);
    }

    fn close_mark(&mut self, mark: Mark) {
        self.inline.children.push(Token::new(TokenKind::MarkClose(mark)));
    }
}
