//! Line-oriented extraction for plain text and code bodies.
//!
//! A document is read as an alternation of directive lines and bodies. The
//! body of a directive runs from the line after it up to the next directive
//! line or the end of the document. Text before the first directive belongs
//! to no fragment.

use std::sync::Arc;

use crate::directive::Directives;
use crate::extractor::Extractor;
use crate::pattern::{DirectivePattern, Flavor, PatternCache, fragment_from};
use crate::{ExtractError, Fragment};

/// Extractor for plain text documents.
///
/// # Example
///
/// ```
/// use lectern_extract::{Directives, Extractor, Fragment, HandlerError, TextExtractor};
///
/// let directives = Directives::<Vec<Fragment>, ()>::new().with(
///     "note",
///     |fragment: Fragment, notes: &mut Vec<Fragment>, _: &mut ()| -> Result<(), HandlerError> {
///         notes.push(fragment);
///         Ok(())
///     },
/// );
///
/// let mut extractor = TextExtractor::new();
/// let (notes, ()) = extractor
///     .extract("preamble\n@note first\nhello\n@note second\n", &directives)
///     .unwrap();
///
/// assert_eq!(notes.len(), 2);
/// assert_eq!(notes[0].arguments, ["first"]);
/// assert_eq!(notes[0].as_text(), "hello");
/// ```
#[derive(Debug)]
pub struct TextExtractor {
    patterns: PatternCache,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor {
    /// Create an extractor for directives at the start of a line.
    #[must_use]
    pub fn new() -> Self {
        Self::with_flavor(Flavor::Plain)
    }

    fn with_flavor(flavor: Flavor) -> Self {
        Self {
            patterns: PatternCache::new(flavor),
        }
    }

    /// The compiled pattern for the names of `directives`.
    pub fn pattern<A, D>(
        &mut self,
        directives: &Directives<A, D>,
    ) -> Result<Arc<DirectivePattern>, ExtractError> {
        Ok(self.patterns.get(directives.names())?)
    }
}

impl Extractor for TextExtractor {
    type Fragments = TextFragments;

    fn parse_fragments<A, D>(
        &mut self,
        source: &str,
        directives: &Directives<A, D>,
    ) -> Result<TextFragments, ExtractError> {
        let pattern = self.pattern(directives)?;
        Ok(TextFragments::new(pattern, source))
    }
}

/// Extractor for directives written inside line comments.
///
/// Used on code block bodies: `// @name args` and `# @name args` lines are
/// directives, everything else is body text.
#[derive(Debug)]
pub struct EmbeddedExtractor {
    inner: TextExtractor,
}

impl Default for EmbeddedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddedExtractor {
    /// Create an extractor for `//` and `#` comment-prefixed directives.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: TextExtractor::with_flavor(Flavor::Embedded),
        }
    }

    /// The compiled pattern for the names of `directives`.
    pub fn pattern<A, D>(
        &mut self,
        directives: &Directives<A, D>,
    ) -> Result<Arc<DirectivePattern>, ExtractError> {
        self.inner.pattern(directives)
    }
}

impl Extractor for EmbeddedExtractor {
    type Fragments = TextFragments;

    fn parse_fragments<A, D>(
        &mut self,
        source: &str,
        directives: &Directives<A, D>,
    ) -> Result<TextFragments, ExtractError> {
        self.inner.parse_fragments(source, directives)
    }
}

/// A directive line found but not yet emitted.
#[derive(Debug)]
struct PendingMatch {
    fragment: Fragment,
    end: usize,
}

/// Lazy fragment sequence of a text document.
#[derive(Debug)]
pub struct TextFragments {
    pattern: Arc<DirectivePattern>,
    text: String,
    pending: Option<PendingMatch>,
    line: usize,
}

impl TextFragments {
    pub(crate) fn new(pattern: Arc<DirectivePattern>, source: &str) -> Self {
        let mut text = String::with_capacity(source.len() + 1);
        text.push_str(source);
        text.push('\n');

        let mut fragments = Self {
            pattern,
            text,
            pending: None,
            line: 0,
        };
        if let Some((start, pending)) = fragments.find_from(0) {
            fragments.line = fragments.text[..start].matches('\n').count();
            fragments.pending = Some(pending);
        }
        fragments
    }

    fn find_from(&self, from: usize) -> Option<(usize, PendingMatch)> {
        let captures = self.pattern.regex().captures_at(&self.text, from)?;
        let whole = captures.get(0)?;
        Some((
            whole.start(),
            PendingMatch {
                fragment: fragment_from(&captures),
                end: whole.end(),
            },
        ))
    }
}

impl Iterator for TextFragments {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        let current = self.pending.take()?;

        let body_end = match self.find_from(current.end) {
            Some((start, next)) => {
                self.pending = Some(next);
                start
            }
            None => self.text.len(),
        };

        // The rest of the directive line is only its terminator.
        let body = self.text[current.end..body_end]
            .split_once('\n')
            .map_or("", |(_, body)| body);
        let body = self.pattern.unescape(body);

        let start_line = self.line;
        let end_line = start_line + body.matches('\n').count() + 1;
        self.line = end_line;

        let content = body.strip_suffix('\n').unwrap_or(&*body);
        Some(
            current
                .fragment
                .with_lines(start_line, end_line)
                .with_content(content),
        )
    }
}
