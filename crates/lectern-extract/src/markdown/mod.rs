//! Structural extraction from markdown.
//!
//! The document is tokenized and scanned left to right. At each token the
//! shapes of [`rules`] are tried in priority order. When none matches, code
//! blocks are scanned for comment-prefixed directives and multi-line HTML
//! comments are scanned like plain text.

mod rules;

use std::path::PathBuf;
use std::sync::Arc;

use lectern_tokens::{Token, TokenKind, tokenize_with};

use self::rules::{MatchContext, RULES};
use crate::directive::Directives;
use crate::extractor::Extractor;
use crate::pattern::{DirectivePattern, Flavor, PatternCache};
use crate::text::{EmbeddedExtractor, TextExtractor, TextFragments};
use crate::{ExtractError, ExtractorConfig, Fragment};

/// Extractor for markdown documents.
///
/// Recognized forms, highest priority first:
///
/// 1. a code span paragraph followed by a code block (the block is the body)
/// 2. a code span paragraph followed by an image paragraph
/// 3. a code span paragraph followed by a code block inside `<details>`
/// 4. a code span paragraph followed by an image inside `<details>`
/// 5. a link around a code span
/// 6. an HTML comment followed by a code block
/// 7. an HTML comment followed by an image paragraph
/// 8. a bare code span paragraph
/// 9. a bare HTML comment
///
/// Code blocks that are not attached to a directive are searched for
/// `// @name` and `# @name` lines, and multi-line HTML comments for `@name`
/// lines.
///
/// # Example
///
/// ```
/// use lectern_extract::{Directives, Extractor, Fragment, HandlerError, MarkdownExtractor};
///
/// let directives = Directives::<Vec<Fragment>, ()>::new().with(
///     "function",
///     |fragment: Fragment, out: &mut Vec<Fragment>, _: &mut ()| -> Result<(), HandlerError> {
///         out.push(fragment);
///         Ok(())
///     },
/// );
///
/// let source = "`@function demo:tick`\n\n```mcfunction\nsay tick\n```\n";
/// let (functions, ()) = MarkdownExtractor::new().extract(source, &directives).unwrap();
///
/// assert_eq!(functions[0].arguments, ["demo:tick"]);
/// assert_eq!(functions[0].as_text(), "say tick\n");
/// ```
#[derive(Debug)]
pub struct MarkdownExtractor {
    config: ExtractorConfig,
    patterns: PatternCache,
    embedded: EmbeddedExtractor,
    comments: TextExtractor,
}

impl Default for MarkdownExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownExtractor {
    /// Create an extractor with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ExtractorConfig::default())
    }

    /// Create an extractor with the given configuration.
    #[must_use]
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self {
            config,
            patterns: PatternCache::new(Flavor::Plain),
            embedded: EmbeddedExtractor::new(),
            comments: TextExtractor::new(),
        }
    }

    /// The extractor configuration.
    #[must_use]
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Mutable configuration, e.g. to point a reused extractor at another
    /// external files directory. Cached patterns are kept.
    pub fn config_mut(&mut self) -> &mut ExtractorConfig {
        &mut self.config
    }

    /// The compiled pattern for directive code spans and comments.
    pub fn pattern<A, D>(
        &mut self,
        directives: &Directives<A, D>,
    ) -> Result<Arc<DirectivePattern>, ExtractError> {
        Ok(self.patterns.get(directives.names())?)
    }

    /// Scan an already tokenized document.
    pub fn parse_tokens<A, D>(
        &mut self,
        tokens: Vec<Token>,
        directives: &Directives<A, D>,
    ) -> Result<MarkdownFragments, ExtractError> {
        Ok(MarkdownFragments {
            tokens,
            pos: 0,
            pattern: self.pattern(directives)?,
            embedded: self.embedded.pattern(directives)?,
            comments: self.comments.pattern(directives)?,
            external_files: self.config.external_files.clone(),
            nested: None,
        })
    }
}

impl Extractor for MarkdownExtractor {
    type Fragments = MarkdownFragments;

    fn parse_fragments<A, D>(
        &mut self,
        source: &str,
        directives: &Directives<A, D>,
    ) -> Result<MarkdownFragments, ExtractError> {
        let tokens = tokenize_with(source, self.config.tokenizer_options());
        self.parse_tokens(tokens, directives)
    }
}

/// Fragments of a block scanned as text, moved to document lines.
#[derive(Debug)]
struct Nested {
    fragments: TextFragments,
    /// Document line of the first line of the scanned text.
    first_line: usize,
    /// Document line after the last line of the scanned text.
    last_line: usize,
}

impl Iterator for Nested {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        let fragment = self.fragments.next()?;
        let start = (fragment.start_line + self.first_line).min(self.last_line);
        let end = (fragment.end_line + self.first_line).min(self.last_line);
        Some(fragment.with_lines(start, end))
    }
}

/// Lazy fragment sequence of a markdown document.
#[derive(Debug)]
pub struct MarkdownFragments {
    tokens: Vec<Token>,
    pos: usize,
    pattern: Arc<DirectivePattern>,
    embedded: Arc<DirectivePattern>,
    comments: Arc<DirectivePattern>,
    external_files: Option<PathBuf>,
    nested: Option<Nested>,
}

impl MarkdownFragments {
    /// Text scan of the unmatched token at `index`, if it has one.
    fn rescan(&self, index: usize) -> Option<Nested> {
        let token = &self.tokens[index];
        let (start, end) = token.map?;

        if token.kind.is_code() {
            let first_line = start + usize::from(token.kind == TokenKind::Fence);
            return Some(Nested {
                fragments: TextFragments::new(Arc::clone(&self.embedded), &token.content),
                first_line,
                last_line: first_line + token.content.lines().count(),
            });
        }

        if token.kind == TokenKind::HtmlBlock {
            let html = token.content.trim_end();
            let inner = html.strip_prefix("<!--")?.strip_suffix("-->")?;
            return Some(Nested {
                fragments: TextFragments::new(Arc::clone(&self.comments), inner),
                first_line: start,
                last_line: end,
            });
        }

        None
    }
}

impl Iterator for MarkdownFragments {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        loop {
            if let Some(nested) = &mut self.nested {
                if let Some(fragment) = nested.next() {
                    return Some(fragment);
                }
                self.nested = None;
            }

            if self.pos >= self.tokens.len() {
                return None;
            }

            let context = MatchContext {
                pattern: &self.pattern,
                external_files: self.external_files.as_deref(),
            };
            let matched = RULES.iter().find_map(|rule| {
                rule.try_match(&self.tokens, self.pos, &context)
                    .map(|(fragment, consumed)| (rule.name, fragment, consumed))
            });

            if let Some((rule, fragment, consumed)) = matched {
                tracing::trace!(rule, line = fragment.start_line + 1, "Matched directive");
                self.pos += consumed.max(1);
                return Some(fragment);
            }

            self.nested = self.rescan(self.pos);
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::HandlerError;

    fn names(names: &[&str]) -> Directives<(), ()> {
        let mut directives = Directives::new();
        for name in names {
            directives.insert(
                *name,
                |_: Fragment, _: &mut (), _: &mut ()| -> Result<(), HandlerError> { Ok(()) },
            );
        }
        directives
    }

    fn parse(source: &str) -> Vec<Fragment> {
        parse_with(MarkdownExtractor::new(), source)
    }

    fn parse_with(mut extractor: MarkdownExtractor, source: &str) -> Vec<Fragment> {
        extractor
            .parse_fragments(source, &names(&["a", "copy", "embed"]))
            .unwrap()
            .collect()
    }

    #[test]
    fn test_plain_markdown_yields_nothing() {
        let source = "# Title\n\nSome `code` and @a mention.\n\n```\nplain\n```\n";
        assert!(parse(source).is_empty());
    }

    #[test]
    fn test_code_block_shape_does_not_absorb_later_image() {
        let source = "`@a x`\n\n```\nbody\n```\n\n![](icon.png)\n";
        let fragments = parse(source);

        assert_eq!(
            fragments,
            vec![Fragment::new("a", None, "x").with_lines(0, 5).with_content("body\n")]
        );
    }

    #[test]
    fn test_image_after_code_block_match_is_free() {
        let source = "`@a x`\n\n```\nbody\n```\n\n`@copy`\n\n![](icon.png)\n";
        let fragments = parse(source);

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].directive, "copy");
        assert_eq!(fragments[1].url.as_deref(), Some("icon.png"));
        assert_eq!((fragments[1].start_line, fragments[1].end_line), (6, 9));
    }

    #[test]
    fn test_details_wrapper_wins_over_bare_code_span() {
        let source = "`@a x`\n\n<details>\n\n```\nbody\n```\n\n</details>\n";
        let fragments = parse(source);

        assert_eq!(
            fragments,
            vec![Fragment::new("a", None, "x").with_lines(0, 9).with_content("body\n")]
        );

        let source = "`@copy`\n\n<details>\n\n![](icon.png)\n\n</details>\n";
        let fragments = parse(source);

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].url.as_deref(), Some("icon.png"));
        assert_eq!(fragments[0].content, None);
    }

    #[test]
    fn test_bare_code_span_falls_back_to_fence_scan() {
        let source = "`@a`\n\ntext\n\n```py\n# @embed lib.py\nprint(1)\n```\n";
        let fragments = parse(source);

        assert_eq!(
            fragments,
            vec![
                Fragment::new("a", None, "").with_lines(0, 1),
                Fragment::new("embed", None, "lib.py")
                    .with_lines(5, 7)
                    .with_content("print(1)\n"),
            ]
        );
    }

    #[test]
    fn test_embedded_directives_in_fence() {
        let source = "Intro\n\n```js\n// @embed a.js\nlet a;\n// @embed(min) b.js\nlet b;\n```\n";
        let fragments = parse(source);

        assert_eq!(
            fragments,
            vec![
                Fragment::new("embed", None, "a.js")
                    .with_lines(3, 5)
                    .with_content("let a;"),
                Fragment::new("embed", Some("min"), "b.js")
                    .with_lines(5, 7)
                    .with_content("let b;\n"),
            ]
        );
    }

    #[test]
    fn test_embedded_directives_in_indented_block() {
        let source = "Intro\n\n    # @embed x\n    body\n";
        let fragments = parse(source);

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].arguments, ["x"]);
        assert_eq!(fragments[0].as_text(), "body\n");
        assert_eq!((fragments[0].start_line, fragments[0].end_line), (2, 4));
    }

    #[test]
    fn test_consumed_code_block_is_not_rescanned() {
        let source = "`@a`\n\n```\n# @embed x\n```\n";
        let fragments = parse(source);

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].directive, "a");
        assert_eq!(fragments[0].as_text(), "# @embed x\n");
    }

    #[test]
    fn test_multiline_comment() {
        let source = "Intro\n\n<!--\n@a one\nbody\n@copy two\n-->\n";
        let fragments = parse(source);

        assert_eq!(
            fragments,
            vec![
                Fragment::new("a", None, "one").with_lines(3, 5).with_content("body"),
                Fragment::new("copy", None, "two")
                    .with_lines(5, 7)
                    .with_content(""),
            ]
        );
    }

    #[test]
    fn test_link_reference_with_external_files() {
        let extractor = MarkdownExtractor::with_config(
            ExtractorConfig::default().with_external_files("/base"),
        );
        let fragments = parse_with(extractor, "[`@copy a.txt`](path/to/file.png)\n");

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].arguments, ["a.txt"]);
        assert_eq!(fragments[0].path(), Some(Path::new("/base/path/to/file.png")));
        assert_eq!(fragments[0].url, None);
    }

    #[test]
    fn test_external_files_can_change_between_calls() {
        let mut extractor = MarkdownExtractor::new();
        let directives = names(&["copy"]);
        let source = "`@copy`\n\n![](a.png)\n";

        let first: Vec<_> = extractor.parse_fragments(source, &directives).unwrap().collect();
        assert_eq!(first[0].url.as_deref(), Some("a.png"));

        extractor.config_mut().external_files = Some(PathBuf::from("/files"));
        assert_eq!(extractor.config().external_files.as_deref(), Some(Path::new("/files")));
        let second: Vec<_> = extractor.parse_fragments(source, &directives).unwrap().collect();
        assert_eq!(second[0].path(), Some(Path::new("/files/a.png")));
    }

    #[test]
    fn test_data_url_image_stays_url() {
        let extractor = MarkdownExtractor::with_config(
            ExtractorConfig::default().with_external_files("/base"),
        );
        let source = "`@copy`\n\n![](data:text/plain;base64,aGk/aGk=)\n";
        let fragments = parse_with(extractor, source);

        assert_eq!(fragments[0].url.as_deref(), Some("data:text/plain;base64,aGk/aGk="));
        assert_eq!(fragments[0].path, None);
    }

    #[test]
    fn test_directives_in_tight_list_items() {
        let source = "- `@a one`\n- `@a two`\n";
        let arguments: Vec<_> = parse(source).into_iter().map(|f| f.arguments).collect();
        assert_eq!(arguments, [["one"], ["two"]]);
    }

    #[test]
    fn test_comment_shapes() {
        let source = "<!-- @a x -->\n\n```\nbody\n```\n\n<!-- @copy -->\n";
        let fragments = parse(source);

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].as_text(), "body\n");
        assert_eq!((fragments[0].start_line, fragments[0].end_line), (0, 5));
        assert_eq!(fragments[1], Fragment::new("copy", None, "").with_lines(6, 7));
    }

    #[test]
    fn test_same_names_share_patterns_across_calls() {
        let mut extractor = MarkdownExtractor::new();
        let first = extractor.pattern(&names(&["a"])).unwrap();

        let other = Directives::<Vec<String>, Vec<String>>::new().with(
            "a",
            |f: Fragment, out: &mut Vec<String>, _: &mut Vec<String>| -> Result<(), HandlerError> {
                out.push(f.directive);
                Ok(())
            },
        );
        let (out, _) = extractor.extract("`@a`\n", &other).unwrap();
        assert_eq!(out, ["a"]);

        let second = extractor.pattern(&other).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_split_markdown() {
        let source = "# Title\n\n`@a x`\n\n```\nbody\n```\n\nOutro\n";
        let chunks: Vec<_> = MarkdownExtractor::new()
            .split(source, &names(&["a"]))
            .unwrap()
            .map(|(chunk, fragment)| (chunk, fragment.is_some()))
            .collect();

        assert_eq!(
            chunks,
            vec![
                ("# Title\n\n".to_owned(), false),
                ("`@a x`\n\n```\nbody\n```\n".to_owned(), true),
                ("\nOutro\n".to_owned(), false),
            ]
        );
    }
}
