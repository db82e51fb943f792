//! The [`Extractor`] trait and document splitting.

use crate::directive::{Directives, FragmentLoader, apply_directives};
use crate::{ExtractError, Fragment};

/// Front end turning a document into fragments.
///
/// Implementors only provide [`parse_fragments`](Extractor::parse_fragments);
/// dispatch and splitting are shared.
pub trait Extractor {
    /// Lazy sequence of fragments for one document.
    type Fragments: Iterator<Item = Fragment>;

    /// Recognize the directives of `directives` in `source`.
    ///
    /// Only the directive names are looked at. The pattern for the name set
    /// is compiled on first use and reused while the name set stays the same.
    fn parse_fragments<A, D>(
        &mut self,
        source: &str,
        directives: &Directives<A, D>,
    ) -> Result<Self::Fragments, ExtractError>;

    /// Extract `source` into a fresh pair of outputs.
    fn extract<A: Default, D: Default>(
        &mut self,
        source: &str,
        directives: &Directives<A, D>,
    ) -> Result<(A, D), ExtractError> {
        self.extract_with_loaders(source, directives, &[])
    }

    /// Extract `source`, passing every fragment through `loaders` first.
    fn extract_with_loaders<A: Default, D: Default>(
        &mut self,
        source: &str,
        directives: &Directives<A, D>,
        loaders: &[&dyn FragmentLoader<A, D>],
    ) -> Result<(A, D), ExtractError> {
        let fragments = self.parse_fragments(source, directives)?;
        apply_directives(directives, fragments, loaders)
    }

    /// Cut `source` into chunks of lines.
    ///
    /// Each fragment yields the lines it spans together with the fragment;
    /// the lines in between yield with `None`. Concatenating the chunks of a
    /// document whose fragments do not overlap gives back the document.
    fn split<'s, A, D>(
        &mut self,
        source: &'s str,
        directives: &Directives<A, D>,
    ) -> Result<Split<'s, Self::Fragments>, ExtractError> {
        let fragments = self.parse_fragments(source, directives)?;
        Ok(Split::new(source, fragments))
    }
}

/// Iterator returned by [`Extractor::split`].
#[derive(Debug)]
pub struct Split<'s, I> {
    lines: Vec<&'s str>,
    fragments: I,
    pending: Option<Fragment>,
    line: usize,
}

impl<'s, I: Iterator<Item = Fragment>> Split<'s, I> {
    fn new(source: &'s str, fragments: I) -> Self {
        Self {
            lines: source.split_inclusive('\n').collect(),
            fragments,
            pending: None,
            line: 0,
        }
    }

    fn chunk(&self, start: usize, end: usize) -> String {
        let end = end.min(self.lines.len());
        let start = start.min(end);
        self.lines[start..end].concat()
    }
}

impl<I: Iterator<Item = Fragment>> Iterator for Split<'_, I> {
    type Item = (String, Option<Fragment>);

    fn next(&mut self) -> Option<Self::Item> {
        let fragment = match self.pending.take() {
            Some(fragment) => fragment,
            None => match self.fragments.next() {
                Some(fragment) => fragment,
                None => {
                    if self.line >= self.lines.len() {
                        return None;
                    }
                    let rest = self.chunk(self.line, self.lines.len());
                    self.line = self.lines.len();
                    return Some((rest, None));
                }
            },
        };

        if fragment.start_line > self.line {
            let gap = self.chunk(self.line, fragment.start_line);
            self.line = fragment.start_line;
            self.pending = Some(fragment);
            return Some((gap, None));
        }

        let chunk = self.chunk(fragment.start_line, fragment.end_line);
        self.line = fragment.end_line;
        Some((chunk, Some(fragment)))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn split(source: &str, fragments: Vec<Fragment>) -> Vec<(String, Option<String>)> {
        Split::new(source, fragments.into_iter())
            .map(|(chunk, fragment)| (chunk, fragment.map(|f| f.directive)))
            .collect()
    }

    fn at(name: &str, start: usize, end: usize) -> Fragment {
        Fragment::new(name, None, "").with_lines(start, end)
    }

    #[test]
    fn test_split_interleaves_gaps() {
        let source = "intro\n@a\nbody\nmiddle\n@b\ntail\n";
        let chunks = split(source, vec![at("a", 1, 3), at("b", 4, 5)]);

        assert_eq!(
            chunks,
            vec![
                ("intro\n".to_owned(), None),
                ("@a\nbody\n".to_owned(), Some("a".to_owned())),
                ("middle\n".to_owned(), None),
                ("@b\n".to_owned(), Some("b".to_owned())),
                ("tail\n".to_owned(), None),
            ]
        );
        let joined: String = chunks.into_iter().map(|(chunk, _)| chunk).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_split_without_fragments() {
        assert_eq!(split("a\nb", vec![]), vec![("a\nb".to_owned(), None)]);
        assert!(split("", vec![]).is_empty());
    }

    #[test]
    fn test_split_clamps_past_end() {
        let chunks = split("@a\nbody", vec![at("a", 0, 3)]);
        assert_eq!(chunks, vec![("@a\nbody".to_owned(), Some("a".to_owned()))]);
    }
}
