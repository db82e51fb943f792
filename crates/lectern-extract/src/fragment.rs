//! Fragment model.
//!
//! A [`Fragment`] is one recognized directive occurrence: the directive name,
//! its modifier and arguments, and whatever the surrounding document attached
//! to it (a body of text, or a reference to a url or a local file).

use std::path::{Path, PathBuf};

/// Where a fragment's attached reference points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    /// Reference kept as written (after percent-decoding).
    Url(String),
    /// Local reference resolved against the external files directory.
    Path(PathBuf),
}

/// A recognized directive occurrence.
///
/// `url` and `path` are never both set; [`Fragment::with_reference`] is the
/// only way extractors attach either of them.
///
/// # Example
///
/// ```
/// use lectern_extract::Fragment;
///
/// let fragment = Fragment::new("copy", None, "  a.txt   b.txt ");
/// assert_eq!(fragment.arguments, ["a.txt", "b.txt"]);
/// assert_eq!(fragment.argument(1), Some("b.txt"));
/// assert_eq!(fragment.as_text(), "");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    /// First source line of the occurrence (zero-based).
    pub start_line: usize,
    /// Line after the last source line of the occurrence.
    pub end_line: usize,
    /// Directive name, without the leading `@`.
    pub directive: String,
    /// Text between the parentheses following the name.
    pub modifier: Option<String>,
    /// Whitespace-separated arguments following the name.
    pub arguments: Vec<String>,
    /// Body attached to the directive.
    pub content: Option<String>,
    /// Attached reference that is not a local path.
    pub url: Option<String>,
    /// Attached reference resolved to a local path.
    pub path: Option<PathBuf>,
}

impl Fragment {
    /// Create a fragment from the raw directive parts.
    ///
    /// `arguments` is the raw argument text; it is split on whitespace.
    #[must_use]
    pub fn new(directive: impl Into<String>, modifier: Option<&str>, arguments: &str) -> Self {
        Self {
            directive: directive.into(),
            modifier: modifier.map(str::to_owned),
            arguments: arguments.split_whitespace().map(str::to_owned).collect(),
            ..Self::default()
        }
    }

    /// Set the source line span.
    #[must_use]
    pub fn with_lines(mut self, start_line: usize, end_line: usize) -> Self {
        self.start_line = start_line;
        self.end_line = end_line;
        self
    }

    /// Attach a body.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Attach a reference, replacing any previous url or path.
    #[must_use]
    pub fn with_reference(mut self, reference: Reference) -> Self {
        match reference {
            Reference::Url(url) => {
                self.url = Some(url);
                self.path = None;
            }
            Reference::Path(path) => {
                self.path = Some(path);
                self.url = None;
            }
        }
        self
    }

    /// The attached reference, if any.
    #[must_use]
    pub fn reference(&self) -> Option<Reference> {
        match (&self.url, &self.path) {
            (Some(url), _) => Some(Reference::Url(url.clone())),
            (None, Some(path)) => Some(Reference::Path(path.clone())),
            (None, None) => None,
        }
    }

    /// The attached local path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The attached body, or an empty string.
    #[must_use]
    pub fn as_text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// The attached body as bytes, or an empty slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.as_text().as_bytes()
    }

    /// The argument at `index`.
    #[must_use]
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(String::as_str)
    }

    /// The argument at `index`, or an error naming it.
    ///
    /// Meant for handlers that take positional arguments.
    pub fn require_argument(&self, index: usize, name: &str) -> Result<&str, FragmentError> {
        self.argument(index)
            .ok_or_else(|| FragmentError::MissingArgument {
                directive: self.directive.clone(),
                name: name.to_owned(),
                line: self.start_line + 1,
            })
    }
}

/// Invalid fragment for a handler.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FragmentError {
    /// A required positional argument is missing.
    #[error("line {line}: @{directive} is missing argument `{name}`")]
    MissingArgument {
        /// Directive name.
        directive: String,
        /// Name of the missing argument.
        name: String,
        /// Source line of the directive (1-indexed).
        line: usize,
    },
}
