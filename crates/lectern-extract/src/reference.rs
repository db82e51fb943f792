//! Classification of link and image targets.

use std::path::Path;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::Reference;

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

impl Reference {
    /// Classify a raw link or image target.
    ///
    /// A target with a scheme, a network location, a query or a fragment is
    /// a url. Anything else is a local reference: with `external_files` set
    /// it becomes a path under that directory, otherwise it stays a url.
    /// The target is percent-decoded in both cases. Nothing is looked up on
    /// disk.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::{Path, PathBuf};
    /// use lectern_extract::Reference;
    ///
    /// let base = Path::new("/srv/files");
    /// assert_eq!(
    ///     Reference::resolve("img/my%20icon.png", Some(base)),
    ///     Reference::Path(PathBuf::from("/srv/files/img/my icon.png")),
    /// );
    /// assert_eq!(
    ///     Reference::resolve("https://example.com/a.png", Some(base)),
    ///     Reference::Url("https://example.com/a.png".to_owned()),
    /// );
    /// ```
    #[must_use]
    pub fn resolve(raw: &str, external_files: Option<&Path>) -> Self {
        let decoded = percent_decode_str(raw).decode_utf8_lossy().into_owned();

        if is_url(raw) {
            return Self::Url(decoded);
        }
        match external_files {
            Some(base) => Self::Path(base.join(decoded)),
            None => Self::Url(decoded),
        }
    }
}

fn is_url(raw: &str) -> bool {
    SCHEME.is_match(raw) || raw.starts_with("//") || raw.contains(['?', '#'])
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;

    const BASE: &str = "/base";

    fn resolve(raw: &str) -> Reference {
        Reference::resolve(raw, Some(Path::new(BASE)))
    }

    #[test]
    fn test_relative_path_joins_base() {
        assert_eq!(
            resolve("path/to/file.png"),
            Reference::Path(PathBuf::from("/base/path/to/file.png"))
        );
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(
            resolve("a%20b/c%C3%A9.txt"),
            Reference::Path(PathBuf::from("/base/a b/cé.txt"))
        );
        assert_eq!(
            Reference::resolve("a%20b.txt", None),
            Reference::Url("a b.txt".to_owned())
        );
    }

    #[test]
    fn test_schemes_stay_urls() {
        let data = "data:image/png;base64,iVBORw0KGgo/AAAA";
        assert_eq!(resolve(data), Reference::Url(data.to_owned()));
        assert_eq!(
            resolve("https://example.com/x.png"),
            Reference::Url("https://example.com/x.png".to_owned())
        );
        assert_eq!(resolve("mailto:a@b.c"), Reference::Url("mailto:a@b.c".to_owned()));
    }

    #[test]
    fn test_network_query_and_fragment_stay_urls() {
        assert_eq!(
            resolve("//cdn.example.com/a.png"),
            Reference::Url("//cdn.example.com/a.png".to_owned())
        );
        assert_eq!(resolve("a.png?v=2"), Reference::Url("a.png?v=2".to_owned()));
        assert_eq!(resolve("#section"), Reference::Url("#section".to_owned()));
    }

    #[test]
    fn test_without_base_everything_is_url() {
        assert_eq!(
            Reference::resolve("path/to/file.png", None),
            Reference::Url("path/to/file.png".to_owned())
        );
    }

    #[test]
    fn test_absolute_path_replaces_base() {
        assert_eq!(resolve("/etc/x.png"), Reference::Path(PathBuf::from("/etc/x.png")));
    }
}
