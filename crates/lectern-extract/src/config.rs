//! Markdown extractor configuration.

use std::path::{Path, PathBuf};

use lectern_tokens::TokenizerOptions;

/// Configuration for [`MarkdownExtractor`](crate::MarkdownExtractor).
///
/// With the `serde` feature the configuration can be embedded in a host's
/// own configuration file; missing keys keep their defaults.
///
/// ```toml
/// external_files = "assets"
/// gfm = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractorConfig {
    /// Base directory that relative link and image references resolve
    /// against. Without it every reference is reported as a url.
    pub external_files: Option<PathBuf>,
    /// Recognize GitHub flavored markdown extensions (tables, task lists,
    /// strikethrough).
    pub gfm: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            external_files: None,
            gfm: true,
        }
    }
}

impl ExtractorConfig {
    /// Set the base directory for relative references.
    #[must_use]
    pub fn with_external_files(mut self, dir: impl Into<PathBuf>) -> Self {
        self.external_files = Some(dir.into());
        self
    }

    /// Enable or disable GitHub flavored markdown extensions.
    #[must_use]
    pub fn with_gfm(mut self, gfm: bool) -> Self {
        self.gfm = gfm;
        self
    }

    /// The base directory for relative references.
    #[must_use]
    pub fn external_files(&self) -> Option<&Path> {
        self.external_files.as_deref()
    }

    pub(crate) fn tokenizer_options(&self) -> TokenizerOptions {
        TokenizerOptions::default().with_gfm(self.gfm)
    }
}
