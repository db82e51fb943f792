//! Directive pattern compilation and caching.
//!
//! The directive grammar is matched line by line:
//!
//! ```text
//! @<name>[(<modifier>)] [<argument> ...]
//! ```
//!
//! where `<name>` is one of the directive names currently registered. The
//! set of names is only known at extraction time, so the pattern is compiled
//! on demand and memoized per extractor in a [`PatternCache`].

use std::borrow::Cow;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::sync::Arc;

use regex::{Captures, Regex};

use crate::Fragment;

/// Line prefix required in front of the directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flavor {
    /// The directive starts the line: `@name args`.
    Plain,
    /// The directive follows a line comment marker: `// @name args`,
    /// `  # @name args`.
    Embedded,
}

impl Flavor {
    fn prefix(self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::Embedded => r"[ \t]*(?://|#)[ \t]*",
        }
    }
}

/// Compiled patterns for one set of directive names.
#[derive(Debug)]
pub struct DirectivePattern {
    directive: Regex,
    escaped: Regex,
}

impl DirectivePattern {
    /// Compile the patterns for `names`.
    ///
    /// An empty name set compiles to patterns that never match.
    pub fn compile(names: &BTreeSet<String>, flavor: Flavor) -> Result<Self, regex::Error> {
        let alternatives = if names.is_empty() {
            r"\b\B".to_owned()
        } else {
            // Leftmost alternative wins, so `copy-file` must come before `copy`.
            let mut sorted: Vec<&String> = names.iter().collect();
            sorted.sort_by_key(|name| Reverse(name.len()));
            sorted
                .into_iter()
                .map(|name| regex::escape(name))
                .collect::<Vec<_>>()
                .join("|")
        };
        let prefix = flavor.prefix();

        let modifier = r"(?:\((?P<modifier>[^)\n]*)\)|\b)";
        let directive = Regex::new(&format!(
            r"(?m)^{prefix}@(?P<name>{alternatives}){modifier}(?P<arguments>.*)$"
        ))?;
        let escaped = Regex::new(&format!(
            r"(?m)^{prefix}(?P<escaped>@@+(?:{alternatives})\b.*)$"
        ))?;

        Ok(Self { directive, escaped })
    }

    /// The line-anchored directive regex.
    ///
    /// Capture groups: `name`, `modifier` (optional) and `arguments`.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.directive
    }

    /// Match `text` as a single directive, rejecting partial matches.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use lectern_extract::{DirectivePattern, Flavor};
    ///
    /// let names = BTreeSet::from(["copy".to_owned()]);
    /// let pattern = DirectivePattern::compile(&names, Flavor::Plain).unwrap();
    ///
    /// let fragment = pattern.match_whole("@copy(raw) a.txt").unwrap();
    /// assert_eq!(fragment.modifier.as_deref(), Some("raw"));
    /// assert_eq!(fragment.arguments, ["a.txt"]);
    ///
    /// assert!(pattern.match_whole("see @copy a.txt").is_none());
    /// ```
    #[must_use]
    pub fn match_whole(&self, text: &str) -> Option<Fragment> {
        let captures = self.directive.captures(text)?;
        let whole = captures.get(0)?;
        if whole.start() != 0 || whole.end() != text.len() {
            return None;
        }
        Some(fragment_from(&captures))
    }

    /// Remove one `@` from every escaped directive line in `body`.
    ///
    /// `@@name` becomes `@name`; the line prefix is left untouched.
    pub(crate) fn unescape<'b>(&self, body: &'b str) -> Cow<'b, str> {
        self.escaped.replace_all(body, |captures: &Captures<'_>| {
            let whole = &captures[0];
            let escaped = &captures["escaped"];
            let prefix = &whole[..whole.len() - escaped.len()];
            format!("{prefix}{}", escaped.replacen("@@", "@", 1))
        })
    }
}

/// Build a fragment from a directive match.
pub(crate) fn fragment_from(captures: &Captures<'_>) -> Fragment {
    let name = captures.name("name").map_or("", |m| m.as_str());
    let modifier = captures.name("modifier").map(|m| m.as_str());
    let arguments = captures.name("arguments").map_or("", |m| m.as_str());
    Fragment::new(name, modifier, arguments)
}

/// Memoized [`DirectivePattern`] keyed by the set of directive names.
///
/// The pattern is recompiled only when the set of names differs from the one
/// used for the previous compilation. Handler identity plays no part in the
/// key, so two mappings with the same names share the compiled pattern.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lectern_extract::{Flavor, PatternCache};
///
/// let mut cache = PatternCache::new(Flavor::Plain);
/// let first = cache.get(["a", "b"]).unwrap();
/// let second = cache.get(["b", "a"]).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
///
/// let third = cache.get(["a"]).unwrap();
/// assert!(!Arc::ptr_eq(&first, &third));
/// ```
#[derive(Debug)]
pub struct PatternCache {
    flavor: Flavor,
    cached: Option<(BTreeSet<String>, Arc<DirectivePattern>)>,
}

impl PatternCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(flavor: Flavor) -> Self {
        Self {
            flavor,
            cached: None,
        }
    }

    /// The line prefix flavor this cache compiles for.
    #[must_use]
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Return the pattern for `names`, compiling it if the name set changed.
    pub fn get<'n>(
        &mut self,
        names: impl IntoIterator<Item = &'n str>,
    ) -> Result<Arc<DirectivePattern>, regex::Error> {
        let names: BTreeSet<String> = names.into_iter().map(str::to_owned).collect();

        if let Some((key, pattern)) = &self.cached {
            if *key == names {
                return Ok(Arc::clone(pattern));
            }
        }

        tracing::debug!(names = ?names, flavor = ?self.flavor, "Compiling directive pattern");
        let pattern = Arc::new(DirectivePattern::compile(&names, self.flavor)?);
        self.cached = Some((names, Arc::clone(&pattern)));
        Ok(pattern)
    }
}
