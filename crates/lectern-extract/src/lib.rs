//! Directive extraction for Lectern.
//!
//! Lectern documents carry *directives*: lines such as
//! `@function(tick) demo:tick` whose body, or referenced file, becomes part
//! of a generated pack. This crate recognizes them and hands each one, as a
//! [`Fragment`], to a handler registered under the directive name.
//!
//! Three front ends share the [`Extractor`] trait:
//!
//! - [`TextExtractor`]: directives at the start of a line, each followed by
//!   its body.
//! - [`EmbeddedExtractor`]: the same after a `//` or `#` line comment marker,
//!   for code block bodies.
//! - [`MarkdownExtractor`]: directives in code spans and HTML comments,
//!   attached to the code block or image that follows them.
//!
//! # Example
//!
//! ```
//! use lectern_extract::{Directives, Extractor, Fragment, HandlerError, TextExtractor};
//!
//! #[derive(Default)]
//! struct Pack {
//!     files: Vec<(String, String)>,
//! }
//!
//! let directives = Directives::<Pack, ()>::new().with(
//!     "file",
//!     |fragment: Fragment, pack: &mut Pack, _: &mut ()| -> Result<(), HandlerError> {
//!         let path = fragment.require_argument(0, "path")?;
//!         pack.files.push((path.to_owned(), fragment.as_text().to_owned()));
//!         Ok(())
//!     },
//! );
//!
//! let source = "@file hello.txt\nHello!\n@file bye.txt\nBye!\n";
//! let (pack, ()) = TextExtractor::new().extract(source, &directives).unwrap();
//!
//! assert_eq!(pack.files[0], ("hello.txt".to_owned(), "Hello!".to_owned()));
//! assert_eq!(pack.files[1], ("bye.txt".to_owned(), "Bye!\n".to_owned()));
//! ```

mod config;
mod directive;
mod error;
mod extractor;
mod fragment;
mod markdown;
mod pattern;
mod reference;
mod text;

pub use config::ExtractorConfig;
pub use directive::{Directive, Directives, FragmentLoader, apply_directives, dispatch};
pub use error::{ExtractError, HandlerError};
pub use extractor::{Extractor, Split};
pub use fragment::{Fragment, FragmentError, Reference};
pub use markdown::{MarkdownExtractor, MarkdownFragments};
pub use pattern::{DirectivePattern, Flavor, PatternCache};
pub use text::{EmbeddedExtractor, TextExtractor, TextFragments};
