//! Flat markdown token stream for Lectern.
//!
//! Lectern recognizes directives in markdown by matching *shapes* of block
//! tokens (a paragraph holding a single code span followed by a fenced code
//! block, an HTML comment followed by an image paragraph, ...). This crate
//! provides the token model those matchers work on:
//!
//! - [`Token`] / [`TokenKind`]: block tokens in document order, with explicit
//!   open/close pairs, and inline content wrapped in [`TokenKind::Inline`]
//!   tokens whose children are the inline tokens.
//! - [`tokenize`]: builds the token sequence from markdown source using
//!   pulldown-cmark, attaching source line maps to block tokens.
//!
//! Any other tokenizer producing the same taxonomy can feed the extractors
//! directly.

mod lines;
mod token;
mod tokenize;

pub use token::{Container, Mark, Token, TokenKind};
pub use tokenize::{TokenizerOptions, tokenize, tokenize_with};
