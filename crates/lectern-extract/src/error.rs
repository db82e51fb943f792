//! Error types for extraction and dispatch.

/// Error returned by a directive handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Error from extracting or dispatching fragments.
///
/// Unmatched text is never an error: it is simply not a fragment.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// A fragment names a directive missing from the handler mapping.
    #[error("unknown directive @{name}")]
    UnknownDirective {
        /// Directive name as written in the source.
        name: String,
    },

    /// The directive pattern could not be compiled.
    #[error("invalid directive pattern")]
    Pattern(#[from] regex::Error),

    /// A handler failed; display and source are the handler's own.
    #[error(transparent)]
    Handler(HandlerError),
}
