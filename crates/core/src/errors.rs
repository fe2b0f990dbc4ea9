//! Error types for the TeamJoin core library.
//!
//! Each subsystem has its own error type derived with `thiserror`. Unresolved
//! project-team references are deliberately *not* represented here: they are
//! recovered locally into per-project error lists and the global report so a
//! single bad reference never aborts a join pass.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Identity index errors
// ---------------------------------------------------------------------------

/// Errors from the identity index subsystem.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A structured reference supplied none of the recognized identifying
    /// fields (`id`, `email`, `github`, `deprecated_name`). This indicates a
    /// data-authoring bug upstream and aborts the current join operation.
    #[error("malformed team member reference: {0}")]
    MalformedReference(String),
}

// ---------------------------------------------------------------------------
// Join errors
// ---------------------------------------------------------------------------

/// Errors from the data joining subsystem.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error(transparent)]
    Index(#[from] IndexError),

    /// A snippet author could not be resolved while running in internal
    /// mode. Public mode drops the entry silently instead; internal views
    /// must never hide broken attribution.
    #[error("unknown snippet username: {0}")]
    UnknownSnippetUsername(String),
}
