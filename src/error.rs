use thiserror::Error;

/// Errors produced by the profiling engine.
///
/// Classification misses are deliberately absent: a read without an entry in
/// the annotation maps falls into the "ALL" bucket rather than failing.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Invalid window/overlap/length combination. Fatal before any dispatch.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The external alignment search failed or returned a malformed record.
    /// Fatal to the owning sequence: a silently skipped window would leave a
    /// gap in the profile.
    #[error("alignment search failed: {0}")]
    Adapter(String),

    /// A count array did not match the length it was declared with.
    /// Indicates an internal invariant violation, never bad user input.
    #[error("profile length mismatch: expected {expected}, got {actual}")]
    Encoding { expected: usize, actual: usize },
}

impl ProfileError {
    pub fn config(msg: impl Into<String>) -> Self {
        ProfileError::Config(msg.into())
    }

    pub fn adapter(msg: impl Into<String>) -> Self {
        ProfileError::Adapter(msg.into())
    }
}
