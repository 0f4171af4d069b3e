use thiserror::Error;

/// Errors that abort an evaluation pass.
///
/// None of these are recoverable for the current run: the pass that hit one
/// produces no outputs at all.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnisoError {
    /// A required potential parameter has neither an explicit value nor a default
    /// for a type pair present in the system.
    #[error("missing parameter `{field}` for type pair {pair}")]
    MissingParameter { field: String, pair: String },

    /// No `r_cut` was set (and no default given) for a type pair present in the system.
    #[error("missing r_cut for type pair {pair}")]
    MissingCutoff { pair: String },

    /// Unknown shift mode, out-of-domain parameter, or a type that was never declared.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type AnisoResult<T> = Result<T, AnisoError>;
