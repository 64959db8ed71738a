//!
//! Unified error type of the crate.
//!
use thiserror::Error;

/// Errors surfaced to the caller by model construction and decoding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HmmError {
    /// `add_transition` referenced a state that is not in the sub-model.
    #[error("unknown state: {name}")]
    UnknownState { name: String },

    /// A decoder was invoked before `bake`.
    #[error("model is not baked")]
    NotBaked,

    /// A decoder received a zero-length sequence.
    #[error("empty sequence")]
    EmptySequence,

    /// `subseq_viterbi` could not find the boundary states of a repeat unit.
    #[error("unknown repeat unit: {unit_id}")]
    UnknownUnit { unit_id: String },
}

/// Type alias for Results using HmmError
pub type Result<T> = std::result::Result<T, HmmError>;
