// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Typed failures raised by this crate. Public functions return
// anyhow::Result, so callers that care about the exact failure
// can `downcast_ref::<RteError>()`.

use thiserror::Error;

/// Errors that can occur while configuring the model or building batches.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RteError {
    /// A configuration option is missing, out of range, or inconsistent.
    #[error("Invalid configuration: {option}: {message}")]
    InvalidConfig {
        /// Name of the offending option (e.g. `HIDDEN_DIM`)
        option: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// The vocabulary has no index for this character.
    #[error("Unknown character {0:?}")]
    UnknownCharacter(char),

    /// The label is not a key of `CLASSES_2_IX`.
    #[error("Unknown label '{0}'")]
    UnknownLabel(String),

    /// A premise or hypothesis has no characters at all.
    #[error("Empty {side} sentence at batch row {row}")]
    EmptySentence {
        /// "premise" or "hypothesis"
        side: &'static str,
        /// Row of the offending example inside the batch
        row: usize,
    },

    /// A batch was requested for zero examples.
    #[error("Cannot build a batch from zero examples")]
    EmptyBatch,

    /// Inputs and labels differ in length.
    #[error("Length mismatch: {inputs} inputs but {labels} labels")]
    LengthMismatch {
        /// Number of sentence pairs
        inputs: usize,
        /// Number of labels
        labels: usize,
    },
}

impl RteError {
    /// Create an InvalidConfig error.
    pub fn invalid_config(option: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            option,
            message: message.into(),
        }
    }
}
