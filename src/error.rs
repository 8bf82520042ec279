use crate::enums::PixelKind;

use thiserror::Error;

/// Error type returned by decoding collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("No slices supplied")]
    EmptyInput,

    #[error("Slice '{id}' has (rows, columns) {found:?}, expected {expected:?}")]
    DimensionMismatch {
        id: String,
        /// (rows, columns)
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Slice '{id}' has an empty pixel grid")]
    EmptySlice { id: String },

    #[error("Slice '{id}' holds {found} samples, expected {expected}")]
    SampleCountMismatch {
        id: String,
        expected: usize,
        found: usize,
    },

    #[error("Slice '{id}' has {found} samples but the volume is {expected}")]
    PixelKindMismatch {
        id: String,
        expected: PixelKind,
        found: PixelKind,
    },

    #[error("Failed to decode slice '{id}': {source}")]
    DecodeFailure {
        id: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid volume shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
