use thiserror::Error;

pub type Result<T, E = FieldError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// Two grids of different sizes were combined.
    #[error("dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidConstruction { width: usize, height: usize },

    #[error("step size must be positive and finite, got {step_size}")]
    InvalidStepSize { step_size: f64 },

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}
