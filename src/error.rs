//! Crate-wide error type.

use thiserror::Error;

/// Crate-wide result alias for fitting operations.
pub type FitResult<T> = Result<T, FitError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    // ---- Configuration ----
    /// A config field is out of its domain (zero budget, negative rate, ...).
    #[error("invalid config `{field}` = {value}: {reason}")]
    InvalidConfig {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    // ---- Series shape ----
    /// Rolling window is zero or longer than the series it slides over.
    #[error("window of length {window} does not fit a series of length {len}")]
    Window { window: usize, len: usize },

    /// A penalty was asked to aggregate over an empty set of window lengths.
    #[error("no window lengths supplied")]
    NoWindows,

    /// Series too short for the requested difference order.
    #[error("series of length {len} is too short (need {need})")]
    SeriesTooShort { len: usize, need: usize },

    /// Two series that must line up have different lengths.
    #[error("series length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    // ---- Numerics ----
    /// An intermediate that must be finite was not (e.g. zero variance ratio).
    #[error("non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    // ---- Parameter set ----
    /// Gradient layout differs from the parameter layout it should update.
    #[error("parameter `{name}` has {expected} values but received {found} gradients")]
    GradientShape {
        name: String,
        expected: usize,
        found: usize,
    },

    /// Gradient list length differs from the number of parameters.
    #[error("expected gradients for {expected} parameters, found {found}")]
    ParamCount { expected: usize, found: usize },

    /// Parameter names must be unique within a set.
    #[error("duplicate parameter `{0}`")]
    DuplicateParam(String),

    /// Lookup of a parameter that is not in the set.
    #[error("unknown parameter `{0}`")]
    UnknownParam(String),
}
