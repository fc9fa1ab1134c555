//! Errors raised when setting up terrain streaming.

use nebula_lod::LodError;

/// Construction-time configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamingError {
    /// The spatial index rejected its geometric settings.
    #[error(transparent)]
    Lod(#[from] LodError),
    /// A count setting was zero.
    #[error("invalid streaming setting `{name}`: {value} (must be > 0)")]
    InvalidSetting {
        /// Name of the offending setting.
        name: &'static str,
        /// The rejected value.
        value: usize,
    },
}
