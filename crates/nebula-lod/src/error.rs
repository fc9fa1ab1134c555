//! LOD configuration errors.

/// Errors raised when constructing the spatial LOD index.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LodError {
    /// A numeric setting was zero, negative, or not finite.
    #[error("invalid LOD setting `{name}`: {value} (must be finite and > 0)")]
    InvalidSetting {
        /// Name of the offending setting.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}
