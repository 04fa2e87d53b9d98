use thiserror::Error;

/// Errors reported by the color-assignment engine.
///
/// A failing call never returns a partial result.
#[derive(Debug, Error)]
pub enum Error {
    /// A numeric parameter is out of range or contradicts another one.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The constrained color space cannot supply that many distinct
    /// colors.
    #[error("insufficient colors: {requested} requested but only \
             {available} available")]
    InsufficientColors { requested: usize, available: usize },
    /// Group labels or feature vectors do not have the expected length.
    #[error("dimension mismatch: {what} has length {found}, \
             expected {expected}")]
    DimensionMismatch { what: &'static str, expected: usize, found: usize },
    /// The L*a*b* color has no sRGB equivalent.
    #[error("color L*={l:.2} a*={a:.2} b*={b:.2} is out of the sRGB gamut")]
    OutOfGamut { l: f64, a: f64, b: f64 },
    /// The JSON options could not be parsed.
    #[error("invalid options: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
