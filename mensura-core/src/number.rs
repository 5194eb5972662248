//! Numeric input parsing and the result rounding policy

use thiserror::Error;

/// Decimal places kept in every conversion result
pub const RESULT_DECIMALS: u32 = 4;

/// Error type for numeric input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("value is empty")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is not a finite number")]
    NotFinite(String),
}

/// Parse user-supplied text into a finite number
///
/// Surrounding whitespace is ignored. `NaN`, `inf` and anything that
/// overflows to infinity are rejected.
pub fn parse_input(raw: &str) -> Result<f64, InputError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(InputError::Empty);
    }
    let n: f64 = s.parse().map_err(|_| InputError::NotANumber(s.to_string()))?;
    if !n.is_finite() {
        return Err(InputError::NotFinite(s.to_string()));
    }
    Ok(n)
}

/// Round up to `places` decimals using true mathematical ceiling
///
/// Negative values move toward zero: `-2.00001` becomes `-2.0`.
/// A result of negative zero is returned as `0.0`. Values too large to
/// scale are already whole numbers and come back unchanged.
pub fn ceil_to_places(x: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    let scaled = x * scale;
    if !scaled.is_finite() {
        return x;
    }
    let rounded = scaled.ceil() / scale;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Apply the result rounding policy (ceiling at four decimals)
pub fn round_result(x: f64) -> f64 {
    ceil_to_places(x, RESULT_DECIMALS)
}
