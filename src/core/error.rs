use crate::core::currency::RateError;
use thiserror::Error;

/// Failures surfaced by the pricing and risk engine.
///
/// The engine never retries or corrects its inputs. Zero volatility and zero
/// effective maturity are not errors: pricing takes the discounted intrinsic
/// value branch instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed or out-of-domain input.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A historical series is too short to estimate volatility.
    #[error("insufficient data: need at least {required} observations, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// A default risk-free rate could not be resolved.
    #[error(transparent)]
    Rate(#[from] RateError),
}

impl EngineError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// True for input-domain failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Reject NaN and infinities before any domain check runs.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, EngineError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::validation(field, format!("must be finite, got {value}")))
    }
}

/// Require a finite, strictly positive value.
pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<f64, EngineError> {
    ensure_finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(EngineError::validation(field, format!("must be positive, got {value}")))
    }
}
