/// Domain-specific error types for the pricing service.
/// The pricing and solver layers only ever produce `InvalidParameter`;
/// the remaining variants belong to the I/O edges (config, market data, HTTP).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("market data error: {0}")]
    MarketData(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        EngineError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Parse(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Reject NaN/Inf and anything `<= 0`.
pub fn ensure_positive(value: f64, name: &str) -> EngineResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "{name} must be positive and finite, got {value}"
        )));
    }
    Ok(value)
}

/// Reject NaN/Inf and negatives; zero is allowed.
pub fn ensure_non_negative(value: f64, name: &str) -> EngineResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "{name} must be non-negative and finite, got {value}"
        )));
    }
    Ok(value)
}

pub fn ensure_finite(value: f64, name: &str) -> EngineResult<f64> {
    if !value.is_finite() {
        return Err(EngineError::InvalidParameter(format!(
            "{name} must be finite, got {value}"
        )));
    }
    Ok(value)
}
