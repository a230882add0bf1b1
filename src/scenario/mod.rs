pub mod metrics;
pub mod pnl;
pub mod surface;
pub mod sweep;

use crate::errors::{EngineError, EngineResult};

/// Shares represented by one standard equity option contract.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Long,
    Short,
}

impl Position {
    /// +1 for long, -1 for short.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

pub(crate) fn ensure_contracts(contracts: u32) -> EngineResult<f64> {
    if contracts == 0 {
        return Err(EngineError::InvalidParameter(
            "contracts must be a positive integer".into(),
        ));
    }
    Ok(contracts as f64)
}

/// Every hypothetical underlying price must be finite and non-negative.
pub(crate) fn ensure_price_axis(prices: &[f64]) -> EngineResult<()> {
    if prices.is_empty() {
        return Err(EngineError::InvalidParameter("price axis is empty".into()));
    }
    if let Some(bad) = prices.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(EngineError::InvalidParameter(format!(
            "prices must be non-negative and finite, got {bad}"
        )));
    }
    Ok(())
}
