use crate::errors::{EngineError, EngineResult};

/// Trading days per year used to annualize daily return volatility.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Minimum closes: two returns are needed for a sample standard deviation.
const MIN_CLOSES: usize = 3;

/// Annualized historical volatility from a series of daily closes.
///
/// sigma = stdev(c[i] / c[i-1] - 1) * sqrt(252)
///
/// Uses the sample (n - 1) variance of simple returns. The result is a decimal
/// (0.25 = 25%) and can be fed straight into `OptionParameters`.
pub fn historical_volatility(closes: &[f64]) -> EngineResult<f64> {
    if closes.len() < MIN_CLOSES {
        return Err(EngineError::InvalidParameter(format!(
            "need at least {MIN_CLOSES} closes for historical volatility, got {}",
            closes.len()
        )));
    }
    if let Some(bad) = closes.iter().find(|c| !c.is_finite() || **c <= 0.0) {
        return Err(EngineError::InvalidParameter(format!(
            "closes must be positive and finite, got {bad}"
        )));
    }

    let n = (closes.len() - 1) as f64;
    let returns = closes.windows(2).map(|w| w[1] / w[0] - 1.0);

    let mean = returns.clone().sum::<f64>() / n;
    let var = returns.map(|r| (r - mean) * (r - mean)).sum::<f64>() / (n - 1.0);

    Ok(var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_series_has_zero_vol() {
        let vol = historical_volatility(&[100.0, 100.0, 100.0, 100.0]).unwrap();
        assert_eq!(vol, 0.0);
    }

    #[test]
    fn test_alternating_returns() {
        // Returns +1%, -1%, +1%, -1% (approximately) → stdev ≈ 1.15%
        let closes = [100.0, 101.0, 99.99, 100.9899, 99.980001];
        let vol = historical_volatility(&closes).unwrap();
        let expected = 0.011547 * 252.0_f64.sqrt();
        assert!((vol - expected).abs() < 1e-3, "vol={vol} expected={expected}");
    }

    #[test]
    fn test_too_few_closes() {
        assert!(historical_volatility(&[100.0, 101.0]).is_err());
    }

    #[test]
    fn test_non_positive_close_rejected() {
        assert!(historical_volatility(&[100.0, 0.0, 101.0]).is_err());
        assert!(historical_volatility(&[100.0, f64::NAN, 101.0]).is_err());
    }
}
