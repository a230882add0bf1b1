use crate::errors::{ensure_finite, ensure_positive, EngineError, EngineResult};
use crate::models::black_scholes::BlackScholes;
use crate::models::{Greeks, OptionParameters, OptionSide};

/// Hard ceiling on generated axis length.
pub const MAX_LINSPACE_POINTS: usize = 100_000;

/// `n` evenly spaced values from `lo` to `hi`, both ends included.
pub fn linspace(lo: f64, hi: f64, n: usize) -> EngineResult<Vec<f64>> {
    ensure_finite(lo, "range start")?;
    ensure_finite(hi, "range end")?;
    if n > MAX_LINSPACE_POINTS {
        return Err(EngineError::InvalidParameter(format!(
            "{n} points requested, limit is {MAX_LINSPACE_POINTS}"
        )));
    }
    match n {
        0 => Err(EngineError::InvalidParameter("linspace needs at least one point".into())),
        1 => Ok(vec![lo]),
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| lo + step * i as f64).collect();
            // Pin the endpoint so rounding never leaves it short.
            out[n - 1] = hi;
            Ok(out)
        }
    }
}

/// Price axis around the spot, e.g. `spot_range(100.0, 0.7, 1.3, 50)`.
pub fn spot_range(spot: f64, lower: f64, upper: f64, n: usize) -> EngineResult<Vec<f64>> {
    ensure_positive(spot, "spot")?;
    ensure_positive(lower, "lower bound multiple")?;
    if upper < lower {
        return Err(EngineError::InvalidParameter(format!(
            "upper bound multiple {upper} is below lower bound {lower}"
        )));
    }
    linspace(spot * lower, spot * upper, n)
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ProfilePoint {
    pub spot: f64,
    pub price: f64,
    pub greeks: Greeks,
}

/// Price and Greeks at each spot, everything else held at `params`.
pub fn greeks_profile(
    model: &BlackScholes,
    params: &OptionParameters,
    side: OptionSide,
    spots: &[f64],
) -> EngineResult<Vec<ProfilePoint>> {
    spots
        .iter()
        .map(|&spot| {
            let v = model.valuation(&params.with_spot(spot)?, side);
            Ok(ProfilePoint {
                spot,
                price: v.price,
                greeks: v.greeks,
            })
        })
        .collect()
}
