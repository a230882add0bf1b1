pub mod black_scholes;
pub mod implied_vol;
pub mod volatility;

use crate::errors::{ensure_finite, ensure_non_negative, ensure_positive, EngineResult};

/// Days per year used for both `T = days / 365` and the per-day theta.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// All pricing models implement this trait.
/// Every method must be a pure function of its inputs.
/// Send + Sync required for use across tokio tasks and rayon workers.
pub trait PricingModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Option premium per share.
    fn price(&self, params: &OptionParameters, side: OptionSide) -> f64;

    fn greeks(&self, params: &OptionParameters, side: OptionSide) -> Greeks;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSide {
    Call,
    Put,
}

impl std::fmt::Display for OptionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

impl OptionSide {
    /// Payoff of exercising immediately: `max(0, S - K)` or `max(0, K - S)`.
    #[inline]
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
        }
    }
}

/// Market inputs to the valuation engine, validated once at construction.
///
/// Units: `time_to_expiry` in years, `rate` and `volatility` as decimals.
/// The log-moneyness and `σ√T` terms every formula needs are precomputed here
/// so the engine never re-evaluates them per Greek.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct OptionParameters {
    pub spot: f64,
    pub strike: f64,
    pub time_to_expiry: f64,
    pub rate: f64,
    pub volatility: f64,
    // Precomputed
    #[serde(skip)]
    pub ln_s_k: f64,
    #[serde(skip)]
    pub sqrt_t: f64,
    #[serde(skip)]
    pub sigma_sqrt_t: f64,
}

impl OptionParameters {
    /// Rejects `S <= 0`, `K <= 0`, `T < 0`, `σ <= 0` and non-finite values.
    /// `T == 0` is accepted and routed to the expiry branch by the engine.
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        volatility: f64,
    ) -> EngineResult<Self> {
        ensure_positive(spot, "spot")?;
        ensure_positive(strike, "strike")?;
        ensure_non_negative(time_to_expiry, "time to expiry")?;
        ensure_finite(rate, "risk-free rate")?;
        ensure_positive(volatility, "volatility")?;

        let sqrt_t = time_to_expiry.sqrt();
        Ok(Self {
            spot,
            strike,
            time_to_expiry,
            rate,
            volatility,
            ln_s_k: (spot / strike).ln(),
            sqrt_t,
            sigma_sqrt_t: volatility * sqrt_t,
        })
    }

    /// Same as [`OptionParameters::new`] with `T = days / 365`.
    pub fn from_days(
        spot: f64,
        strike: f64,
        days_to_expiry: f64,
        rate: f64,
        volatility: f64,
    ) -> EngineResult<Self> {
        ensure_non_negative(days_to_expiry, "days to expiry")?;
        Self::new(spot, strike, days_to_expiry / DAYS_PER_YEAR, rate, volatility)
    }

    pub fn with_spot(&self, spot: f64) -> EngineResult<Self> {
        Self::new(spot, self.strike, self.time_to_expiry, self.rate, self.volatility)
    }

    pub fn with_volatility(&self, volatility: f64) -> EngineResult<Self> {
        Self::new(self.spot, self.strike, self.time_to_expiry, self.rate, volatility)
    }

    /// True at expiry, where `σ√T` is zero and the closed form is undefined.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.time_to_expiry == 0.0
    }

    /// Present value of the strike, `K·e^(−rT)`.
    #[inline]
    pub fn discounted_strike(&self) -> f64 {
        self.strike * (-self.rate * self.time_to_expiry).exp()
    }
}

/// Sensitivities in display units: theta per calendar day, vega and rho per
/// one percentage point of volatility / rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

impl Greeks {
    pub fn get(&self, kind: GreekKind) -> f64 {
        match kind {
            GreekKind::Delta => self.delta,
            GreekKind::Gamma => self.gamma,
            GreekKind::Theta => self.theta,
            GreekKind::Vega => self.vega,
            GreekKind::Rho => self.rho,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.delta.is_finite()
            && self.gamma.is_finite()
            && self.theta.is_finite()
            && self.vega.is_finite()
            && self.rho.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreekKind {
    Delta,
    Gamma,
    Theta,
    Vega,
    Rho,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precomputed_terms() {
        let p = OptionParameters::new(100.0, 105.0, 0.25, 0.05, 0.2).unwrap();
        assert!((p.ln_s_k - (100.0_f64 / 105.0).ln()).abs() < 1e-15);
        assert!((p.sqrt_t - 0.5).abs() < 1e-15);
        assert!((p.sigma_sqrt_t - 0.1).abs() < 1e-15);
    }

    #[test]
    fn test_domain_violations_rejected() {
        assert!(OptionParameters::new(0.0, 100.0, 0.1, 0.05, 0.2).is_err());
        assert!(OptionParameters::new(100.0, -5.0, 0.1, 0.05, 0.2).is_err());
        assert!(OptionParameters::new(100.0, 100.0, -0.1, 0.05, 0.2).is_err());
        assert!(OptionParameters::new(100.0, 100.0, 0.1, 0.05, 0.0).is_err());
        assert!(OptionParameters::new(100.0, 100.0, 0.1, f64::NAN, 0.2).is_err());
    }

    #[test]
    fn test_zero_expiry_accepted() {
        let p = OptionParameters::new(110.0, 100.0, 0.0, 0.05, 0.2).unwrap();
        assert!(p.is_expired());
        assert_eq!(p.sigma_sqrt_t, 0.0);
    }

    #[test]
    fn test_negative_rate_accepted() {
        assert!(OptionParameters::new(100.0, 100.0, 0.5, -0.01, 0.2).is_ok());
    }

    #[test]
    fn test_from_days() {
        let p = OptionParameters::from_days(100.0, 100.0, 30.0, 0.05, 0.2).unwrap();
        assert!((p.time_to_expiry - 30.0 / 365.0).abs() < 1e-15);
    }

    #[test]
    fn test_intrinsic() {
        assert_eq!(OptionSide::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionSide::Call.intrinsic(90.0, 100.0), 0.0);
        assert_eq!(OptionSide::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionSide::Put.intrinsic(110.0, 100.0), 0.0);
    }
}
