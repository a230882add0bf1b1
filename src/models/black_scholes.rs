use crate::models::{Greeks, OptionParameters, OptionSide, PricingModel, DAYS_PER_YEAR};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Greeks are reported per 1% move in vol/rate.
const PERCENT: f64 = 100.0;

/// Closed-form Black-Scholes valuation for European options (no dividends).
///
/// d1 = (ln(S/K) + (r + σ²/2)·T) / (σ·√T)
/// d2 = d1 − σ·√T
///
/// At `T == 0` every method switches to the expiry branch: intrinsic value,
/// a step delta and zero for the remaining Greeks.
pub struct BlackScholes {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

/// Price and Greeks from a single d1/d2 evaluation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Valuation {
    pub price: f64,
    pub greeks: Greeks,
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self::new()
    }
}

impl BlackScholes {
    pub fn new() -> Self {
        Self {
            normal: Normal::standard(),
        }
    }

    /// The two standardized arguments. Undefined at expiry; callers go
    /// through the public methods which branch first.
    #[inline]
    pub fn d1_d2(&self, p: &OptionParameters) -> (f64, f64) {
        let d1 = (p.ln_s_k + (p.rate + 0.5 * p.volatility * p.volatility) * p.time_to_expiry)
            / p.sigma_sqrt_t;
        (d1, d1 - p.sigma_sqrt_t)
    }

    #[inline]
    fn cdf(&self, x: f64) -> f64 {
        self.normal.cdf(x)
    }

    #[inline]
    fn pdf(&self, x: f64) -> f64 {
        self.normal.pdf(x)
    }

    pub fn call_price(&self, p: &OptionParameters) -> f64 {
        self.price(p, OptionSide::Call)
    }

    pub fn put_price(&self, p: &OptionParameters) -> f64 {
        self.price(p, OptionSide::Put)
    }

    /// Call delta in [0, 1]; put delta is exactly `call − 1`.
    pub fn delta(&self, p: &OptionParameters, side: OptionSide) -> f64 {
        let call_delta = if p.is_expired() {
            expiry_call_delta(p)
        } else {
            let (d1, _) = self.d1_d2(p);
            self.cdf(d1)
        };
        match side {
            OptionSide::Call => call_delta,
            OptionSide::Put => call_delta - 1.0,
        }
    }

    /// Same for calls and puts.
    pub fn gamma(&self, p: &OptionParameters) -> f64 {
        if p.is_expired() {
            return 0.0;
        }
        let (d1, _) = self.d1_d2(p);
        self.pdf(d1) / (p.spot * p.sigma_sqrt_t)
    }

    /// Per calendar day.
    pub fn theta(&self, p: &OptionParameters, side: OptionSide) -> f64 {
        if p.is_expired() {
            return 0.0;
        }
        let (d1, d2) = self.d1_d2(p);
        self.theta_from(p, side, d1, d2)
    }

    /// Per one percentage point of volatility. Same for calls and puts.
    pub fn vega(&self, p: &OptionParameters) -> f64 {
        if p.is_expired() {
            return 0.0;
        }
        let (d1, _) = self.d1_d2(p);
        p.spot * self.pdf(d1) * p.sqrt_t / PERCENT
    }

    /// Per one percentage point of the risk-free rate.
    pub fn rho(&self, p: &OptionParameters, side: OptionSide) -> f64 {
        if p.is_expired() {
            return 0.0;
        }
        let (_, d2) = self.d1_d2(p);
        self.rho_from(p, side, d2)
    }

    /// Price and all five Greeks, evaluating d1/d2 and the discount factor once.
    pub fn valuation(&self, p: &OptionParameters, side: OptionSide) -> Valuation {
        if p.is_expired() {
            return Valuation {
                price: side.intrinsic(p.spot, p.strike),
                greeks: Greeks {
                    delta: self.delta(p, side),
                    ..Greeks::default()
                },
            };
        }

        let (d1, d2) = self.d1_d2(p);
        let pdf_d1 = self.pdf(d1);
        let call_delta = self.cdf(d1);

        let greeks = Greeks {
            delta: match side {
                OptionSide::Call => call_delta,
                OptionSide::Put => call_delta - 1.0,
            },
            gamma: pdf_d1 / (p.spot * p.sigma_sqrt_t),
            theta: self.theta_from(p, side, d1, d2),
            vega: p.spot * pdf_d1 * p.sqrt_t / PERCENT,
            rho: self.rho_from(p, side, d2),
        };

        Valuation {
            price: self.price_from(p, side, d1, d2),
            greeks,
        }
    }

    #[inline]
    fn price_from(&self, p: &OptionParameters, side: OptionSide, d1: f64, d2: f64) -> f64 {
        let pv_k = p.discounted_strike();
        match side {
            OptionSide::Call => p.spot * self.cdf(d1) - pv_k * self.cdf(d2),
            OptionSide::Put => pv_k * self.cdf(-d2) - p.spot * self.cdf(-d1),
        }
    }

    #[inline]
    fn theta_from(&self, p: &OptionParameters, side: OptionSide, d1: f64, d2: f64) -> f64 {
        let decay = -(p.spot * self.pdf(d1) * p.volatility) / (2.0 * p.sqrt_t);
        let carry = p.rate * p.discounted_strike();
        let annual = match side {
            OptionSide::Call => decay - carry * self.cdf(d2),
            OptionSide::Put => decay + carry * self.cdf(-d2),
        };
        annual / DAYS_PER_YEAR
    }

    #[inline]
    fn rho_from(&self, p: &OptionParameters, side: OptionSide, d2: f64) -> f64 {
        let kt = p.time_to_expiry * p.discounted_strike();
        match side {
            OptionSide::Call => kt * self.cdf(d2) / PERCENT,
            OptionSide::Put => -kt * self.cdf(-d2) / PERCENT,
        }
    }
}

/// Step delta at expiry: 1 in the money, 0 out, 0.5 exactly at the strike.
#[inline]
fn expiry_call_delta(p: &OptionParameters) -> f64 {
    if p.spot > p.strike {
        1.0
    } else if p.spot < p.strike {
        0.0
    } else {
        0.5
    }
}

impl PricingModel for BlackScholes {
    #[inline]
    fn name(&self) -> &'static str {
        "Black-Scholes"
    }

    fn price(&self, p: &OptionParameters, side: OptionSide) -> f64 {
        if p.is_expired() {
            return side.intrinsic(p.spot, p.strike);
        }
        let (d1, d2) = self.d1_d2(p);
        self.price_from(p, side, d1, d2)
    }

    fn greeks(&self, p: &OptionParameters, side: OptionSide) -> Greeks {
        self.valuation(p, side).greeks
    }
}
