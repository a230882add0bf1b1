use super::{ensure_contracts, Position, CONTRACT_MULTIPLIER};
use crate::errors::{ensure_positive, EngineResult};
use crate::models::black_scholes::BlackScholes;
use crate::models::{Greeks, OptionParameters, OptionSide};

/// Band around S/K = 1 treated as at-the-money.
const ATM_BAND: f64 = 0.02;

/// Everything the pricing screen shows for one position.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct OptionMetrics {
    pub side: OptionSide,
    pub position: Position,
    /// Premium per share.
    pub option_price: f64,
    /// `price × contracts × 100`, negated for short positions (premium received).
    pub total_cost: f64,
    pub breakeven: f64,
    pub greeks: Greeks,
    pub contracts: u32,
    pub max_profit: ProfitBound,
    pub max_loss: ProfitBound,
}

/// A finite dollar amount, or unlimited.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ProfitBound {
    Bounded(f64),
    Unlimited,
}

/// Price, total premium, breakeven and Greeks for `contracts` contracts.
///
/// A short position only flips the sign of `total_cost`; the Greeks are the
/// per-share sensitivities of the option itself.
pub fn option_metrics(
    model: &BlackScholes,
    params: &OptionParameters,
    side: OptionSide,
    contracts: u32,
    position: Position,
) -> EngineResult<OptionMetrics> {
    let n = ensure_contracts(contracts)?;
    let valuation = model.valuation(params, side);
    let premium = valuation.price * n * CONTRACT_MULTIPLIER;

    let breakeven = match side {
        OptionSide::Call => params.strike + valuation.price,
        OptionSide::Put => params.strike - valuation.price,
    };

    let (max_profit, max_loss) = risk_profile(side, position, params.strike, premium, n);

    Ok(OptionMetrics {
        side,
        position,
        option_price: valuation.price,
        total_cost: premium * position.sign(),
        breakeven,
        greeks: valuation.greeks,
        contracts,
        max_profit,
        max_loss,
    })
}

/// Theoretical best/worst outcome at expiry for a single-leg position.
/// `premium` is the unsigned total premium (price × n × 100).
pub fn risk_profile(
    side: OptionSide,
    position: Position,
    strike: f64,
    premium: f64,
    contracts: f64,
) -> (ProfitBound, ProfitBound) {
    // A put pays at most K per share when the underlying goes to zero.
    let put_cap = strike * contracts * CONTRACT_MULTIPLIER;
    match (side, position) {
        (OptionSide::Call, Position::Long) => (ProfitBound::Unlimited, ProfitBound::Bounded(premium)),
        (OptionSide::Call, Position::Short) => (ProfitBound::Bounded(premium), ProfitBound::Unlimited),
        (OptionSide::Put, Position::Long) => (
            ProfitBound::Bounded(put_cap - premium),
            ProfitBound::Bounded(premium),
        ),
        (OptionSide::Put, Position::Short) => (
            ProfitBound::Bounded(premium),
            ProfitBound::Bounded(put_cap - premium),
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum MoneynessClass {
    #[serde(rename = "ITM")]
    InTheMoney,
    #[serde(rename = "ATM")]
    AtTheMoney,
    #[serde(rename = "OTM")]
    OutOfTheMoney,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Moneyness {
    /// S / K
    pub ratio: f64,
    pub class: MoneynessClass,
}

/// Classify S/K with a ±2% at-the-money band. Puts mirror calls.
pub fn moneyness(spot: f64, strike: f64, side: OptionSide) -> EngineResult<Moneyness> {
    ensure_positive(spot, "spot")?;
    ensure_positive(strike, "strike")?;
    let ratio = spot / strike;

    let above = ratio > 1.0 + ATM_BAND;
    let below = ratio < 1.0 - ATM_BAND;
    let class = match (side, above, below) {
        (OptionSide::Call, true, _) | (OptionSide::Put, _, true) => MoneynessClass::InTheMoney,
        (OptionSide::Call, _, true) | (OptionSide::Put, true, _) => MoneynessClass::OutOfTheMoney,
        _ => MoneynessClass::AtTheMoney,
    };

    Ok(Moneyness { ratio, class })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricingModel;

    fn params() -> OptionParameters {
        OptionParameters::new(100.0, 105.0, 30.0 / 365.0, 0.05, 0.2).unwrap()
    }

    #[test]
    fn test_call_metrics() {
        let bs = BlackScholes::new();
        let m = option_metrics(&bs, &params(), OptionSide::Call, 2, Position::Long).unwrap();
        assert_eq!(m.contracts, 2);
        assert_eq!(m.option_price, bs.call_price(&params()));
        assert_eq!(m.total_cost, m.option_price * 2.0 * 100.0);
        assert_eq!(m.breakeven, 105.0 + m.option_price);
        assert!(m.greeks.is_finite());
    }

    #[test]
    fn test_put_breakeven_below_strike() {
        let bs = BlackScholes::new();
        let m = option_metrics(&bs, &params(), OptionSide::Put, 1, Position::Long).unwrap();
        assert_eq!(m.breakeven, 105.0 - m.option_price);
    }

    #[test]
    fn test_short_flips_cost_not_greeks() {
        let bs = BlackScholes::new();
        let long = option_metrics(&bs, &params(), OptionSide::Call, 3, Position::Long).unwrap();
        let short = option_metrics(&bs, &params(), OptionSide::Call, 3, Position::Short).unwrap();
        assert_eq!(short.total_cost, -long.total_cost);
        assert_eq!(short.greeks, long.greeks);
        assert_eq!(short.option_price, long.option_price);
    }

    #[test]
    fn test_zero_contracts_rejected() {
        let bs = BlackScholes::new();
        assert!(option_metrics(&bs, &params(), OptionSide::Call, 0, Position::Long).is_err());
    }

    #[test]
    fn test_greeks_match_model() {
        let bs = BlackScholes::new();
        let m = option_metrics(&bs, &params(), OptionSide::Put, 1, Position::Long).unwrap();
        assert_eq!(m.greeks, bs.greeks(&params(), OptionSide::Put));
    }

    #[test]
    fn test_risk_profile() {
        let (p, l) = risk_profile(OptionSide::Call, Position::Long, 100.0, 250.0, 1.0);
        assert_eq!(p, ProfitBound::Unlimited);
        assert_eq!(l, ProfitBound::Bounded(250.0));

        let (p, l) = risk_profile(OptionSide::Put, Position::Long, 100.0, 250.0, 1.0);
        assert_eq!(p, ProfitBound::Bounded(9_750.0));
        assert_eq!(l, ProfitBound::Bounded(250.0));

        let (p, l) = risk_profile(OptionSide::Call, Position::Short, 100.0, 250.0, 1.0);
        assert_eq!(p, ProfitBound::Bounded(250.0));
        assert_eq!(l, ProfitBound::Unlimited);
    }

    #[test]
    fn test_moneyness_classes() {
        let itm_call = moneyness(110.0, 100.0, OptionSide::Call).unwrap();
        assert_eq!(itm_call.class, MoneynessClass::InTheMoney);
        assert!((itm_call.ratio - 1.1).abs() < 1e-12);

        let otm_put = moneyness(110.0, 100.0, OptionSide::Put).unwrap();
        assert_eq!(otm_put.class, MoneynessClass::OutOfTheMoney);

        let atm = moneyness(101.0, 100.0, OptionSide::Call).unwrap();
        assert_eq!(atm.class, MoneynessClass::AtTheMoney);

        let itm_put = moneyness(90.0, 100.0, OptionSide::Put).unwrap();
        assert_eq!(itm_put.class, MoneynessClass::InTheMoney);

        assert!(moneyness(0.0, 100.0, OptionSide::Call).is_err());
    }
}
