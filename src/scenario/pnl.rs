//! Profit/loss sweeps across a hypothetical underlying-price axis.
//! All functions are pure: the only state shared across points is the
//! premium, computed once up front.

use super::{ensure_contracts, ensure_price_axis, Position, CONTRACT_MULTIPLIER};
use crate::errors::{ensure_positive, EngineError, EngineResult};
use crate::models::black_scholes::BlackScholes;
use crate::models::{OptionParameters, OptionSide, PricingModel, DAYS_PER_YEAR};
use crate::scenario::metrics::ProfitBound;
use smallvec::SmallVec;

/// Per-share curves (strategies, strike and expiry comparisons): P&L beyond
/// this magnitude is reported as unlimited.
pub const PER_SHARE_UNLIMITED: f64 = 1_000.0;

/// Position curves scaled by contracts × 100.
pub const POSITION_UNLIMITED: f64 = 10_000.0;

/// |P&L| below this counts as a breakeven sample when classifying strategies.
const BREAKEVEN_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PnLPoint {
    pub price: f64,
    pub pnl: f64,
}

/// Ordered (underlying price, signed P&L) pairs, in input order.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct PnLCurve {
    pub points: Vec<PnLPoint>,
}

impl PnLCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.pnl)
    }

    /// Largest P&L on the curve (0.0 for an empty curve).
    pub fn max_profit(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.values().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest P&L on the curve (0.0 for an empty curve).
    pub fn max_loss(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.values().fold(f64::INFINITY, f64::min)
    }

    /// Underlying prices where the curve crosses zero, linearly interpolated
    /// between adjacent samples. Points sitting exactly on zero are included.
    pub fn breakeven_points(&self) -> Vec<f64> {
        let mut out = Vec::new();
        for (i, p) in self.points.iter().enumerate() {
            if p.pnl == 0.0 {
                out.push(p.price);
                continue;
            }
            if let Some(next) = self.points.get(i + 1) {
                if next.pnl != 0.0 && p.pnl.signum() != next.pnl.signum() {
                    let w = p.pnl / (p.pnl - next.pnl);
                    out.push(p.price + w * (next.price - p.price));
                }
            }
        }
        out
    }

    /// The same curve seen from the other side of the trade.
    pub fn negated(mut self) -> Self {
        for p in &mut self.points {
            p.pnl = -p.pnl;
        }
        self
    }

    /// `unlimited_at` is the magnitude past which an extreme is reported as
    /// [`ProfitBound::Unlimited`]; it must match the curve's scale.
    pub fn summary(&self, unlimited_at: f64) -> PnLSummary {
        let max_profit = self.max_profit();
        let max_loss = self.max_loss();
        let near_zero = self.values().filter(|v| v.abs() < BREAKEVEN_TOLERANCE).count();
        PnLSummary {
            max_profit: if max_profit < unlimited_at {
                ProfitBound::Bounded(max_profit)
            } else {
                ProfitBound::Unlimited
            },
            max_loss: if max_loss > -unlimited_at {
                ProfitBound::Bounded(max_loss)
            } else {
                ProfitBound::Unlimited
            },
            breakevens: if near_zero > 2 {
                BreakevenCount::Multiple
            } else {
                BreakevenCount::Single
            },
            breakeven_points: self.breakeven_points(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakevenCount {
    Single,
    Multiple,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PnLSummary {
    pub max_profit: ProfitBound,
    pub max_loss: ProfitBound,
    pub breakevens: BreakevenCount,
    pub breakeven_points: Vec<f64>,
}

/// P&L at expiry for `contracts` contracts bought at the model price of
/// `params`, evaluated at each terminal price in `prices`.
///
/// pnl(S_t) = payoff(S_t, K) · n · 100 − price · n · 100
pub fn pnl_at_expiry(
    model: &BlackScholes,
    params: &OptionParameters,
    side: OptionSide,
    contracts: u32,
    position: Position,
    prices: &[f64],
) -> EngineResult<PnLCurve> {
    let n = ensure_contracts(contracts)?;
    ensure_price_axis(prices)?;

    let premium = model.price(params, side) * n * CONTRACT_MULTIPLIER;
    let curve = expiry_curve(prices, premium, |s| {
        side.intrinsic(s, params.strike) * n * CONTRACT_MULTIPLIER
    });

    Ok(match position {
        Position::Long => curve,
        Position::Short => curve.negated(),
    })
}

fn expiry_curve(prices: &[f64], premium: f64, payoff: impl Fn(f64) -> f64) -> PnLCurve {
    PnLCurve {
        points: prices
            .iter()
            .map(|&price| PnLPoint {
                price,
                pnl: payoff(price) - premium,
            })
            .collect(),
    }
}

/// Per-share expiry P&L for several strikes. Each premium is priced with the
/// first price on the axis as spot.
pub fn multi_strike_pnl(
    model: &BlackScholes,
    prices: &[f64],
    strikes: &[f64],
    time_to_expiry: f64,
    rate: f64,
    volatility: f64,
    side: OptionSide,
) -> EngineResult<Vec<(f64, PnLCurve)>> {
    ensure_price_axis(prices)?;
    if strikes.is_empty() {
        return Err(EngineError::InvalidParameter("no strikes given".into()));
    }
    let spot = ensure_positive(prices[0], "first price on the axis")?;

    strikes
        .iter()
        .map(|&strike| {
            let params = OptionParameters::new(spot, strike, time_to_expiry, rate, volatility)?;
            let premium = model.price(&params, side);
            Ok((strike, expiry_curve(prices, premium, |s| side.intrinsic(s, strike))))
        })
        .collect()
}

/// Per-share expiry P&L for several expiries, each premium priced at `spot`.
#[allow(clippy::too_many_arguments)]
pub fn multi_expiry_pnl(
    model: &BlackScholes,
    spot: f64,
    strike: f64,
    days_to_expiry: &[u32],
    rate: f64,
    volatility: f64,
    side: OptionSide,
    prices: &[f64],
) -> EngineResult<Vec<(u32, PnLCurve)>> {
    ensure_price_axis(prices)?;
    if days_to_expiry.is_empty() {
        return Err(EngineError::InvalidParameter("no expiries given".into()));
    }

    days_to_expiry
        .iter()
        .map(|&days| {
            let t = days as f64 / DAYS_PER_YEAR;
            let params = OptionParameters::new(spot, strike, t, rate, volatility)?;
            let premium = model.price(&params, side);
            Ok((days, expiry_curve(prices, premium, |s| side.intrinsic(s, strike))))
        })
        .collect()
}

/// One long option inside a strategy.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Leg {
    pub side: OptionSide,
    pub strike: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    LongCall { strike: f64 },
    LongPut { strike: f64 },
    LongStraddle { strike: f64 },
}

impl Strategy {
    pub fn name(&self) -> String {
        match self {
            Self::LongCall { strike } => format!("Long Call (${strike})"),
            Self::LongPut { strike } => format!("Long Put (${strike})"),
            Self::LongStraddle { strike } => format!("Long Straddle (${strike})"),
        }
    }

    pub fn legs(&self) -> SmallVec<[Leg; 4]> {
        let mut legs = SmallVec::new();
        match *self {
            Self::LongCall { strike } => legs.push(Leg { side: OptionSide::Call, strike }),
            Self::LongPut { strike } => legs.push(Leg { side: OptionSide::Put, strike }),
            Self::LongStraddle { strike } => {
                legs.push(Leg { side: OptionSide::Call, strike });
                legs.push(Leg { side: OptionSide::Put, strike });
            }
        }
        legs
    }

    /// Per-share P&L at expiry, legs priced at `spot`.
    pub fn pnl_curve(
        &self,
        model: &BlackScholes,
        spot: f64,
        time_to_expiry: f64,
        rate: f64,
        volatility: f64,
        prices: &[f64],
    ) -> EngineResult<PnLCurve> {
        ensure_price_axis(prices)?;
        let legs = self.legs();

        let mut premium = 0.0;
        for leg in &legs {
            let params = OptionParameters::new(spot, leg.strike, time_to_expiry, rate, volatility)?;
            premium += model.price(&params, leg.side);
        }

        Ok(expiry_curve(prices, premium, |s| {
            legs.iter().map(|leg| leg.side.intrinsic(s, leg.strike)).sum()
        }))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StrategyComparison {
    pub name: String,
    pub curve: PnLCurve,
    pub summary: PnLSummary,
}

/// Side-by-side expiry P&L for several strategies on one price axis.
pub fn compare_strategies(
    model: &BlackScholes,
    strategies: &[Strategy],
    spot: f64,
    time_to_expiry: f64,
    rate: f64,
    volatility: f64,
    prices: &[f64],
) -> EngineResult<Vec<StrategyComparison>> {
    strategies
        .iter()
        .map(|strategy| {
            let curve = strategy.pnl_curve(model, spot, time_to_expiry, rate, volatility, prices)?;
            let summary = curve.summary(PER_SHARE_UNLIMITED);
            Ok(StrategyComparison {
                name: strategy.name(),
                curve,
                summary,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const T30: f64 = 30.0 / 365.0;

    fn params() -> OptionParameters {
        OptionParameters::new(100.0, 105.0, T30, 0.05, 0.2).unwrap()
    }

    #[test]
    fn test_pnl_matches_payoff_minus_premium() {
        let bs = BlackScholes::new();
        let prices = [90.0, 95.0, 100.0, 105.0, 110.0, 115.0];
        let curve =
            pnl_at_expiry(&bs, &params(), OptionSide::Call, 1, Position::Long, &prices).unwrap();
        assert_eq!(curve.len(), prices.len());

        let premium = bs.call_price(&params()) * 100.0;
        for (point, &s) in curve.points.iter().zip(&prices) {
            assert_eq!(point.price, s);
            let expected = (s - 105.0_f64).max(0.0) * 100.0 - premium;
            assert!((point.pnl - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn test_pnl_at_strike_is_minus_premium() {
        let bs = BlackScholes::new();
        for contracts in [1, 2, 7] {
            let curve = pnl_at_expiry(
                &bs,
                &params(),
                OptionSide::Call,
                contracts,
                Position::Long,
                &[105.0],
            )
            .unwrap();
            let premium = bs.call_price(&params()) * contracts as f64 * 100.0;
            assert_relative_eq!(curve.points[0].pnl, -premium, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_put_pnl_order_preserved() {
        let bs = BlackScholes::new();
        let prices = [120.0, 80.0, 105.0];
        let curve =
            pnl_at_expiry(&bs, &params(), OptionSide::Put, 1, Position::Long, &prices).unwrap();
        let premium = bs.put_price(&params()) * 100.0;
        assert_relative_eq!(curve.points[0].pnl, -premium, epsilon = 1e-9);
        assert_relative_eq!(curve.points[1].pnl, 2500.0 - premium, epsilon = 1e-9);
        assert_relative_eq!(curve.points[2].pnl, -premium, epsilon = 1e-9);
    }

    #[test]
    fn test_short_is_mirror_of_long() {
        let bs = BlackScholes::new();
        let prices = [90.0, 105.0, 120.0];
        let long =
            pnl_at_expiry(&bs, &params(), OptionSide::Call, 1, Position::Long, &prices).unwrap();
        let short =
            pnl_at_expiry(&bs, &params(), OptionSide::Call, 1, Position::Short, &prices).unwrap();
        for (l, s) in long.points.iter().zip(&short.points) {
            assert_eq!(l.pnl, -s.pnl);
        }
    }

    #[test]
    fn test_sweep_is_restartable() {
        let bs = BlackScholes::new();
        let prices = [95.0, 110.0];
        let a = pnl_at_expiry(&bs, &params(), OptionSide::Call, 4, Position::Long, &prices).unwrap();
        let b = pnl_at_expiry(&bs, &params(), OptionSide::Call, 4, Position::Long, &prices).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_inputs() {
        let bs = BlackScholes::new();
        assert!(pnl_at_expiry(&bs, &params(), OptionSide::Call, 0, Position::Long, &[100.0]).is_err());
        assert!(pnl_at_expiry(&bs, &params(), OptionSide::Call, 1, Position::Long, &[]).is_err());
        assert!(
            pnl_at_expiry(&bs, &params(), OptionSide::Call, 1, Position::Long, &[f64::NAN]).is_err()
        );
    }

    #[test]
    fn test_curve_summaries() {
        let curve = PnLCurve {
            points: vec![
                PnLPoint { price: 90.0, pnl: -200.0 },
                PnLPoint { price: 100.0, pnl: -200.0 },
                PnLPoint { price: 110.0, pnl: 300.0 },
            ],
        };
        assert_eq!(curve.max_profit(), 300.0);
        assert_eq!(curve.max_loss(), -200.0);
        let be = curve.breakeven_points();
        assert_eq!(be.len(), 1);
        assert_relative_eq!(be[0], 104.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_curve_summaries() {
        let curve = PnLCurve::default();
        assert_eq!(curve.max_profit(), 0.0);
        assert_eq!(curve.max_loss(), 0.0);
        assert!(curve.breakeven_points().is_empty());
    }

    #[test]
    fn test_multi_strike_uses_first_price_as_spot() {
        let bs = BlackScholes::new();
        let prices = [95.0, 100.0, 110.0];
        let curves =
            multi_strike_pnl(&bs, &prices, &[100.0, 105.0], T30, 0.05, 0.2, OptionSide::Call)
                .unwrap();
        assert_eq!(curves.len(), 2);

        let p = OptionParameters::new(95.0, 100.0, T30, 0.05, 0.2).unwrap();
        let premium = bs.call_price(&p);
        assert_eq!(curves[0].0, 100.0);
        assert_relative_eq!(curves[0].1.points[2].pnl, 10.0 - premium, epsilon = 1e-12);
    }

    #[test]
    fn test_multi_expiry_longer_costs_more() {
        let bs = BlackScholes::new();
        let prices = [100.0];
        let curves = multi_expiry_pnl(
            &bs,
            100.0,
            100.0,
            &[7, 30, 90],
            0.05,
            0.2,
            OptionSide::Call,
            &prices,
        )
        .unwrap();
        let losses: Vec<f64> = curves.iter().map(|(_, c)| c.points[0].pnl).collect();
        assert!(losses[0] > losses[1] && losses[1] > losses[2], "{losses:?}");
    }

    #[test]
    fn test_straddle_profits_on_both_tails() {
        let bs = BlackScholes::new();
        let straddle = Strategy::LongStraddle { strike: 100.0 };
        assert_eq!(straddle.legs().len(), 2);

        let prices = [70.0, 100.0, 130.0];
        let curve = straddle.pnl_curve(&bs, 100.0, T30, 0.05, 0.2, &prices).unwrap();
        assert!(curve.points[0].pnl > 0.0);
        assert!(curve.points[1].pnl < 0.0);
        assert!(curve.points[2].pnl > 0.0);
        assert_eq!(curve.breakeven_points().len(), 2);
    }

    #[test]
    fn test_compare_strategies() {
        let bs = BlackScholes::new();
        let prices: Vec<f64> = (0..=60).map(|i| 70.0 + i as f64).collect();
        let result = compare_strategies(
            &bs,
            &[
                Strategy::LongCall { strike: 100.0 },
                Strategy::LongPut { strike: 100.0 },
                Strategy::LongStraddle { strike: 100.0 },
            ],
            100.0,
            T30,
            0.05,
            0.2,
            &prices,
        )
        .unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].name, "Long Call ($100)");
        for r in &result {
            assert!(matches!(r.summary.max_profit, ProfitBound::Bounded(v) if v > 0.0));
            assert!(matches!(r.summary.max_loss, ProfitBound::Bounded(v) if v < 0.0));
        }
    }

    #[test]
    fn test_summary_flags_unlimited() {
        let curve = PnLCurve {
            points: vec![
                PnLPoint { price: 0.0, pnl: -5000.0 },
                PnLPoint { price: 500.0, pnl: 5000.0 },
            ],
        };
        let s = curve.summary(PER_SHARE_UNLIMITED);
        assert_eq!(s.max_profit, ProfitBound::Unlimited);
        assert_eq!(s.max_loss, ProfitBound::Unlimited);
        assert_eq!(s.breakevens, BreakevenCount::Single);
    }

    #[test]
    fn test_position_summary_uses_dollar_threshold() {
        // One long put at S=K=100 over 70..130: best case is about $2,790.
        let bs = BlackScholes::new();
        let params = OptionParameters::new(100.0, 100.0, T30, 0.05, 0.2).unwrap();
        let prices: Vec<f64> = (0..100).map(|i| 70.0 + 60.0 * i as f64 / 99.0).collect();
        let curve =
            pnl_at_expiry(&bs, &params, OptionSide::Put, 1, Position::Long, &prices).unwrap();

        let best = curve.max_profit();
        assert!(best > PER_SHARE_UNLIMITED && best < POSITION_UNLIMITED, "best={best}");

        let summary = curve.summary(POSITION_UNLIMITED);
        assert_eq!(summary.max_profit, ProfitBound::Bounded(best));
        assert!(matches!(summary.max_loss, ProfitBound::Bounded(v) if v < 0.0));

        // The same dollar curve judged on the per-share scale would overstate it.
        assert_eq!(curve.summary(PER_SHARE_UNLIMITED).max_profit, ProfitBound::Unlimited);
    }
}
