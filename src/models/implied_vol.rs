//! Newton-Raphson implied volatility.
//!
//! The solver is best-effort: it always hands back a finite volatility. When it
//! stops without meeting the tolerance (iteration cap, zero vega, or a step that
//! would leave the finite range) the last estimate is returned with
//! `converged == false` instead of an error, because callers chart whatever
//! number comes back.

use crate::errors::{ensure_non_negative, ensure_positive, EngineError, EngineResult};
use crate::models::black_scholes::BlackScholes;
use crate::models::{OptionParameters, OptionSide, PricingModel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpliedVolSolver {
    pub initial_guess: f64,
    /// Absolute price error at which the search stops.
    pub tolerance: f64,
    pub max_iterations: u32,
    /// Replaces any update that would drive σ to zero or below.
    pub vol_floor: f64,
}

impl Default for ImpliedVolSolver {
    fn default() -> Self {
        Self {
            initial_guess: 0.20,
            tolerance: 1e-6,
            max_iterations: 100,
            vol_floor: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ImpliedVol {
    pub sigma: f64,
    /// Newton steps taken before returning.
    pub iterations: u32,
    pub converged: bool,
}

impl ImpliedVolSolver {
    /// Recover σ such that the model price matches `market_price`.
    ///
    /// Errors only on invalid inputs (non-positive spot/strike/expiry,
    /// negative or non-finite market price). Non-convergence is reported via
    /// [`ImpliedVol::converged`].
    #[allow(clippy::too_many_arguments)]
    pub fn solve(
        &self,
        model: &BlackScholes,
        market_price: f64,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        side: OptionSide,
    ) -> EngineResult<ImpliedVol> {
        ensure_non_negative(market_price, "market price")?;
        ensure_positive(time_to_expiry, "time to expiry")?;
        if !(self.vol_floor > 0.0 && self.initial_guess > 0.0) {
            return Err(EngineError::InvalidParameter(
                "solver guess and floor must be positive".into(),
            ));
        }

        // Validates spot/strike/rate once; each step only swaps σ.
        let base = OptionParameters::new(spot, strike, time_to_expiry, rate, self.initial_guess)?;
        let mut vol = self.initial_guess;

        for iteration in 0..self.max_iterations {
            let params = base.with_volatility(vol)?;
            let residual = model.price(&params, side) - market_price;

            if residual.abs() < self.tolerance {
                return Ok(ImpliedVol {
                    sigma: vol,
                    iterations: iteration,
                    converged: true,
                });
            }

            // Undo the per-1% display scaling to get dPrice/dσ.
            let vega = model.vega(&params) * 100.0;
            if vega == 0.0 {
                tracing::debug!(sigma = vol, iteration, "vega vanished, returning estimate");
                return Ok(ImpliedVol {
                    sigma: vol,
                    iterations: iteration,
                    converged: false,
                });
            }

            let mut next = vol - residual / vega;
            if next.is_nan() || next == f64::INFINITY {
                tracing::debug!(sigma = vol, iteration, "newton step diverged, returning estimate");
                return Ok(ImpliedVol {
                    sigma: vol,
                    iterations: iteration,
                    converged: false,
                });
            }
            if next <= 0.0 {
                next = self.vol_floor;
            }
            vol = next;
        }

        tracing::debug!(
            sigma = vol,
            iterations = self.max_iterations,
            "implied vol hit iteration cap, returning estimate"
        );
        Ok(ImpliedVol {
            sigma: vol,
            iterations: self.max_iterations,
            converged: false,
        })
    }
}
