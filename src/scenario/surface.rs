//! Two-dimensional valuation grids for surface and heatmap charts.
//!
//! Every cell is an independent evaluation of the valuation engine, so rows
//! are filled in parallel with rayon into one preallocated row-major buffer.
//! Output order is always `(row, col)` regardless of scheduling.

use super::Position;
use crate::errors::{EngineError, EngineResult};
use crate::models::black_scholes::BlackScholes;
use crate::models::{GreekKind, OptionParameters, OptionSide, PricingModel};
use rayon::prelude::*;

/// Row-major grid of values with the axis labels that produced them.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Grid {
    /// One label per row (e.g. volatilities, days to expiry).
    pub row_axis: Vec<f64>,
    /// One label per column (underlying prices).
    pub col_axis: Vec<f64>,
    pub values: Vec<f64>,
}

impl Grid {
    pub fn rows(&self) -> usize {
        self.row_axis.len()
    }

    pub fn cols(&self) -> usize {
        self.col_axis.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        self.values.get(row * self.cols() + col).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let cols = self.cols();
        self.values.get(row * cols..(row + 1) * cols)
    }
}

/// Builds grids against one model with a cap on axis length.
pub struct SurfaceBuilder<'a> {
    model: &'a BlackScholes,
    max_resolution: usize,
}

impl<'a> SurfaceBuilder<'a> {
    pub fn new(model: &'a BlackScholes, max_resolution: usize) -> Self {
        Self {
            model,
            max_resolution,
        }
    }

    /// Option price over spots (columns) × volatilities (rows).
    pub fn price_surface(
        &self,
        spots: &[f64],
        vols: &[f64],
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        side: OptionSide,
    ) -> EngineResult<Grid> {
        self.evaluate(vols, spots, |vol, spot| {
            let p = OptionParameters::new(spot, strike, time_to_expiry, rate, vol)?;
            Ok(self.model.price(&p, side))
        })
    }

    /// One Greek over spots (columns) × volatilities (rows).
    #[allow(clippy::too_many_arguments)]
    pub fn greek_surface(
        &self,
        spots: &[f64],
        vols: &[f64],
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        side: OptionSide,
        greek: GreekKind,
    ) -> EngineResult<Grid> {
        self.evaluate(vols, spots, |vol, spot| {
            let p = OptionParameters::new(spot, strike, time_to_expiry, rate, vol)?;
            Ok(self.model.greeks(&p, side).get(greek))
        })
    }

    /// Option price over spots (columns) × days to expiry (rows).
    /// A zero-day row prices at intrinsic value.
    pub fn time_decay_heatmap(
        &self,
        spots: &[f64],
        days_to_expiry: &[f64],
        strike: f64,
        volatility: f64,
        rate: f64,
        side: OptionSide,
    ) -> EngineResult<Grid> {
        self.evaluate(days_to_expiry, spots, |days, spot| {
            let p = OptionParameters::from_days(spot, strike, days, rate, volatility)?;
            Ok(self.model.price(&p, side))
        })
    }

    /// Mark-to-market P&L per share over spots (columns) × days to expiry (rows).
    ///
    /// The entry price is the option at `current_spot` with the longest
    /// expiry on the axis; each cell is `value − entry` (long) or
    /// `entry − value` (short).
    #[allow(clippy::too_many_arguments)]
    pub fn pnl_heatmap(
        &self,
        spots: &[f64],
        days_to_expiry: &[f64],
        current_spot: f64,
        strike: f64,
        volatility: f64,
        rate: f64,
        side: OptionSide,
        position: Position,
    ) -> EngineResult<Grid> {
        let max_days = days_to_expiry
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if !max_days.is_finite() {
            return Err(EngineError::InvalidParameter("days axis is empty".into()));
        }
        let entry = OptionParameters::from_days(current_spot, strike, max_days, rate, volatility)?;
        let entry_price = self.model.price(&entry, side);

        self.evaluate(days_to_expiry, spots, |days, spot| {
            let p = OptionParameters::from_days(spot, strike, days, rate, volatility)?;
            Ok((self.model.price(&p, side) - entry_price) * position.sign())
        })
    }

    fn check_axis(&self, axis: &[f64], name: &str) -> EngineResult<()> {
        if axis.is_empty() {
            return Err(EngineError::InvalidParameter(format!("{name} axis is empty")));
        }
        if axis.len() > self.max_resolution {
            return Err(EngineError::InvalidParameter(format!(
                "{name} axis has {} points, limit is {}",
                axis.len(),
                self.max_resolution
            )));
        }
        Ok(())
    }

    /// Fill `rows × cols` cells with `cell(row_label, col_label)`.
    /// The first failing cell aborts the whole grid.
    fn evaluate<F>(&self, row_axis: &[f64], col_axis: &[f64], cell: F) -> EngineResult<Grid>
    where
        F: Fn(f64, f64) -> EngineResult<f64> + Sync,
    {
        self.check_axis(row_axis, "row")?;
        self.check_axis(col_axis, "column")?;

        let cols = col_axis.len();
        let mut values = vec![0.0; row_axis.len() * cols];

        values
            .par_chunks_mut(cols)
            .zip(row_axis.par_iter())
            .try_for_each(|(row, &y)| -> EngineResult<()> {
                for (slot, &x) in row.iter_mut().zip(col_axis) {
                    *slot = cell(y, x)?;
                }
                Ok(())
            })?;

        tracing::debug!(rows = row_axis.len(), cols, "grid evaluated");

        Ok(Grid {
            row_axis: row_axis.to_vec(),
            col_axis: col_axis.to_vec(),
            values,
        })
    }
}
