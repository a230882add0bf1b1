use crate::errors::{EngineError, EngineResult};
use crate::feeds::market_data::normalize_symbol;
use crate::models::implied_vol::ImpliedVol;
use crate::models::volatility::historical_volatility;
use crate::models::{GreekKind, OptionParameters, OptionSide, DAYS_PER_YEAR};
use crate::scenario::metrics::{moneyness, option_metrics, Moneyness, OptionMetrics};
use crate::scenario::pnl::{
    compare_strategies, multi_expiry_pnl, multi_strike_pnl, pnl_at_expiry, PnLCurve, PnLSummary,
    Strategy, StrategyComparison, PER_SHARE_UNLIMITED, POSITION_UNLIMITED,
};
use crate::scenario::surface::{Grid, SurfaceBuilder};
use crate::scenario::sweep::{greeks_profile, spot_range, ProfilePoint};
use crate::scenario::Position;
use crate::state::{AppState, CounterSnapshot, RequestCounters};
use axum::extract::{Path, State};
use axum::response::Json;
use std::sync::Arc;

/// Generated axes span 70%..130% of spot.
const AXIS_LOWER: f64 = 0.7;
const AXIS_UPPER: f64 = 1.3;
const DEFAULT_AXIS_POINTS: usize = 50;
const MAX_AXIS_POINTS: usize = 1_000;

// ── Request bodies ──

/// Market inputs as the UI sends them: expiry in days, rate and vol as decimals.
#[derive(Debug, serde::Deserialize)]
pub struct OptionInputs {
    pub spot: f64,
    pub strike: f64,
    pub days_to_expiry: f64,
    pub volatility: f64,
    /// Falls back to `RISK_FREE_RATE` when omitted.
    pub rate: Option<f64>,
}

impl OptionInputs {
    fn params(&self, default_rate: f64) -> EngineResult<OptionParameters> {
        OptionParameters::from_days(
            self.spot,
            self.strike,
            self.days_to_expiry,
            self.rate.unwrap_or(default_rate),
            self.volatility,
        )
    }
}

/// Either explicit prices or `points` generated around the spot.
#[derive(Debug, Default, serde::Deserialize)]
pub struct PriceAxis {
    pub prices: Option<Vec<f64>>,
    pub points: Option<usize>,
}

impl PriceAxis {
    /// The length limit is checked before anything is generated.
    fn resolve(self, spot: f64) -> EngineResult<Vec<f64>> {
        let len = match &self.prices {
            Some(prices) => prices.len(),
            None => self.points.unwrap_or(DEFAULT_AXIS_POINTS),
        };
        if len > MAX_AXIS_POINTS {
            return Err(EngineError::InvalidParameter(format!(
                "price axis has {len} points, limit is {MAX_AXIS_POINTS}"
            )));
        }
        match self.prices {
            Some(prices) => Ok(prices),
            None => spot_range(spot, AXIS_LOWER, AXIS_UPPER, len),
        }
    }
}

fn default_contracts() -> u32 {
    1
}

#[derive(Debug, serde::Deserialize)]
pub struct PriceRequest {
    #[serde(flatten)]
    pub inputs: OptionInputs,
    pub side: OptionSide,
    #[serde(default = "default_contracts")]
    pub contracts: u32,
    #[serde(default)]
    pub position: Position,
}

#[derive(Debug, serde::Serialize)]
pub struct PriceResponse {
    #[serde(flatten)]
    pub metrics: OptionMetrics,
    pub moneyness: Moneyness,
}

#[derive(Debug, serde::Deserialize)]
pub struct PnlRequest {
    #[serde(flatten)]
    pub inputs: OptionInputs,
    pub side: OptionSide,
    #[serde(default = "default_contracts")]
    pub contracts: u32,
    #[serde(default)]
    pub position: Position,
    #[serde(flatten)]
    pub axis: PriceAxis,
}

#[derive(Debug, serde::Serialize)]
pub struct PnlResponse {
    pub curve: PnLCurve,
    pub summary: PnLSummary,
}

#[derive(Debug, serde::Deserialize)]
pub struct StrikeComparisonRequest {
    pub spot: f64,
    pub strikes: Vec<f64>,
    pub days_to_expiry: f64,
    pub volatility: f64,
    pub rate: Option<f64>,
    pub side: OptionSide,
    #[serde(flatten)]
    pub axis: PriceAxis,
}

#[derive(Debug, serde::Serialize)]
pub struct StrikeCurve {
    pub strike: f64,
    pub curve: PnLCurve,
    pub summary: PnLSummary,
}

#[derive(Debug, serde::Deserialize)]
pub struct ExpiryComparisonRequest {
    pub spot: f64,
    pub strike: f64,
    pub expiries: Vec<u32>,
    pub volatility: f64,
    pub rate: Option<f64>,
    pub side: OptionSide,
    #[serde(flatten)]
    pub axis: PriceAxis,
}

#[derive(Debug, serde::Serialize)]
pub struct ExpiryCurve {
    pub days_to_expiry: u32,
    pub curve: PnLCurve,
    pub summary: PnLSummary,
}

#[derive(Debug, serde::Deserialize)]
pub struct ProfileRequest {
    #[serde(flatten)]
    pub inputs: OptionInputs,
    pub side: OptionSide,
    #[serde(flatten)]
    pub axis: PriceAxis,
}

#[derive(Debug, serde::Deserialize)]
pub struct ImpliedVolRequest {
    pub market_price: f64,
    pub spot: f64,
    pub strike: f64,
    pub days_to_expiry: f64,
    pub rate: Option<f64>,
    pub side: OptionSide,
}

#[derive(Debug, serde::Deserialize)]
pub struct HistoricalVolRequest {
    pub closes: Vec<f64>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceRequest {
    Price {
        spots: Vec<f64>,
        vols: Vec<f64>,
        strike: f64,
        days_to_expiry: f64,
        rate: Option<f64>,
        side: OptionSide,
    },
    Greek {
        spots: Vec<f64>,
        vols: Vec<f64>,
        strike: f64,
        days_to_expiry: f64,
        rate: Option<f64>,
        side: OptionSide,
        greek: GreekKind,
    },
    TimeDecay {
        spots: Vec<f64>,
        days: Vec<f64>,
        strike: f64,
        volatility: f64,
        rate: Option<f64>,
        side: OptionSide,
    },
    Pnl {
        spots: Vec<f64>,
        days: Vec<f64>,
        current_spot: f64,
        strike: f64,
        volatility: f64,
        rate: Option<f64>,
        side: OptionSide,
        #[serde(default)]
        position: Position,
    },
}

#[derive(Debug, serde::Deserialize)]
pub struct StrategiesRequest {
    pub spot: f64,
    pub strike: f64,
    pub days_to_expiry: f64,
    pub volatility: f64,
    pub rate: Option<f64>,
    /// Defaults to long call, long put and long straddle at `strike`.
    pub strategies: Option<Vec<Strategy>>,
    #[serde(flatten)]
    pub axis: PriceAxis,
}

// ── Handlers ──

/// POST /api/price -- metrics for one position
pub async fn price(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PriceRequest>,
) -> EngineResult<Json<PriceResponse>> {
    let params = req.inputs.params(state.config.default_risk_free_rate)?;
    let metrics = option_metrics(&state.model, &params, req.side, req.contracts, req.position)?;
    let moneyness = moneyness(params.spot, params.strike, req.side)?;
    RequestCounters::bump(&state.counters.prices_computed);
    Ok(Json(PriceResponse { metrics, moneyness }))
}

/// POST /api/pnl -- expiry P&L across a price axis
pub async fn pnl(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PnlRequest>,
) -> EngineResult<Json<PnlResponse>> {
    let params = req.inputs.params(state.config.default_risk_free_rate)?;
    let prices = req.axis.resolve(params.spot)?;
    let curve = pnl_at_expiry(
        &state.model,
        &params,
        req.side,
        req.contracts,
        req.position,
        &prices,
    )?;
    RequestCounters::bump(&state.counters.pnl_curves);
    let summary = curve.summary(POSITION_UNLIMITED);
    Ok(Json(PnlResponse { curve, summary }))
}

/// POST /api/pnl/strikes -- one per-share curve per strike
pub async fn pnl_by_strike(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StrikeComparisonRequest>,
) -> EngineResult<Json<Vec<StrikeCurve>>> {
    let prices = req.axis.resolve(req.spot)?;
    let curves = multi_strike_pnl(
        &state.model,
        &prices,
        &req.strikes,
        req.days_to_expiry / DAYS_PER_YEAR,
        req.rate.unwrap_or(state.config.default_risk_free_rate),
        req.volatility,
        req.side,
    )?;
    RequestCounters::bump(&state.counters.pnl_curves);
    Ok(Json(
        curves
            .into_iter()
            .map(|(strike, curve)| StrikeCurve {
                strike,
                summary: curve.summary(PER_SHARE_UNLIMITED),
                curve,
            })
            .collect(),
    ))
}

/// POST /api/pnl/expiries -- one per-share curve per expiry
pub async fn pnl_by_expiry(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExpiryComparisonRequest>,
) -> EngineResult<Json<Vec<ExpiryCurve>>> {
    let prices = req.axis.resolve(req.spot)?;
    let curves = multi_expiry_pnl(
        &state.model,
        req.spot,
        req.strike,
        &req.expiries,
        req.rate.unwrap_or(state.config.default_risk_free_rate),
        req.volatility,
        req.side,
        &prices,
    )?;
    RequestCounters::bump(&state.counters.pnl_curves);
    Ok(Json(
        curves
            .into_iter()
            .map(|(days_to_expiry, curve)| ExpiryCurve {
                days_to_expiry,
                summary: curve.summary(PER_SHARE_UNLIMITED),
                curve,
            })
            .collect(),
    ))
}

/// POST /api/profile -- price and Greeks across a price axis
pub async fn profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProfileRequest>,
) -> EngineResult<Json<Vec<ProfilePoint>>> {
    let params = req.inputs.params(state.config.default_risk_free_rate)?;
    let spots = req.axis.resolve(params.spot)?;
    let points = greeks_profile(&state.model, &params, req.side, &spots)?;
    state
        .counters
        .prices_computed
        .fetch_add(points.len() as u64, portable_atomic::Ordering::Relaxed);
    Ok(Json(points))
}

/// POST /api/implied-vol -- Newton-Raphson σ from a market price
pub async fn implied_vol(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImpliedVolRequest>,
) -> EngineResult<Json<ImpliedVol>> {
    let result = state.solver.solve(
        &state.model,
        req.market_price,
        req.spot,
        req.strike,
        req.days_to_expiry / DAYS_PER_YEAR,
        req.rate.unwrap_or(state.config.default_risk_free_rate),
        req.side,
    )?;

    RequestCounters::bump(&state.counters.iv_solves);
    if !result.converged {
        RequestCounters::bump(&state.counters.iv_unconverged);
        tracing::info!(
            market_price = req.market_price,
            sigma = result.sigma,
            iterations = result.iterations,
            "implied vol did not converge, returning last estimate"
        );
    }
    Ok(Json(result))
}

/// POST /api/historical-vol -- annualized realized volatility
pub async fn historical_vol(
    Json(req): Json<HistoricalVolRequest>,
) -> EngineResult<Json<serde_json::Value>> {
    let volatility = historical_volatility(&req.closes)?;
    Ok(Json(serde_json::json!({
        "volatility": volatility,
        "observations": req.closes.len(),
    })))
}

/// POST /api/surface -- 2-D grid, evaluated off the async runtime
pub async fn surface(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SurfaceRequest>,
) -> EngineResult<Json<Grid>> {
    let worker_state = state.clone();
    let grid = tokio::task::spawn_blocking(move || build_surface(&worker_state, req))
        .await
        .map_err(|e| EngineError::Internal(format!("surface task failed: {e}")))??;

    RequestCounters::bump(&state.counters.surfaces_built);
    Ok(Json(grid))
}

fn build_surface(state: &AppState, req: SurfaceRequest) -> EngineResult<Grid> {
    let builder = SurfaceBuilder::new(&state.model, state.config.max_grid_resolution);
    let default_rate = state.config.default_risk_free_rate;

    match req {
        SurfaceRequest::Price {
            spots,
            vols,
            strike,
            days_to_expiry,
            rate,
            side,
        } => builder.price_surface(
            &spots,
            &vols,
            strike,
            days_to_expiry / DAYS_PER_YEAR,
            rate.unwrap_or(default_rate),
            side,
        ),
        SurfaceRequest::Greek {
            spots,
            vols,
            strike,
            days_to_expiry,
            rate,
            side,
            greek,
        } => builder.greek_surface(
            &spots,
            &vols,
            strike,
            days_to_expiry / DAYS_PER_YEAR,
            rate.unwrap_or(default_rate),
            side,
            greek,
        ),
        SurfaceRequest::TimeDecay {
            spots,
            days,
            strike,
            volatility,
            rate,
            side,
        } => builder.time_decay_heatmap(
            &spots,
            &days,
            strike,
            volatility,
            rate.unwrap_or(default_rate),
            side,
        ),
        SurfaceRequest::Pnl {
            spots,
            days,
            current_spot,
            strike,
            volatility,
            rate,
            side,
            position,
        } => builder.pnl_heatmap(
            &spots,
            &days,
            current_spot,
            strike,
            volatility,
            rate.unwrap_or(default_rate),
            side,
            position,
        ),
    }
}

/// POST /api/strategies -- side-by-side strategy P&L
pub async fn strategies(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StrategiesRequest>,
) -> EngineResult<Json<Vec<StrategyComparison>>> {
    let strategies = req.strategies.unwrap_or_else(|| {
        vec![
            Strategy::LongCall { strike: req.strike },
            Strategy::LongPut { strike: req.strike },
            Strategy::LongStraddle { strike: req.strike },
        ]
    });
    let prices = req.axis.resolve(req.spot)?;
    let comparison = compare_strategies(
        &state.model,
        &strategies,
        req.spot,
        req.days_to_expiry / DAYS_PER_YEAR,
        req.rate.unwrap_or(state.config.default_risk_free_rate),
        req.volatility,
        &prices,
    )?;
    RequestCounters::bump(&state.counters.pnl_curves);
    Ok(Json(comparison))
}

/// GET /api/quote/{symbol} -- `{"quote": null}` when no provider answers
pub async fn quote(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> EngineResult<Json<serde_json::Value>> {
    let symbol = normalize_symbol(&symbol)?;
    let quote = state.market_data.quote(&symbol).await;
    if quote.is_some() {
        RequestCounters::bump(&state.counters.quotes_served);
    } else {
        RequestCounters::bump(&state.counters.quotes_unavailable);
    }
    Ok(Json(serde_json::json!({ "quote": quote })))
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<CounterSnapshot> {
    Json(state.counters.snapshot())
}
