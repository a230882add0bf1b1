use crate::config::AppConfig;
use crate::feeds::market_data::ProviderChain;
use crate::models::black_scholes::BlackScholes;
use crate::models::implied_vol::ImpliedVolSolver;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── Request Counters (lock-free) ──

#[derive(Default)]
pub struct RequestCounters {
    pub prices_computed: AtomicU64,
    pub pnl_curves: AtomicU64,
    pub iv_solves: AtomicU64,
    pub iv_unconverged: AtomicU64,
    pub surfaces_built: AtomicU64,
    pub quotes_served: AtomicU64,
    pub quotes_unavailable: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CounterSnapshot {
    pub prices_computed: u64,
    pub pnl_curves: u64,
    pub iv_solves: u64,
    pub iv_unconverged: u64,
    pub surfaces_built: u64,
    pub quotes_served: u64,
    pub quotes_unavailable: u64,
}

impl RequestCounters {
    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        use Ordering::Relaxed;
        CounterSnapshot {
            prices_computed: self.prices_computed.load(Relaxed),
            pnl_curves: self.pnl_curves.load(Relaxed),
            iv_solves: self.iv_solves.load(Relaxed),
            iv_unconverged: self.iv_unconverged.load(Relaxed),
            surfaces_built: self.surfaces_built.load(Relaxed),
            quotes_served: self.quotes_served.load(Relaxed),
            quotes_unavailable: self.quotes_unavailable.load(Relaxed),
        }
    }
}

// ── Application shared state (immutable apart from counters) ──

pub struct AppState {
    pub config: AppConfig,
    /// Stateless; shared by every request and rayon worker.
    pub model: BlackScholes,
    pub solver: ImpliedVolSolver,
    pub market_data: ProviderChain,
    pub counters: RequestCounters,
}

impl AppState {
    pub fn new(config: AppConfig, market_data: ProviderChain) -> Arc<Self> {
        Arc::new(Self {
            config,
            model: BlackScholes::new(),
            solver: ImpliedVolSolver::default(),
            market_data,
            counters: RequestCounters::default(),
        })
    }
}
