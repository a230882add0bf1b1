use crate::errors::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt};
use reqwest::Client;
use std::sync::Arc;

/// Latest quote for one symbol.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub previous_close: f64,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Derive change fields from the last price and previous close.
    /// Change percent is 0 when the previous close is 0.
    pub fn from_prices(
        symbol: &str,
        price: f64,
        previous_close: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let change = price - previous_close;
        let change_percent = if previous_close != 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        };
        Self {
            symbol: symbol.to_uppercase(),
            price,
            change,
            change_percent,
            volume,
            previous_close,
            timestamp,
        }
    }
}

/// A market-data provider. Implementations do their own I/O and report any
/// failure as an error; the pricing layer never sees those errors because
/// [`ProviderChain`] turns them into an absent quote.
pub trait MarketDataSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch_quote<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, EngineResult<Quote>>;
}

/// Ordered list of providers, tried first to last.
#[derive(Clone, Default)]
pub struct ProviderChain {
    sources: Vec<Arc<dyn MarketDataSource>>,
}

impl ProviderChain {
    pub fn new(sources: Vec<Arc<dyn MarketDataSource>>) -> Self {
        Self { sources }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// First successful quote, or `None` when every provider fails.
    pub async fn quote(&self, symbol: &str) -> Option<Quote> {
        for source in &self.sources {
            match source.fetch_quote(symbol).await {
                Ok(quote) => return Some(quote),
                Err(e) => {
                    tracing::warn!(
                        provider = source.name(),
                        symbol = %symbol,
                        error = %e,
                        "quote fetch failed, trying next provider"
                    );
                }
            }
        }
        tracing::warn!(symbol = %symbol, "no provider returned a quote");
        None
    }
}

/// Uppercase ticker of letters, digits, '.' or '-'.
pub fn normalize_symbol(symbol: &str) -> EngineResult<String> {
    let trimmed = symbol.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= 12
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !valid {
        return Err(EngineError::InvalidParameter(format!("invalid symbol: {symbol:?}")));
    }
    Ok(trimmed.to_uppercase())
}

/// Polygon.io REST client: previous-day aggregate plus last trade.
pub struct PolygonSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PolygonSource {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::MarketData(format!("HTTP {status}: {body}")));
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice::<T>(&body)?)
    }

    async fn fetch(&self, symbol: &str) -> EngineResult<Quote> {
        let symbol = normalize_symbol(symbol)?;

        let prev: AggsResponse = self.get(&format!("/v2/aggs/ticker/{symbol}/prev")).await?;
        let bar = prev
            .ok_results()
            .and_then(|bars| bars.first())
            .ok_or_else(|| EngineError::MarketData(format!("no previous close for {symbol}")))?;
        let previous_close = bar
            .c
            .ok_or_else(|| EngineError::MarketData(format!("previous close missing for {symbol}")))?;

        let last: LastTradeResponse = self.get(&format!("/v2/last/trade/{symbol}")).await?;
        let price = last
            .ok_results()
            .and_then(|t| t.p)
            .ok_or_else(|| EngineError::MarketData(format!("no last trade for {symbol}")))?;

        if !price.is_finite() || price <= 0.0 {
            return Err(EngineError::MarketData(format!("invalid price: {price}")));
        }

        Ok(Quote::from_prices(
            &symbol,
            price,
            previous_close,
            bar.v.unwrap_or(0.0),
            Utc::now(),
        ))
    }
}

impl MarketDataSource for PolygonSource {
    fn name(&self) -> &'static str {
        "polygon"
    }

    fn fetch_quote<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, EngineResult<Quote>> {
        self.fetch(symbol).boxed()
    }
}

// Polygon response shapes (only the fields used):
// /v2/aggs/ticker/AAPL/prev → {"status":"OK","results":[{"c":189.7,"v":51234567.0,...}]}
// /v2/last/trade/AAPL       → {"status":"OK","results":{"p":190.12,...}}

#[derive(serde::Deserialize)]
struct AggsResponse {
    status: Option<String>,
    results: Option<Vec<AggBar>>,
}

impl AggsResponse {
    fn ok_results(&self) -> Option<&Vec<AggBar>> {
        if self.status.as_deref() != Some("OK") {
            return None;
        }
        self.results.as_ref()
    }
}

#[derive(serde::Deserialize)]
struct AggBar {
    c: Option<f64>,
    v: Option<f64>,
}

#[derive(serde::Deserialize)]
struct LastTradeResponse {
    status: Option<String>,
    results: Option<LastTrade>,
}

impl LastTradeResponse {
    fn ok_results(&self) -> Option<&LastTrade> {
        if self.status.as_deref() != Some("OK") {
            return None;
        }
        self.results.as_ref()
    }
}

#[derive(serde::Deserialize)]
struct LastTrade {
    p: Option<f64>,
}
