use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    /// Used when a request omits the rate. Decimal, e.g. 0.05.
    pub default_risk_free_rate: f64,
    /// Upper bound on either axis of a surface grid.
    pub max_grid_resolution: usize,
    pub polygon_api_key: Option<String>,
    pub polygon_base_url: String,
    pub market_data_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3001,
            default_risk_free_rate: 0.05,
            max_grid_resolution: 100,
            polygon_api_key: None,
            polygon_base_url: "https://api.polygon.io".to_string(),
            market_data_timeout_secs: 5,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| EngineError::Config(format!("SERVER_PORT: {e}")))?;

        let default_risk_free_rate = env_var_or("RISK_FREE_RATE", "0.05")
            .parse::<f64>()
            .map_err(|e| EngineError::Config(format!("RISK_FREE_RATE: {e}")))?;
        if !default_risk_free_rate.is_finite() {
            return Err(EngineError::Config(format!(
                "RISK_FREE_RATE must be finite, got {default_risk_free_rate}"
            )));
        }

        let max_grid_resolution = env_var_or("MAX_GRID_RESOLUTION", "100")
            .parse::<usize>()
            .map_err(|e| EngineError::Config(format!("MAX_GRID_RESOLUTION: {e}")))?;
        if max_grid_resolution == 0 {
            return Err(EngineError::Config("MAX_GRID_RESOLUTION must be at least 1".into()));
        }

        let market_data_timeout_secs = env_var_or("MARKET_DATA_TIMEOUT_SECS", "5")
            .parse::<u64>()
            .map_err(|e| EngineError::Config(format!("MARKET_DATA_TIMEOUT_SECS: {e}")))?;

        Ok(Self {
            server_port,
            default_risk_free_rate,
            max_grid_resolution,
            polygon_api_key: env_var_opt("POLYGON_API_KEY"),
            polygon_base_url: env_var_or("POLYGON_BASE_URL", &defaults.polygon_base_url),
            market_data_timeout_secs,
        })
    }
}

fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
