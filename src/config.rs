use crate::error::{DashboardError, Result};
use crate::flow::{Direction, DEFAULT_TOP_K};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Dune,
    Cryptometer,
    Market,
}

impl SourceKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dune" => Ok(SourceKind::Dune),
            "cryptometer" => Ok(SourceKind::Cryptometer),
            "market" | "coingecko" => Ok(SourceKind::Market),
            other => Err(DashboardError::Config(format!(
                "FLOW_SOURCE must be dune, cryptometer or market, got `{}`",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Dune => "dune",
            SourceKind::Cryptometer => "cryptometer",
            SourceKind::Market => "market",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub source: SourceKind,
    pub dune_api_key: Option<String>,
    pub dune_query_id: Option<String>,
    pub dune_base: String,
    pub cryptometer_api_key: Option<String>,
    pub cryptometer_exchange: String,
    pub cryptometer_max_pages: u32,
    pub cryptometer_base: String,
    pub coingecko_base: String,
    pub market_per_page: u32,
    /// Fall back to market data, then the static list, when the primary fails.
    pub fallback_enabled: bool,
    pub top_k: usize,
    pub output_path: String,
    pub bind_addr: String,
    pub token: Option<String>,
    pub direction: Direction,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let source = match get("FLOW_SOURCE") {
            Some(raw) => SourceKind::parse(&raw)?,
            None => SourceKind::Dune,
        };
        let direction = match get("FLOW_DIRECTION") {
            Some(raw) => Direction::parse(&raw)?,
            None => Direction::Both,
        };

        let cfg = Self {
            source,
            dune_api_key: get("DUNE_API_KEY"),
            dune_query_id: get("DUNE_QUERY_ID"),
            dune_base: get("DUNE_BASE").unwrap_or_else(|| "https://api.dune.com".to_string()),
            cryptometer_api_key: get("CRYPTOMETER_API_KEY"),
            cryptometer_exchange: get("CRYPTOMETER_EXCHANGE").unwrap_or_else(|| "binance".to_string()),
            cryptometer_max_pages: parse_or(get("CRYPTOMETER_MAX_PAGES"), "CRYPTOMETER_MAX_PAGES", 5)?,
            cryptometer_base: get("CRYPTOMETER_BASE").unwrap_or_else(|| "https://api.cryptometer.io".to_string()),
            coingecko_base: get("COINGECKO_BASE").unwrap_or_else(|| "https://api.coingecko.com".to_string()),
            market_per_page: parse_or(get("MARKET_PER_PAGE"), "MARKET_PER_PAGE", 50)?,
            fallback_enabled: get("FLOW_FALLBACK")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            top_k: parse_or(get("TOP_K"), "TOP_K", DEFAULT_TOP_K)?,
            output_path: get("OUTPUT_PATH").unwrap_or_else(|| "flows.html".to_string()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8765".to_string()),
            token: get("FLOW_TOKEN").map(|t| t.trim().to_string()),
            direction,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Required credentials for the selected primary source.
    pub fn validate(&self) -> Result<()> {
        match self.source {
            SourceKind::Dune => {
                if self.dune_api_key.is_none() || self.dune_query_id.is_none() {
                    return Err(DashboardError::Config(
                        "DUNE_API_KEY and DUNE_QUERY_ID must be set as environment variables".to_string(),
                    ));
                }
            }
            SourceKind::Cryptometer => {
                if self.cryptometer_api_key.is_none() {
                    return Err(DashboardError::Config(
                        "CRYPTOMETER_API_KEY must be set when FLOW_SOURCE=cryptometer".to_string(),
                    ));
                }
            }
            SourceKind::Market => {}
        }
        if self.top_k == 0 {
            return Err(DashboardError::Config("TOP_K must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| DashboardError::Config(format!("{} is not a valid number: `{}`", key, v))),
    }
}
