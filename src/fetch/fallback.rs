use serde::Serialize;

use crate::config::{Config, SourceKind};
use crate::error::Result;
use crate::fetch::{FlowSource, MarketSource};
use crate::flow::FlowRecord;
use crate::logging::{self, ProfileScope};

/// Where the records on screen actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Primary,
    Market,
    Static,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Primary => "primary",
            Origin::Market => "market",
            Origin::Static => "static",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub records: Vec<FlowRecord>,
    pub origin: Origin,
}

/// Last-resort illustrative flows shown when every provider failed.
pub fn static_records() -> Vec<FlowRecord> {
    vec![
        FlowRecord::new("USDT", "BTC", 1_250_000.0),
        FlowRecord::new("USDT", "ETH", 840_000.0),
        FlowRecord::new("USDC", "BTC", 610_000.0),
        FlowRecord::new("USDC", "ETH", 455_000.0),
        FlowRecord::new("BTC", "ETH", 320_000.0),
        FlowRecord::new("USDT", "SOL", 275_000.0),
        FlowRecord::new("ETH", "SOL", 140_000.0),
        FlowRecord::new("USDT", "BNB", 130_000.0),
        FlowRecord::new("BTC", "XRP", 95_000.0),
        FlowRecord::new("USDC", "SOL", 80_000.0),
    ]
}

/// Primary provider, then (when enabled) market data, then the static list.
///
/// `market` is absent when the primary already is the market provider; the
/// chain then goes straight from the primary to the static list.
pub struct FallbackChain {
    primary: Box<dyn FlowSource>,
    market: Option<Box<dyn FlowSource>>,
    static_fallback: bool,
}

impl FallbackChain {
    /// Primary, optional market stage, and the static list as the last resort.
    pub fn with_fallback(primary: Box<dyn FlowSource>, market: Option<Box<dyn FlowSource>>) -> Self {
        Self {
            primary,
            market,
            static_fallback: true,
        }
    }

    /// Primary only; every failure propagates.
    pub fn strict(primary: Box<dyn FlowSource>) -> Self {
        Self {
            primary,
            market: None,
            static_fallback: false,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let primary = cfg.source.build(cfg)?;
        if !cfg.fallback_enabled {
            return Ok(Self::strict(primary));
        }
        let market: Option<Box<dyn FlowSource>> = match cfg.source {
            SourceKind::Market => None,
            _ => Some(Box::new(MarketSource::from_config(cfg))),
        };
        Ok(Self::with_fallback(primary, market))
    }

    pub async fn fetch(&self) -> Result<FetchOutcome> {
        let _scope = ProfileScope::with_context("fetch", &[("provider", logging::v_str(self.primary.name()))]);

        if !self.static_fallback {
            let records = self.primary.fetch().await?;
            return Ok(FetchOutcome {
                records,
                origin: Origin::Primary,
            });
        }

        let next = self.market.as_ref().map_or("static", |m| m.name());
        match self.primary.fetch().await {
            Ok(records) if !records.is_empty() => {
                return Ok(FetchOutcome {
                    records,
                    origin: Origin::Primary,
                })
            }
            Ok(_) => logging::log_fallback(self.primary.name(), next, "empty result"),
            Err(e) => logging::log_fallback(self.primary.name(), next, &e.to_string()),
        }

        if let Some(market) = &self.market {
            match market.fetch().await {
                Ok(records) if !records.is_empty() => {
                    return Ok(FetchOutcome {
                        records,
                        origin: Origin::Market,
                    })
                }
                Ok(_) => logging::log_fallback(market.name(), "static", "empty result"),
                Err(e) => logging::log_fallback(market.name(), "static", &e.to_string()),
            }
        }

        Ok(FetchOutcome {
            records: static_records(),
            origin: Origin::Static,
        })
    }
}
