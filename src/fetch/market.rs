use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{get_json, FlowSource};
use crate::flow::FlowRecord;
use crate::logging;

const PROVIDER: &str = "coingecko";

/// Fiat placeholder every asset is paired with.
pub const FIAT: &str = "USD";

/// Assets that also get illustrative inter-asset edges.
pub const MAJOR_ASSETS: [&str; 5] = ["BTC", "ETH", "BNB", "SOL", "XRP"];

/// Share of an asset's volume assigned to each synthesized major→major edge.
pub const MAJOR_PAIR_FRACTION: f64 = 0.10;

/// Public market listing (CoinGecko `/coins/markets`), reshaped into flows.
pub struct MarketSource {
    client: Client,
    base: String,
    per_page: u32,
}

#[derive(Deserialize, Debug)]
struct MarketRow {
    symbol: String,
    #[serde(default)]
    total_volume: Option<f64>,
}

/// Every asset becomes `USD → SYMBOL`. Majors additionally flow into every
/// major listed after them, at a fixed fraction of their own volume.
fn synthesize(rows: &[MarketRow]) -> Vec<FlowRecord> {
    let assets: Vec<(String, f64)> = rows
        .iter()
        .filter_map(|r| r.total_volume.map(|v| (r.symbol.to_uppercase(), v)))
        .collect();

    let mut records: Vec<FlowRecord> = assets
        .iter()
        .map(|(symbol, volume)| FlowRecord::new(FIAT, symbol.clone(), *volume))
        .collect();

    let majors: Vec<&(String, f64)> = assets
        .iter()
        .filter(|(symbol, _)| MAJOR_ASSETS.contains(&symbol.as_str()))
        .collect();
    for (i, (from, volume)) in majors.iter().enumerate() {
        for (to, _) in majors.iter().skip(i + 1) {
            records.push(FlowRecord::new(from.clone(), to.clone(), volume * MAJOR_PAIR_FRACTION));
        }
    }
    records
}

impl MarketSource {
    pub fn new(base: impl Into<String>, per_page: u32) -> Self {
        Self {
            client: Client::new(),
            base: base.into(),
            per_page: per_page.max(1),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.coingecko_base.clone(), cfg.market_per_page)
    }
}

#[async_trait]
impl FlowSource for MarketSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self) -> Result<Vec<FlowRecord>> {
        let url = format!("{}/api/v3/coins/markets", self.base.trim_end_matches('/'));
        logging::log_fetch_request(PROVIDER, &url);
        let per_page = self.per_page.to_string();
        let request = self.client.get(&url).query(&[
            ("vs_currency", "usd"),
            ("order", "volume_desc"),
            ("per_page", per_page.as_str()),
            ("page", "1"),
        ]);
        let rows: Vec<MarketRow> = get_json(PROVIDER, request).await?;
        let records = synthesize(&rows);
        logging::log_fetch_result(PROVIDER, records.len());
        Ok(records)
    }
}
