use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::fetch::{get_json, FlowSource};
use crate::flow::FlowRecord;
use crate::logging::{self, obj, v_str, Domain};

const PROVIDER: &str = "cryptometer";

/// Exchange ticker volumes from cryptometer, one record per trading pair.
///
/// A pair `BASE-QUOTE` becomes a flow from QUOTE into BASE.
pub struct CryptometerSource {
    client: Client,
    base: String,
    api_key: String,
    exchange: String,
    max_pages: u32,
}

#[derive(Deserialize, Debug)]
struct TickerPage {
    #[serde(default)]
    success: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Vec<Ticker>,
}

/// Rows name the pair under `pair`, `market_pair` or `symbol`, sometimes
/// more than one at once.
#[derive(Deserialize, Debug)]
struct Ticker {
    #[serde(default)]
    pair: Option<String>,
    #[serde(default)]
    market_pair: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    volume: Option<NumberOrString>,
}

impl Ticker {
    fn pair(&self) -> Option<&str> {
        [&self.pair, &self.market_pair, &self.symbol]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .find(|p| !p.trim().is_empty())
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrString::Number(n) => Some(*n),
            NumberOrString::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Split `BTC-USDT`, `BTC/USDT` or `BTC_USDT` into (base, quote).
fn split_pair(pair: &str) -> Option<(&str, &str)> {
    let (base, quote) = pair.split_once(&['-', '/', '_'][..])?;
    let (base, quote) = (base.trim(), quote.trim());
    if base.is_empty() || quote.is_empty() {
        return None;
    }
    Some((base, quote))
}

fn ticker_to_record(t: &Ticker) -> Option<FlowRecord> {
    let (base, quote) = split_pair(t.pair()?)?;
    let volume = t.volume.as_ref()?.as_f64()?;
    Some(FlowRecord::new(quote.to_uppercase(), base.to_uppercase(), volume))
}

impl CryptometerSource {
    pub fn new(base: impl Into<String>, api_key: impl Into<String>, exchange: impl Into<String>, max_pages: u32) -> Self {
        Self {
            client: Client::new(),
            base: base.into(),
            api_key: api_key.into(),
            exchange: exchange.into(),
            max_pages: max_pages.max(1),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let key = cfg.cryptometer_api_key.clone().ok_or_else(|| {
            DashboardError::Config("CRYPTOMETER_API_KEY must be set when FLOW_SOURCE=cryptometer".to_string())
        })?;
        Ok(Self::new(
            cfg.cryptometer_base.clone(),
            key,
            cfg.cryptometer_exchange.clone(),
            cfg.cryptometer_max_pages,
        ))
    }

    async fn fetch_page(&self, page: u32) -> Result<TickerPage> {
        let url = format!("{}/tickerlist", self.base.trim_end_matches('/'));
        logging::log_fetch_request(PROVIDER, &format!("{}?e={}&page={}", url, self.exchange, page));
        let page_str = page.to_string();
        let request = self.client.get(&url).query(&[
            ("api_key", self.api_key.as_str()),
            ("e", self.exchange.as_str()),
            ("page", page_str.as_str()),
        ]);
        let body: TickerPage = get_json(PROVIDER, request).await?;
        if body.success.as_deref() == Some("false") {
            let detail = body.error.unwrap_or_else(|| "success=false".to_string());
            return Err(DashboardError::malformed(PROVIDER, detail));
        }
        Ok(body)
    }
}

#[async_trait]
impl FlowSource for CryptometerSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self) -> Result<Vec<FlowRecord>> {
        let mut records = Vec::new();
        for page in 1..=self.max_pages {
            let body = self.fetch_page(page).await?;
            if body.data.is_empty() {
                break;
            }
            for ticker in &body.data {
                match ticker_to_record(ticker) {
                    Some(rec) => records.push(rec),
                    None => logging::debug(
                        Domain::Fetch,
                        "ticker_skipped",
                        obj(&[("provider", v_str(PROVIDER)), ("pair", v_str(ticker.pair().unwrap_or("")))]),
                    ),
                }
            }
        }
        logging::log_fetch_result(PROVIDER, records.len());
        Ok(records)
    }
}
