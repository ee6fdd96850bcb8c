use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::config::{Config, SourceKind};
use crate::error::{DashboardError, Result};
use crate::flow::FlowRecord;
use crate::logging;

mod cryptometer;
mod dune;
pub mod fallback;
mod market;

pub use cryptometer::CryptometerSource;
pub use dune::DuneSource;
pub use fallback::{static_records, FallbackChain, FetchOutcome, Origin};
pub use market::{MarketSource, MAJOR_ASSETS, MAJOR_PAIR_FRACTION};

/// A provider of flow records. One call, no retries.
#[async_trait]
pub trait FlowSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self) -> Result<Vec<FlowRecord>>;
}

impl SourceKind {
    pub fn build(self, cfg: &Config) -> Result<Box<dyn FlowSource>> {
        match self {
            SourceKind::Dune => Ok(Box::new(DuneSource::from_config(cfg)?)),
            SourceKind::Cryptometer => Ok(Box::new(CryptometerSource::from_config(cfg)?)),
            SourceKind::Market => Ok(Box::new(MarketSource::from_config(cfg))),
        }
    }
}

/// Send a request and decode a 2xx JSON body into `T`.
///
/// Non-success status maps to `Upstream`; a body that does not decode maps to
/// `Malformed`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T> {
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        logging::warn(
            logging::Domain::Fetch,
            "upstream_status",
            logging::obj(&[
                ("provider", logging::v_str(provider)),
                ("status", serde_json::json!(status.as_u16())),
            ]),
        );
        return Err(DashboardError::Upstream {
            provider,
            status: status.as_u16(),
        });
    }
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| DashboardError::malformed(provider, e.to_string()))
}
