use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::fetch::{get_json, FlowSource};
use crate::flow::FlowRecord;
use crate::logging;

const PROVIDER: &str = "dune";

/// Saved-query results from the Dune analytics API.
pub struct DuneSource {
    client: Client,
    base: String,
    api_key: String,
    query_id: String,
}

#[derive(Deserialize, Debug)]
struct DuneEnvelope {
    result: DuneResult,
}

#[derive(Deserialize, Debug)]
struct DuneResult {
    rows: Vec<FlowRecord>,
}

impl DuneSource {
    pub fn new(base: impl Into<String>, api_key: impl Into<String>, query_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base: base.into(),
            api_key: api_key.into(),
            query_id: query_id.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        match (&cfg.dune_api_key, &cfg.dune_query_id) {
            (Some(key), Some(id)) => Ok(Self::new(cfg.dune_base.clone(), key.clone(), id.clone())),
            _ => Err(DashboardError::Config(
                "DUNE_API_KEY and DUNE_QUERY_ID must be set as environment variables".to_string(),
            )),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/api/v1/query/{}/results",
            self.base.trim_end_matches('/'),
            self.query_id
        )
    }
}

#[async_trait]
impl FlowSource for DuneSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self) -> Result<Vec<FlowRecord>> {
        let url = self.url();
        logging::log_fetch_request(PROVIDER, &url);
        let request = self.client.get(&url).header("x-dune-api-key", &self.api_key);
        let envelope: DuneEnvelope = get_json(PROVIDER, request).await?;
        logging::log_fetch_result(PROVIDER, envelope.result.rows.len());
        Ok(envelope.result.rows)
    }
}
