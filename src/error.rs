//! Error kinds surfaced by the fetch → graph → view pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// A required environment value is missing or unparsable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Provider answered with a non-success HTTP status.
    #[error("{provider} returned HTTP {status}")]
    Upstream { provider: &'static str, status: u16 },

    /// Provider answered 2xx but the body did not have the expected shape.
    #[error("malformed response from {provider}: {detail}")]
    Malformed {
        provider: &'static str,
        detail: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn malformed(provider: &'static str, detail: impl Into<String>) -> Self {
        DashboardError::Malformed {
            provider,
            detail: detail.into(),
        }
    }

    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Config(_) => "config",
            DashboardError::Upstream { .. } => "upstream",
            DashboardError::Malformed { .. } => "malformed",
            DashboardError::Http(_) => "http",
            DashboardError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_carries_status() {
        let err = DashboardError::Upstream {
            provider: "dune",
            status: 500,
        };
        assert_eq!(err.to_string(), "dune returned HTTP 500");
        assert_eq!(err.kind(), "upstream");
    }

    #[test]
    fn test_malformed_helper() {
        let err = DashboardError::malformed("coingecko", "missing field `symbol`");
        assert!(err.to_string().contains("coingecko"));
        assert!(err.to_string().contains("missing field"));
        assert_eq!(err.kind(), "malformed");
    }
}
