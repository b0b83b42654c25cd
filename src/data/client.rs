use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DataServiceConfig;

#[derive(Debug, Error)]
pub enum DataServiceError {
    #[error("data service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("data service returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("data service response did not decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("data service rejected the operation: {0}")]
    Graphql(String),
    #[error("data service response carried no data")]
    MissingData,
}

/// Wire shape of a GraphQL request. Variables are always passed by name
/// through this body, never spliced into the query text.
#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

/// Pooled HTTPS client for the external GraphQL data service. Cloning is
/// cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct DataServiceClient {
    client: reqwest::Client,
    url: String,
    admin_secret: String,
}

impl DataServiceClient {
    pub fn new(config: &DataServiceConfig) -> anyhow::Result<Self> {
        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if config.accept_invalid_certs {
            warn!("TLS certificate validation for the data service is DISABLED; never run this way outside local development");
            builder = builder.danger_accept_invalid_certs(true);
        }
        Ok(Self {
            client: builder.build()?,
            url: config.url.clone(),
            admin_secret: config.admin_secret.clone(),
        })
    }

    /// POST a `{query, variables}` body to the data service and return the
    /// raw response bytes. Callers interpret the GraphQL envelope.
    pub async fn execute(&self, query: &str, variables: Value) -> Result<Bytes, DataServiceError> {
        let response = self
            .client
            .post(&self.url)
            .header("X-Hasura-Admin-Secret", &self.admin_secret)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataServiceError::Status { status, body });
        }

        let body = response.bytes().await?;
        debug!(bytes = body.len(), "data service responded");
        Ok(body)
    }
}
