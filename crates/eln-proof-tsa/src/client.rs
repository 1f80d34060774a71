//! TSA client for RFC 3161 Time-Stamp Protocol

use crate::config::TimestampConfig;
use crate::error::{Error, Result};
use std::future::Future;
use std::pin::Pin;

/// Transport that submits a TimeStampReq and returns the raw TimeStampResp
///
/// Failures are reported as [`Error::TsaUnreachable`] and are never retried
/// here: every request against a TSA may be billed.
pub trait TimestampTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        request_der: &'a [u8],
        config: &'a TimestampConfig,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;
}

/// User-Agent sent to the TSA unless overridden
pub const DEFAULT_USER_AGENT: &str = concat!("eln-proof/", env!("CARGO_PKG_VERSION"));

/// HTTP client for a Time-Stamp Authority
///
/// A fresh `reqwest::Client` is built per request because proxy and timeout
/// come from the configuration of that attempt.
#[derive(Debug, Clone)]
pub struct TsaClient {
    user_agent: String,
}

impl Default for TsaClient {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TsaClient {
    /// Create a new TSA client
    pub fn new() -> Self {
        Self::default()
    }

    /// Send a custom User-Agent header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn http_client(&self, config: &TimestampConfig) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);

        builder = match &config.proxy_url {
            Some(proxy_url) => {
                let proxy = reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::Config(format!("invalid proxy URL: {}", e)))?;
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        builder
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| Error::TsaUnreachable(format!("failed to build HTTP client: {}", e)))
    }

    /// Post a DER-encoded TimeStampReq and return the TSA's raw answer
    ///
    /// The body is the binary request even though the
    /// `Content-Transfer-Encoding: base64` header is sent; TSAs in use expect
    /// exactly this combination.
    pub async fn timestamp(&self, request_der: &[u8], config: &TimestampConfig) -> Result<Vec<u8>> {
        let client = self.http_client(config)?;

        let mut request = client
            .post(&config.tsa_url)
            .header("Content-Type", "application/timestamp-query")
            .header("Content-Transfer-Encoding", "base64")
            .body(request_der.to_vec());

        if let Some((login, password)) = config.credentials() {
            request = request.basic_auth(login, Some(password.expose()));
        }

        tracing::info!(
            tsa = %config.tsa_url,
            proxy = config.proxy_url.is_some(),
            len = request_der.len(),
            "sending timestamp request"
        );

        let response = request
            .send()
            .await
            .map_err(|e| Error::TsaUnreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::TsaUnreachable(format!(
                "TSA returned status {}",
                response.status()
            )));
        }

        let response_bytes = response
            .bytes()
            .await
            .map_err(|e| Error::TsaUnreachable(e.to_string()))?;

        if response_bytes.is_empty() {
            return Err(Error::TsaUnreachable("empty response from TSA".to_string()));
        }

        tracing::debug!(len = response_bytes.len(), "received timestamp response");
        Ok(response_bytes.to_vec())
    }
}

impl TimestampTransport for TsaClient {
    fn send<'a>(
        &'a self,
        request_der: &'a [u8],
        config: &'a TimestampConfig,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(self.timestamp(request_der, config))
    }
}
