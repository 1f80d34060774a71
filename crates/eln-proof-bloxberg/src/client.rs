//! Bloxberg notary client

use crate::error::{Error, Result};
use eln_proof_types::Secret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout for Bloxberg requests; certification waits on a blockchain write
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the notary and its key service live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloxbergEndpoints {
    pub certify_url: String,
    pub proof_url: String,
    /// Key distribution endpoint answering with the API key as plain text
    pub api_key_url: String,
    /// Public address the certificates are issued for
    pub public_key: String,
}

impl BloxbergEndpoints {
    /// The public Bloxberg service
    pub fn production() -> Self {
        Self {
            certify_url: "https://certify.bloxberg.org/createBloxbergCertificate".to_string(),
            proof_url: "https://certify.bloxberg.org/generatePDF".to_string(),
            api_key_url: "https://get.elabftw.net/?bloxbergapikey".to_string(),
            public_key: "0xc4d84f3e6c7A7adf10f5F2aA18C2d3ee0376D4A4".to_string(),
        }
    }
}

impl Default for BloxbergEndpoints {
    fn default() -> Self {
        Self::production()
    }
}

/// Metadata stored alongside the certified hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifyMetadata {
    pub author: String,
    pub elabid: String,
    pub instanceid: String,
}

impl CertifyMetadata {
    pub fn new(author: impl Into<String>, elabid: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            elabid: elabid.into(),
            instanceid: "not implemented".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CertifyRequest<'a> {
    public_key: &'a str,
    crid: Vec<String>,
    crid_type: &'static str,
    #[serde(rename = "enableIPFS")]
    enable_ipfs: bool,
    /// The metadata object serialized into a string
    metadata_json: String,
}

/// Client for the Bloxberg certification API
///
/// The API key is fetched once when connecting.
pub struct BloxbergNotary {
    endpoints: BloxbergEndpoints,
    api_key: Secret,
    client: reqwest::Client,
}

impl BloxbergNotary {
    /// Build the HTTP client and fetch the API key
    ///
    /// Fails with [`Error::ImproperAction`] unless the key service answers
    /// with HTTP 200.
    pub async fn connect(
        endpoints: BloxbergEndpoints,
        proxy_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        builder = match proxy_url.filter(|p| !p.is_empty()) {
            Some(proxy_url) => builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::ImproperAction(format!("invalid proxy URL: {}", e)))?,
            ),
            None => builder.no_proxy(),
        };
        let client = builder
            .build()
            .map_err(|e| Error::ImproperAction(format!("failed to build HTTP client: {}", e)))?;

        let response = client
            .get(&endpoints.api_key_url)
            .send()
            .await
            .map_err(|e| Error::ImproperAction(format!("could not fetch Bloxberg API key: {}", e)))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(Error::ImproperAction(format!(
                "could not fetch Bloxberg API key: {}",
                response.status()
            )));
        }

        let api_key = response
            .text()
            .await
            .map_err(|e| Error::ImproperAction(format!("could not read Bloxberg API key: {}", e)))?
            .trim()
            .to_string();
        if api_key.is_empty() {
            return Err(Error::ImproperAction("empty Bloxberg API key".to_string()));
        }

        tracing::debug!("fetched Bloxberg API key");
        Ok(Self {
            endpoints,
            api_key: Secret::new(api_key),
            client,
        })
    }

    pub fn endpoints(&self) -> &BloxbergEndpoints {
        &self.endpoints
    }

    /// Certify a sha256 hex digest; returns the notary's JSON answer
    pub async fn certify(&self, hash_hex: &str, metadata: &CertifyMetadata) -> Result<serde_json::Value> {
        let metadata_json = serde_json::to_string(metadata)
            .map_err(|e| Error::ImproperAction(format!("failed to encode metadata: {}", e)))?;
        let request = CertifyRequest {
            public_key: &self.endpoints.public_key,
            crid: vec![format!("0x{}", hash_hex)],
            crid_type: "sha2-256",
            enable_ipfs: false,
            metadata_json,
        };

        tracing::info!(elabid = %metadata.elabid, "certifying hash with Bloxberg");
        let response = self
            .client
            .post(&self.endpoints.certify_url)
            .header("api_key", self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ImproperAction(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::ImproperAction(format!(
                "certification failed: {} - {}",
                status,
                failure_body(response).await
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::ImproperAction(format!("failed to parse certification: {}", e)))
    }

    /// Exchange a certification for the proof archive (a ZIP)
    pub async fn fetch_proof(&self, certification: &serde_json::Value) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoints.proof_url)
            .header("api_key", self.api_key.expose())
            .json(certification)
            .send()
            .await
            .map_err(|e| Error::ImproperAction(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::ImproperAction(format!(
                "proof retrieval failed: {} - {}",
                status,
                failure_body(response).await
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::ImproperAction(e.to_string()))?;
        tracing::debug!(len = bytes.len(), "received Bloxberg proof archive");
        Ok(bytes.to_vec())
    }
}

impl std::fmt::Debug for BloxbergNotary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloxbergNotary")
            .field("endpoints", &self.endpoints)
            .field("api_key", &self.api_key)
            .finish()
    }
}

/// Body of an error response, or why it could not be read
async fn failure_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => format!("<unreadable body: {}>", e),
    }
}
