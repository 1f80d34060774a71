//! TSA configuration consumed by one timestamping attempt

use crate::error::{Error, Result};
use eln_proof_types::{HashAlgorithm, Secret};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timeout applied to the TSA request
///
/// Kept short so that a misconfigured proxy fails the request instead of
/// holding a worker.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Known Time-Stamp Authorities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TsaProvider {
    /// Deutsches Forschungsnetz
    Dfn,
    /// Universign (requires an account)
    Universign,
    Digicert,
    Sectigo,
    Globalsign,
    /// Any other RFC 3161 TSA, fully described by the settings
    #[default]
    Custom,
}

impl TsaProvider {
    /// TSA endpoint, `None` for custom providers
    pub fn url(&self) -> Option<&'static str> {
        match self {
            TsaProvider::Dfn => Some("http://zeitstempel.dfn.de"),
            TsaProvider::Universign => Some("https://ws.universign.eu/tsa"),
            TsaProvider::Digicert => Some("http://timestamp.digicert.com"),
            TsaProvider::Sectigo => Some("http://timestamp.sectigo.com"),
            TsaProvider::Globalsign => Some("http://timestamp.globalsign.com/tsa/r6advanced1"),
            TsaProvider::Custom => None,
        }
    }

    /// File name of the bundled certificate chain, `None` for custom providers
    pub fn certificate_file(&self) -> Option<&'static str> {
        match self {
            TsaProvider::Dfn => Some("dfn.pem"),
            TsaProvider::Universign => Some("universign.pem"),
            TsaProvider::Digicert => Some("digicert.pem"),
            TsaProvider::Sectigo => Some("sectigo.pem"),
            TsaProvider::Globalsign => Some("globalsign.pem"),
            TsaProvider::Custom => None,
        }
    }

    pub fn requires_credentials(&self) -> bool {
        matches!(self, TsaProvider::Universign)
    }
}

/// Resolved configuration for one timestamping attempt
///
/// Credentials are either both present or both absent.
#[derive(Clone)]
pub struct TimestampConfig {
    pub provider: TsaProvider,
    pub tsa_url: String,
    login: Option<String>,
    password: Option<Secret>,
    /// PEM file with the TSA certificate chain
    pub certificate_chain: PathBuf,
    pub digest_algorithm: HashAlgorithm,
    pub proxy_url: Option<String>,
    pub timeout: Duration,
}

impl TimestampConfig {
    /// Configuration for an arbitrary TSA
    pub fn new(tsa_url: impl Into<String>, certificate_chain: impl Into<PathBuf>) -> Self {
        Self {
            provider: TsaProvider::Custom,
            tsa_url: tsa_url.into(),
            login: None,
            password: None,
            certificate_chain: certificate_chain.into(),
            digest_algorithm: HashAlgorithm::default(),
            proxy_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Configuration for a known provider, its chain looked up in `certificate_dir`
    pub fn for_provider(provider: TsaProvider, certificate_dir: impl AsRef<Path>) -> Result<Self> {
        let (Some(url), Some(file)) = (provider.url(), provider.certificate_file()) else {
            return Err(Error::Config(
                "custom provider needs an explicit URL and certificate chain".to_string(),
            ));
        };
        Ok(Self {
            provider,
            ..Self::new(url, certificate_dir.as_ref().join(file))
        })
    }

    /// Set login and password; both must be given or neither
    pub fn with_credentials(mut self, login: Option<String>, password: Option<Secret>) -> Result<Self> {
        let login = login.filter(|l| !l.is_empty());
        let password = password.filter(|p| !p.is_empty());
        match (&login, &password) {
            (Some(_), None) => {
                return Err(Error::Config("TSA login set without a password".to_string()))
            }
            (None, Some(_)) => {
                return Err(Error::Config("TSA password set without a login".to_string()))
            }
            _ => {}
        }
        if self.provider.requires_credentials() && login.is_none() {
            return Err(Error::Config(format!(
                "{:?} requires a login and password",
                self.provider
            )));
        }
        self.login = login;
        self.password = password;
        Ok(self)
    }

    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url.filter(|p| !p.is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_digest_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    pub fn with_certificate_chain(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate_chain = path.into();
        self
    }

    /// Login and password, only when both are set
    pub fn credentials(&self) -> Option<(&str, &Secret)> {
        match (&self.login, &self.password) {
            (Some(login), Some(password)) => Some((login.as_str(), password)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for TimestampConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampConfig")
            .field("provider", &self.provider)
            .field("tsa_url", &self.tsa_url)
            .field("credentials", &self.credentials().is_some())
            .field("certificate_chain", &self.certificate_chain)
            .field("digest_algorithm", &self.digest_algorithm)
            .field("proxy", &self.proxy_url.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}
