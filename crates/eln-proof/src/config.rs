//! Persisted timestamp settings and their resolution into a `TimestampConfig`

use crate::error::{Error, Result};
use eln_proof_crypto::CredentialCipher;
use eln_proof_tsa::{TimestampConfig, TsaProvider};
use eln_proof_types::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// TSA settings as stored for the instance or a team
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampSettings {
    #[serde(default)]
    pub provider: TsaProvider,
    /// TSA endpoint; required for custom providers, overrides presets
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    /// `CredentialCipher` payload
    #[serde(default)]
    pub encrypted_password: Option<String>,
    /// Certificate chain, relative to the instance certificate directory
    #[serde(default)]
    pub cert_path: Option<PathBuf>,
    #[serde(default)]
    pub hash_algorithm: Option<String>,
    #[serde(default)]
    pub proxy: Option<String>,
}

/// Instance-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSettings {
    #[serde(flatten)]
    pub timestamp: TimestampSettings,
    /// Let teams configure their own TSA
    #[serde(default)]
    pub allow_team_override: bool,
    #[serde(default)]
    pub bloxberg_enabled: bool,
    /// Directory holding the bundled TSA chains
    #[serde(default)]
    pub certificate_dir: PathBuf,
}

impl TimestampSettings {
    /// Whether these settings name a TSA at all
    pub fn is_configured(&self) -> bool {
        self.provider != TsaProvider::Custom || self.url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Build the configuration for one attempt, decrypting the password
    pub fn to_config(
        &self,
        certificate_dir: &Path,
        cipher: &CredentialCipher,
    ) -> Result<TimestampConfig> {
        let mut config = match self.provider {
            TsaProvider::Custom => {
                let url = self
                    .url
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| Error::Config("no TSA URL configured".to_string()))?;
                let cert_path = self.cert_path.as_ref().ok_or_else(|| {
                    Error::Config("no TSA certificate chain configured".to_string())
                })?;
                TimestampConfig::new(url, certificate_dir.join(cert_path))
            }
            provider => {
                let mut config = TimestampConfig::for_provider(provider, certificate_dir)?;
                if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
                    config.tsa_url = url.to_string();
                }
                if let Some(cert_path) = &self.cert_path {
                    config = config.with_certificate_chain(certificate_dir.join(cert_path));
                }
                config
            }
        };

        if let Some(name) = &self.hash_algorithm {
            config = config.with_digest_algorithm(HashAlgorithm::from_name_or_default(name));
        }

        let password = self
            .encrypted_password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| cipher.decrypt(p))
            .transpose()?;

        config = config
            .with_credentials(self.login.clone(), password)?
            .with_proxy(self.proxy.clone());
        Ok(config)
    }
}

/// Resolve the configuration for an attempt
///
/// A team override wins when the instance allows overrides and the team has
/// configured a TSA. The instance proxy applies when the team sets none.
pub fn resolve_config(
    instance: &InstanceSettings,
    team: Option<&TimestampSettings>,
    cipher: &CredentialCipher,
) -> Result<TimestampConfig> {
    let settings = match team {
        Some(team) if instance.allow_team_override && team.is_configured() => {
            tracing::debug!(provider = ?team.provider, "using team timestamp settings");
            let mut team = team.clone();
            if team.proxy.is_none() {
                team.proxy = instance.timestamp.proxy.clone();
            }
            team
        }
        _ => instance.timestamp.clone(),
    };

    let config = settings.to_config(&instance.certificate_dir, cipher)?;
    tracing::debug!(config = ?config, "resolved timestamp configuration");
    Ok(config)
}
