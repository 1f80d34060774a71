//! Loading the TSA certificate chain from PEM

use crate::error::{Error, Result};
use rustls_pki_types::CertificateDer;
use std::path::Path;
use x509_cert::der::Decode;
use x509_cert::Certificate;

/// Trust material for verifying one TSA's responses
///
/// Self-signed certificates in the file become trust anchors and the others
/// intermediates. A file without any self-signed certificate is trusted as
/// given: every certificate in it becomes an anchor.
#[derive(Debug, Clone)]
pub struct CertificateChain {
    roots: Vec<CertificateDer<'static>>,
    intermediates: Vec<CertificateDer<'static>>,
}

impl CertificateChain {
    /// Parse every CERTIFICATE block of a PEM bundle
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let blocks = pem::parse_many(pem_str)
            .map_err(|e| Error::Certificate(format!("failed to parse PEM: {}", e)))?;

        let mut roots = Vec::new();
        let mut intermediates = Vec::new();
        for block in blocks {
            if block.tag() != "CERTIFICATE" {
                return Err(Error::Certificate(format!(
                    "expected CERTIFICATE PEM block, got {}",
                    block.tag()
                )));
            }
            let cert = Certificate::from_der(block.contents())
                .map_err(|e| Error::Certificate(format!("failed to parse certificate: {}", e)))?;
            let der = CertificateDer::from(block.into_contents());
            if cert.tbs_certificate.issuer == cert.tbs_certificate.subject {
                roots.push(der);
            } else {
                intermediates.push(der);
            }
        }

        if roots.is_empty() && intermediates.is_empty() {
            return Err(Error::Certificate(
                "no certificate found in chain file".to_string(),
            ));
        }
        if roots.is_empty() {
            roots = std::mem::take(&mut intermediates);
        }

        Ok(Self {
            roots,
            intermediates,
        })
    }

    /// Read a PEM chain file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem_str = std::fs::read_to_string(path).map_err(|e| {
            Error::Certificate(format!("failed to read {}: {}", path.display(), e))
        })?;
        let chain = Self::from_pem(&pem_str)?;
        tracing::debug!(
            path = %path.display(),
            roots = chain.roots.len(),
            intermediates = chain.intermediates.len(),
            "loaded TSA certificate chain"
        );
        Ok(chain)
    }

    pub fn roots(&self) -> &[CertificateDer<'static>] {
        &self.roots
    }

    pub fn intermediates(&self) -> &[CertificateDer<'static>] {
        &self.intermediates
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            roots: Vec::new(),
            intermediates: Vec::new(),
        }
    }
}
