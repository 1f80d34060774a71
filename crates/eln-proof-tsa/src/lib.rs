//! RFC 3161 Time-Stamp Protocol support for ELN entities
//!
//! This crate implements the protocol side of trusted timestamping:
//! building the TimeStampReq for a document digest, posting it to a
//! Time-Stamp Authority, and validating the signed TimeStampResp with a
//! native verifier and an `openssl ts` fallback.

pub mod asn1;
pub mod certs;
pub mod client;
pub mod config;
pub mod error;
pub mod openssl;
pub mod report;
pub mod request;
pub mod validator;
pub mod verify;

pub use asn1::{
    AlgorithmIdentifier, MessageImprint, PkiStatus, TimeStampReq, TimeStampResp, TstInfo,
};
pub use certs::CertificateChain;
pub use client::{TimestampTransport, TsaClient, DEFAULT_USER_AGENT};
pub use config::{TimestampConfig, TsaProvider, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use openssl::OpensslVerifier;
pub use report::{extract_time, VerificationReport};
pub use request::{NoncePolicy, TimestampRequest, TimestampRequestBuilder};
pub use validator::{
    FailureKind, ProofInput, ProofVerifier, TimestampResponseValidator, ValidatorOrder,
    VerifyFailure,
};
pub use verify::NativeVerifier;
