//! RFC 3161 wire structures
//!
//! Only the parts of the protocol a client touches are modelled: the
//! request, the response envelope and the TSTInfo carried inside the signed
//! token. The CMS layers in between are decoded with the `cms` crate.

use const_oid::ObjectIdentifier;
use der::asn1::{BitString, GeneralizedTime, Int, OctetString};
use der::{Decode, Encode, Sequence};
use eln_proof_types::{HashAlgorithm, HashOutput};
use rand::Rng;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::Extensions;

pub const OID_SHA256: ObjectIdentifier = const_oid::db::rfc5912::ID_SHA_256;
pub const OID_SHA384: ObjectIdentifier = const_oid::db::rfc5912::ID_SHA_384;
pub const OID_SHA512: ObjectIdentifier = const_oid::db::rfc5912::ID_SHA_512;

/// id-ct-TSTInfo, the eContentType of a timestamp token
pub const OID_TST_INFO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.1.4");

/// Supported algorithm for a digest OID
pub fn hash_algorithm_for_oid(oid: &ObjectIdentifier) -> Option<HashAlgorithm> {
    HashAlgorithm::ALL
        .into_iter()
        .find(|algorithm| oid_for_hash_algorithm(*algorithm) == *oid)
}

pub fn oid_for_hash_algorithm(algorithm: HashAlgorithm) -> ObjectIdentifier {
    match algorithm {
        HashAlgorithm::Sha256 => OID_SHA256,
        HashAlgorithm::Sha384 => OID_SHA384,
        HashAlgorithm::Sha512 => OID_SHA512,
    }
}

fn boolean_false() -> bool {
    false
}

/// 64 random bits as a positive INTEGER
fn random_nonce() -> Result<Int, der::Error> {
    let bytes: [u8; 8] = rand::rng().random();
    // A set high bit would read as negative without a leading zero.
    let mut encoded = Vec::with_capacity(9);
    if bytes[0] & 0x80 != 0 {
        encoded.push(0);
    }
    encoded.extend_from_slice(&bytes);
    Int::new(&encoded)
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct AlgorithmIdentifier {
    pub algorithm: ObjectIdentifier,
    #[asn1(optional = "true")]
    pub parameters: Option<der::Any>,
}

impl AlgorithmIdentifier {
    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        hash_algorithm_for_oid(&self.algorithm)
    }
}

impl From<HashAlgorithm> for AlgorithmIdentifier {
    fn from(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm: oid_for_hash_algorithm(algorithm),
            parameters: None,
        }
    }
}

/// The digest being timestamped, tagged with its algorithm
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct MessageImprint {
    pub hash_algorithm: AlgorithmIdentifier,
    pub hashed_message: OctetString,
}

impl MessageImprint {
    pub fn for_digest(digest: &HashOutput) -> Result<Self, der::Error> {
        Ok(Self {
            hash_algorithm: digest.algorithm.into(),
            hashed_message: OctetString::new(digest.digest.clone())?,
        })
    }
}

/// TimeStampReq (RFC 3161 §2.4.1)
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TimeStampReq {
    pub version: u8,
    pub message_imprint: MessageImprint,
    #[asn1(optional = "true")]
    pub req_policy: Option<ObjectIdentifier>,
    #[asn1(optional = "true")]
    pub nonce: Option<Int>,
    #[asn1(default = "boolean_false")]
    pub cert_req: bool,
}

impl TimeStampReq {
    /// Version 1 request that always asks for the TSA certificate
    pub fn new(message_imprint: MessageImprint, nonce: Option<Int>) -> Self {
        Self {
            version: 1,
            message_imprint,
            req_policy: None,
            nonce,
            cert_req: true,
        }
    }

    pub fn with_random_nonce(message_imprint: MessageImprint) -> Result<Self, der::Error> {
        Ok(Self::new(message_imprint, Some(random_nonce()?)))
    }

    pub fn to_der(&self) -> Result<Vec<u8>, der::Error> {
        Encode::to_der(self)
    }
}

/// PKIStatus values
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum PkiStatus {
    Granted = 0,
    GrantedWithMods = 1,
    Rejection = 2,
    Waiting = 3,
    RevocationWarning = 4,
    RevocationNotification = 5,
}

impl PkiStatus {
    const ALL: [PkiStatus; 6] = [
        PkiStatus::Granted,
        PkiStatus::GrantedWithMods,
        PkiStatus::Rejection,
        PkiStatus::Waiting,
        PkiStatus::RevocationWarning,
        PkiStatus::RevocationNotification,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|status| *status as u8 == code)
    }

    /// Wording used by `openssl ts -reply -text`
    pub fn label(&self) -> &'static str {
        match self {
            PkiStatus::Granted => "Granted.",
            PkiStatus::GrantedWithMods => "Granted with modifications.",
            PkiStatus::Rejection => "Rejected.",
            PkiStatus::Waiting => "Waiting.",
            PkiStatus::RevocationWarning => "Revocation warning.",
            PkiStatus::RevocationNotification => "Revoked.",
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, PkiStatus::Granted | PkiStatus::GrantedWithMods)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct PkiStatusInfo {
    pub status: u8,
    #[asn1(optional = "true")]
    pub fail_info: Option<BitString>,
}

impl PkiStatusInfo {
    pub fn status_enum(&self) -> Option<PkiStatus> {
        PkiStatus::from_code(self.status)
    }

    pub fn is_success(&self) -> bool {
        self.status_enum().is_some_and(|s| s.is_granted())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Accuracy {
    #[asn1(optional = "true")]
    pub seconds: Option<u64>,
    #[asn1(context_specific = "0", optional = "true")]
    pub millis: Option<u16>,
    #[asn1(context_specific = "1", optional = "true")]
    pub micros: Option<u16>,
}

/// TSTInfo, the content signed by the TSA (RFC 3161 §2.4.2)
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TstInfo {
    pub version: u8,
    pub policy: ObjectIdentifier,
    pub message_imprint: MessageImprint,
    pub serial_number: Int,
    /// The asserted time
    pub gen_time: GeneralizedTime,
    #[asn1(optional = "true")]
    pub accuracy: Option<Accuracy>,
    #[asn1(default = "boolean_false")]
    pub ordering: bool,
    #[asn1(optional = "true")]
    pub nonce: Option<Int>,
    #[asn1(context_specific = "0", optional = "true", tag_mode = "EXPLICIT")]
    pub tsa: Option<GeneralName>,
    #[asn1(context_specific = "1", optional = "true", tag_mode = "IMPLICIT")]
    pub extensions: Option<Extensions>,
}

impl TstInfo {
    pub fn from_der_bytes(bytes: &[u8]) -> Result<Self, der::Error> {
        Self::from_der(bytes)
    }
}

/// TimeStampResp; the token is kept as an opaque ContentInfo
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TimeStampResp {
    pub status: PkiStatusInfo,
    #[asn1(optional = "true")]
    pub time_stamp_token: Option<der::Any>,
}

impl TimeStampResp {
    pub fn from_der_bytes(bytes: &[u8]) -> Result<Self, der::Error> {
        Self::from_der(bytes)
    }

    /// Granted and actually carrying a token
    pub fn is_success(&self) -> bool {
        self.status.is_success() && self.time_stamp_token.is_some()
    }
}
