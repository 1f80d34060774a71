//! Native RFC 3161 response verification
//!
//! Checks, in order:
//! - the PKI status of the response
//! - the TSTInfo message imprint against the submitted digest
//! - the CMS message-digest attribute and the signer's signature
//! - the TSA certificate chain, with the TimeStamping EKU, at genTime
//!
//! Failures caused by what this engine cannot parse or compute rather than
//! by the proof itself are reported as [`FailureKind::KnownInterop`].

use crate::asn1::{self, hash_algorithm_for_oid, TimeStampResp, TstInfo};
use crate::certs::CertificateChain;
use crate::report::{render_report, VerificationReport};
use crate::validator::{ProofInput, ProofVerifier, VerifyFailure};
use aws_lc_rs::signature::VerificationAlgorithm;
use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier, SignerInfo};
use const_oid::ObjectIdentifier;
use eln_proof_types::HashOutput;
use rustls_pki_types::{CertificateDer, UnixTime};
use webpki::{anchor_from_trusted_cert, EndEntityCert, KeyUsage, ALL_VERIFICATION_ALGS};
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;

type VerifyResult<T> = std::result::Result<T, VerifyFailure>;

static ID_KP_TIME_STAMPING: ObjectIdentifier = const_oid::db::rfc5280::ID_KP_TIME_STAMPING;
const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");
const OID_MESSAGE_DIGEST: ObjectIdentifier = const_oid::db::rfc6268::ID_MESSAGE_DIGEST;
const OID_SUBJECT_KEY_IDENTIFIER: ObjectIdentifier = const_oid::db::rfc5280::ID_CE_SUBJECT_KEY_IDENTIFIER;
const OID_EC_PUBLIC_KEY: ObjectIdentifier = const_oid::db::rfc5912::ID_EC_PUBLIC_KEY;
const OID_RSA_ENCRYPTION: ObjectIdentifier = const_oid::db::rfc5912::RSA_ENCRYPTION;
const OID_SECP256R1: ObjectIdentifier = const_oid::db::rfc5912::SECP_256_R_1;
const OID_SECP384R1: ObjectIdentifier = const_oid::db::rfc5912::SECP_384_R_1;

/// Verification engine built on `cms`, `aws-lc-rs` and `rustls-webpki`
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeVerifier;

impl NativeVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Verify a DER TimeStampResp over `digest` against a loaded chain
    pub fn verify_response(
        &self,
        response: &[u8],
        digest: &HashOutput,
        chain: &CertificateChain,
    ) -> VerifyResult<VerificationReport> {
        tracing::debug!("starting native timestamp verification");

        let resp = TimeStampResp::from_der_bytes(response)
            .map_err(|e| classify_decode("TimeStampResp", response, e))?;

        let status = resp.status.status_enum().ok_or_else(|| {
            VerifyFailure::invalid(format!("unknown PKI status {}", resp.status.status))
        })?;
        if !resp.status.is_success() {
            return Err(VerifyFailure::invalid(format!(
                "timestamp request not granted: {}",
                status.label()
            )));
        }

        let token = resp
            .time_stamp_token
            .ok_or_else(|| VerifyFailure::invalid("response carries no timeStampToken"))?;
        let token_der = token
            .to_der()
            .map_err(|e| VerifyFailure::invalid(format!("failed to re-encode token: {}", e)))?;
        let content_info = ContentInfo::from_der(&token_der)
            .map_err(|e| classify_decode("ContentInfo", &token_der, e))?;

        if content_info.content_type != ID_SIGNED_DATA {
            return Err(VerifyFailure::invalid("token content type is not SignedData"));
        }

        let signed_data_der = content_info
            .content
            .to_der()
            .map_err(|e| VerifyFailure::invalid(format!("failed to encode SignedData: {}", e)))?;
        let signed_data = SignedData::from_der(&signed_data_der)
            .map_err(|e| classify_decode("SignedData", &signed_data_der, e))?;

        if signed_data.encap_content_info.econtent_type != asn1::OID_TST_INFO {
            return Err(VerifyFailure::invalid("encapsulated content is not TSTInfo"));
        }

        let tst_info_der = signed_data
            .encap_content_info
            .econtent
            .as_ref()
            .ok_or_else(|| VerifyFailure::invalid("token has no TSTInfo"))?
            .value();

        // A well-formed SignedData around an undecodable TSTInfo is usually a
        // genTime with fractional seconds, which strict DER decoding refuses.
        let tst_info = TstInfo::from_der_bytes(tst_info_der).map_err(|e| {
            VerifyFailure::known_interop(format!("failed to decode TSTInfo: {}", e))
        })?;

        verify_message_imprint(&tst_info, digest)?;

        let signer_info = signed_data
            .signer_infos
            .0
            .get(0)
            .ok_or_else(|| VerifyFailure::invalid("no signer info found"))?;
        let embedded = extract_certificates(&signed_data);
        let signer_cert = find_signer_certificate(&signer_info.sid, &embedded)?;

        verify_signer_info(signer_info, tst_info_der, &signer_cert)?;

        let gen_time = UnixTime::since_unix_epoch(tst_info.gen_time.to_unix_duration());
        validate_tsa_certificate_chain(&signer_cert, &embedded, chain, gen_time)?;

        tracing::debug!("native timestamp verification succeeded");
        Ok(VerificationReport::new(
            self.name(),
            render_report(status, &tst_info),
        ))
    }
}

impl ProofVerifier for NativeVerifier {
    fn name(&self) -> &'static str {
        "native"
    }

    fn verify(&self, input: &ProofInput<'_>) -> VerifyResult<VerificationReport> {
        let chain = CertificateChain::load(input.chain_path)
            .map_err(|e| VerifyFailure::unavailable(e.to_string()))?;
        self.verify_response(input.token, input.digest, &chain)
    }
}

/// Indefinite-length BER is valid for CMS but refused by the DER decoder
fn is_indefinite_length(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x30 && bytes[1] == 0x80
}

/// BER encodings the DER decoder refuses although the token may be sound
fn is_ber_only(kind: der::ErrorKind) -> bool {
    matches!(
        kind,
        der::ErrorKind::IndefiniteLength
            | der::ErrorKind::SetDuplicate
            | der::ErrorKind::SetOrdering
            | der::ErrorKind::Noncanonical { .. }
    )
}

fn classify_decode(what: &str, bytes: &[u8], e: der::Error) -> VerifyFailure {
    let message = format!("failed to decode {}: {}", what, e);
    if is_ber_only(e.kind()) || is_indefinite_length(bytes) {
        VerifyFailure::known_interop(message)
    } else {
        VerifyFailure::invalid(message)
    }
}

/// The imprint must be the digest that was submitted, under the same algorithm
fn verify_message_imprint(tst_info: &TstInfo, digest: &HashOutput) -> VerifyResult<()> {
    let imprint = &tst_info.message_imprint;
    let algorithm = hash_algorithm_for_oid(&imprint.hash_algorithm.algorithm).ok_or_else(|| {
        VerifyFailure::invalid(format!(
            "unsupported imprint algorithm: {}",
            imprint.hash_algorithm.algorithm
        ))
    })?;

    if algorithm != digest.algorithm {
        return Err(VerifyFailure::invalid(format!(
            "imprint algorithm {} does not match requested {}",
            algorithm, digest.algorithm
        )));
    }

    let expected = imprint.hashed_message.as_bytes();
    if expected != digest.digest.as_slice() {
        return Err(VerifyFailure::invalid(format!(
            "message imprint mismatch: token has {}, document has {}",
            hex::encode(expected),
            digest.to_hex()
        )));
    }
    Ok(())
}

fn extract_certificates(signed_data: &SignedData) -> Vec<Certificate> {
    let mut certificates = Vec::new();
    if let Some(cert_set) = &signed_data.certificates {
        for choice in cert_set.0.iter() {
            match choice {
                CertificateChoices::Certificate(cert) => certificates.push(cert.clone()),
                CertificateChoices::Other(_) => {
                    tracing::debug!("skipping non-standard certificate format");
                }
            }
        }
    }
    certificates
}

fn find_signer_certificate(
    signer_id: &SignerIdentifier,
    certificates: &[Certificate],
) -> VerifyResult<Certificate> {
    let found = match signer_id {
        SignerIdentifier::IssuerAndSerialNumber(issuer_serial) => certificates.iter().find(|cert| {
            cert.tbs_certificate.issuer == issuer_serial.issuer
                && cert.tbs_certificate.serial_number == issuer_serial.serial_number
        }),
        SignerIdentifier::SubjectKeyIdentifier(ski) => certificates.iter().find(|cert| {
            cert.tbs_certificate
                .extensions
                .iter()
                .flatten()
                .filter(|ext| ext.extn_id == OID_SUBJECT_KEY_IDENTIFIER)
                .filter_map(|ext| {
                    x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(ext.extn_value.as_bytes())
                        .ok()
                })
                .any(|cert_ski| &cert_ski == ski)
        }),
    };

    found.cloned().ok_or_else(|| {
        VerifyFailure::invalid("token does not embed the signing certificate")
    })
}

/// Check the message-digest attribute and the signature over the signed attributes
fn verify_signer_info(
    signer_info: &SignerInfo,
    tst_info_der: &[u8],
    signer_cert: &Certificate,
) -> VerifyResult<()> {
    use x509_cert::der::asn1::{OctetStringRef, SetOfVec};

    let digest_oid = signer_info.digest_alg.oid;
    let digest_algorithm = hash_algorithm_for_oid(&digest_oid).ok_or_else(|| {
        VerifyFailure::known_interop(format!("unsupported signer digest algorithm: {}", digest_oid))
    })?;

    let signed_attrs = signer_info
        .signed_attrs
        .as_ref()
        .ok_or_else(|| VerifyFailure::invalid("no signed attributes found"))?;

    let attr = signed_attrs
        .iter()
        .find(|attr| attr.oid == OID_MESSAGE_DIGEST)
        .ok_or_else(|| VerifyFailure::invalid("message-digest attribute not found"))?;
    if attr.values.len() != 1 {
        return Err(VerifyFailure::invalid(
            "message-digest attribute should have exactly one value",
        ));
    }
    let value_der = attr
        .values
        .get(0)
        .ok_or_else(|| VerifyFailure::invalid("message-digest attribute has no value"))?
        .to_der()
        .map_err(|e| VerifyFailure::invalid(format!("failed to encode message-digest: {}", e)))?;
    let message_digest = OctetStringRef::from_der(&value_der)
        .map_err(|e| VerifyFailure::invalid(format!("message-digest is not an OCTET STRING: {}", e)))?;

    let content_digest = eln_proof_crypto::digest(digest_algorithm, tst_info_der);
    if content_digest.digest.as_slice() != message_digest.as_bytes() {
        return Err(VerifyFailure::invalid(format!(
            "message-digest attribute mismatch: expected {}, computed {}",
            hex::encode(message_digest.as_bytes()),
            content_digest.to_hex()
        )));
    }

    // Signed attributes are stored [0] IMPLICIT but signed as a SET OF.
    let attrs: Vec<x509_cert::attr::Attribute> = signed_attrs.iter().cloned().collect();
    let signed_bytes = SetOfVec::try_from(attrs)
        .and_then(|set| set.to_der())
        .map_err(|e| VerifyFailure::invalid(format!("failed to re-encode signed attributes: {}", e)))?;

    let algorithm = signature_algorithm(signer_cert, &digest_oid)?;
    let spki = &signer_cert.tbs_certificate.subject_public_key_info;
    let public_key = spki
        .subject_public_key
        .as_bytes()
        .ok_or_else(|| VerifyFailure::invalid("invalid public key encoding"))?;

    aws_lc_rs::signature::UnparsedPublicKey::new(algorithm, public_key)
        .verify(&signed_bytes, signer_info.signature.as_bytes())
        .map_err(|_| VerifyFailure::invalid("signature verification failed"))
}

/// Pick the verification algorithm from the signer key and digest
fn signature_algorithm(
    cert: &Certificate,
    digest_oid: &ObjectIdentifier,
) -> VerifyResult<&'static dyn VerificationAlgorithm> {
    use aws_lc_rs::signature::{
        ECDSA_P256_SHA256_ASN1, ECDSA_P256_SHA384_ASN1, ECDSA_P384_SHA256_ASN1,
        ECDSA_P384_SHA384_ASN1, RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384,
        RSA_PKCS1_2048_8192_SHA512,
    };

    let spki = &cert.tbs_certificate.subject_public_key_info;
    let key_oid = spki.algorithm.oid;

    if key_oid == OID_RSA_ENCRYPTION {
        return match *digest_oid {
            asn1::OID_SHA256 => Ok(&RSA_PKCS1_2048_8192_SHA256),
            asn1::OID_SHA384 => Ok(&RSA_PKCS1_2048_8192_SHA384),
            asn1::OID_SHA512 => Ok(&RSA_PKCS1_2048_8192_SHA512),
            _ => Err(VerifyFailure::known_interop(format!(
                "unsupported RSA digest: {}",
                digest_oid
            ))),
        };
    }

    if key_oid != OID_EC_PUBLIC_KEY {
        return Err(VerifyFailure::known_interop(format!(
            "unsupported signer key algorithm: {}",
            key_oid
        )));
    }

    let curve = spki
        .algorithm
        .parameters
        .as_ref()
        .ok_or_else(|| VerifyFailure::invalid("missing EC curve parameters"))?
        .decode_as::<ObjectIdentifier>()
        .map_err(|e| VerifyFailure::invalid(format!("failed to decode curve OID: {}", e)))?;

    match (curve, *digest_oid) {
        (OID_SECP256R1, asn1::OID_SHA256) => Ok(&ECDSA_P256_SHA256_ASN1),
        (OID_SECP256R1, asn1::OID_SHA384) => Ok(&ECDSA_P256_SHA384_ASN1),
        (OID_SECP384R1, asn1::OID_SHA256) => Ok(&ECDSA_P384_SHA256_ASN1),
        (OID_SECP384R1, asn1::OID_SHA384) => Ok(&ECDSA_P384_SHA384_ASN1),
        _ => Err(VerifyFailure::known_interop(format!(
            "unsupported curve/digest combination: {} / {}",
            curve, digest_oid
        ))),
    }
}

fn validate_tsa_certificate_chain(
    signer_cert: &Certificate,
    embedded: &[Certificate],
    chain: &CertificateChain,
    at: UnixTime,
) -> VerifyResult<()> {
    let signer_der = signer_cert
        .to_der()
        .map(CertificateDer::from)
        .map_err(|e| VerifyFailure::invalid(format!("failed to encode signer certificate: {}", e)))?;
    let end_entity = EndEntityCert::try_from(&signer_der).map_err(|e| {
        VerifyFailure::invalid(format!("failed to parse signer certificate: {:?}", e))
    })?;

    let anchors = chain
        .roots()
        .iter()
        .map(|cert| {
            anchor_from_trusted_cert(cert)
                .map(|anchor| anchor.to_owned())
                .map_err(|e| VerifyFailure::unavailable(format!("unusable trust anchor: {:?}", e)))
        })
        .collect::<VerifyResult<Vec<_>>>()?;

    let mut intermediates: Vec<CertificateDer<'static>> = embedded
        .iter()
        .filter(|cert| *cert != signer_cert)
        .filter_map(|cert| cert.to_der().ok())
        .map(CertificateDer::from)
        .collect();
    intermediates.extend(chain.intermediates().iter().cloned());

    tracing::debug!(
        anchors = anchors.len(),
        intermediates = intermediates.len(),
        "validating TSA certificate chain"
    );

    end_entity
        .verify_for_usage(
            ALL_VERIFICATION_ALGS,
            &anchors,
            &intermediates,
            at,
            KeyUsage::required(ID_KP_TIME_STAMPING.as_bytes()),
            None,
            None,
        )
        .map(|_| ())
        .map_err(|e| {
            let message = format!("TSA certificate chain validation failed: {:?}", e);
            if message.contains("UnsupportedSignatureAlgorithm") {
                VerifyFailure::known_interop(message)
            } else {
                VerifyFailure::invalid(message)
            }
        })
}
