//! Textual verification reports and time extraction
//!
//! Both verification engines describe the verified token in the layout of
//! `openssl ts -reply -text`. The asserted time is read back from that text,
//! so the canonical time comes from the same place whichever engine ran.

use crate::asn1::{hash_algorithm_for_oid, PkiStatus, TstInfo};
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use der::asn1::GeneralizedTime;
use regex::Regex;

/// Canonical output format of [`extract_time`]
pub const CANONICAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// Engine that accepted the token
    pub engine: &'static str,
    /// `openssl ts -reply -text` style description of the token
    pub text: String,
}

impl VerificationReport {
    pub fn new(engine: &'static str, text: impl Into<String>) -> Self {
        Self {
            engine,
            text: text.into(),
        }
    }
}

/// Format a genTime the way OpenSSL prints ASN.1 times
pub fn format_gen_time(time: &GeneralizedTime) -> Option<String> {
    let since_epoch = time.to_unix_duration();
    let secs = i64::try_from(since_epoch.as_secs()).ok()?;
    let time = DateTime::<Utc>::from_timestamp(secs, since_epoch.subsec_nanos())?;
    Some(time.format("%b %e %H:%M:%S %Y GMT").to_string())
}

/// Describe a granted response in the layout of `openssl ts -reply -text`
pub fn render_report(status: PkiStatus, tst_info: &TstInfo) -> String {
    let imprint = &tst_info.message_imprint;
    let algorithm = hash_algorithm_for_oid(&imprint.hash_algorithm.algorithm)
        .map(|a| a.name().to_string())
        .unwrap_or_else(|| imprint.hash_algorithm.algorithm.to_string());

    let time = format_gen_time(&tst_info.gen_time).unwrap_or_else(|| "unspecified".to_string());
    let accuracy = match &tst_info.accuracy {
        Some(accuracy) => format!(
            "0x{:02X} seconds, 0x{:03X} millis, 0x{:03X} micros",
            accuracy.seconds.unwrap_or(0),
            accuracy.millis.unwrap_or(0),
            accuracy.micros.unwrap_or(0)
        ),
        None => "unspecified".to_string(),
    };
    let nonce = match &tst_info.nonce {
        Some(nonce) => format!("0x{}", hex::encode_upper(nonce.as_bytes())),
        None => "unspecified".to_string(),
    };

    let lines = [
        "Status info:".to_string(),
        format!("Status: {}", status.label()),
        "Status description: unspecified".to_string(),
        "Failure info: unspecified".to_string(),
        String::new(),
        "TST info:".to_string(),
        format!("Version: {}", tst_info.version),
        format!("Policy OID: {}", tst_info.policy),
        format!("Hash Algorithm: {}", algorithm),
        "Message data:".to_string(),
        format!("    {}", hex::encode(imprint.hashed_message.as_bytes())),
        format!("Serial number: 0x{}", hex::encode_upper(tst_info.serial_number.as_bytes())),
        format!("Time stamp: {}", time),
        format!("Accuracy: {}", accuracy),
        format!("Ordering: {}", if tst_info.ordering { "yes" } else { "no" }),
        format!("Nonce: {}", nonce),
        format!("TSA: {}", if tst_info.tsa.is_some() { "present" } else { "unspecified" }),
    ];

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Read the `Time stamp:` line of a report as `YYYY-MM-DD HH:MM:SS` (UTC)
///
/// A report without a parseable time is an error. The current time is never
/// substituted.
pub fn extract_time(report: &str) -> Result<String> {
    let time_line = Regex::new(r"(?m)^[ \t]*Time stamp:[ \t]*(.+?)[ \t]*$")
        .map_err(|e| Error::TimeExtraction(e.to_string()))?;
    let raw = time_line
        .captures(report)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::TimeExtraction("no time stamp found in report".to_string()))?;

    let cleaned = raw
        .trim_end_matches("GMT")
        .trim_end_matches("UTC")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if let Ok(time) = NaiveDateTime::parse_from_str(&cleaned, "%b %d %H:%M:%S%.f %Y") {
        return Ok(time.format(CANONICAL_TIME_FORMAT).to_string());
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time
            .with_timezone(&Utc)
            .format(CANONICAL_TIME_FORMAT)
            .to_string());
    }

    Err(Error::TimeExtraction(format!(
        "unrecognized time stamp: {}",
        raw
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::MessageImprint;
    use der::asn1::Int;
    use eln_proof_types::{HashAlgorithm, HashOutput};
    use rstest::rstest;
    use std::time::Duration;

    fn tst_info(unix_secs: u64) -> TstInfo {
        TstInfo {
            version: 1,
            policy: const_oid::ObjectIdentifier::new_unwrap("1.3.6.1.4.1.22177.300.22.1"),
            message_imprint: MessageImprint::for_digest(&HashOutput::new(
                HashAlgorithm::Sha256,
                vec![0xab; 32],
            ))
            .unwrap(),
            serial_number: Int::new(&[0x01, 0x5f]).unwrap(),
            gen_time: GeneralizedTime::from_unix_duration(Duration::from_secs(unix_secs))
                .unwrap(),
            accuracy: None,
            ordering: false,
            nonce: None,
            tsa: None,
            extensions: None,
        }
    }

    #[test]
    fn test_rendered_report_roundtrips_time() {
        // 2024-03-01T10:00:00Z
        let text = render_report(PkiStatus::Granted, &tst_info(1_709_287_200));

        assert!(text.contains("Status: Granted."));
        assert!(text.contains("Hash Algorithm: sha256"));
        assert!(text.contains("Serial number: 0x015F"));
        assert!(text.contains("Time stamp: Mar  1 10:00:00 2024 GMT"));
        assert_eq!(extract_time(&text).unwrap(), "2024-03-01 10:00:00");
    }

    #[rstest]
    #[case("Time stamp: Mar  1 10:00:00 2024 GMT", "2024-03-01 10:00:00")]
    #[case("Time stamp: Dec 31 23:59:59.125 2023 GMT", "2023-12-31 23:59:59")]
    #[case("  Time stamp:   Jul 14 08:05:09 2025 UTC  ", "2025-07-14 08:05:09")]
    #[case("Time stamp: 2024-03-01T11:00:00+01:00", "2024-03-01 10:00:00")]
    fn test_extract_time(#[case] line: &str, #[case] expected: &str) {
        let report = format!("TST info:\nVersion: 1\n{}\nAccuracy: unspecified\n", line);
        assert_eq!(extract_time(&report).unwrap(), expected);
    }

    #[test]
    fn test_extract_time_output_shape() {
        let text = render_report(PkiStatus::GrantedWithMods, &tst_info(1_700_000_000));
        let time = extract_time(&text).unwrap();
        let shape = Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").unwrap();
        assert!(shape.is_match(&time), "{}", time);
    }

    #[test]
    fn test_missing_time_is_an_error() {
        let err = extract_time("Status info:\nStatus: Granted.\n").unwrap_err();
        assert!(matches!(err, Error::TimeExtraction(_)));
    }

    #[test]
    fn test_unparseable_time_is_an_error() {
        let err = extract_time("Time stamp: unspecified\n").unwrap_err();
        assert!(matches!(err, Error::TimeExtraction(_)));
    }
}
