//! `tfsec` parser (spec §4.5). Input: `tfsec --format json`,
//! `{"results": [{"rule_id", "description", "severity",
//! "location": {"filename", "start_line"}}]}`.

use serde::Deserialize;

use scanforge_core::{ScanDefinition, Vulnerability, VulnerabilityBucket};

use crate::output::ParserOutput;
use crate::sanitize;
use crate::severity;
use crate::ParseError;

#[derive(Deserialize)]
struct Report {
    #[serde(default)]
    results: Vec<Finding>,
}

#[derive(Deserialize)]
struct Finding {
    rule_id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    severity: String,
    location: Location,
}

#[derive(Deserialize)]
struct Location {
    filename: String,
    start_line: u32,
}

/// tfsec's JSON report is sometimes relayed through a CI log collector that
/// re-escapes it; unescape once before parsing, which is a no-op on
/// already-clean JSON (spec §4.5 escaped-JSON sanitization).
pub fn parse(raw_stdout: &str, _raw_stderr: &str, def: &ScanDefinition) -> Result<ParserOutput, ParseError> {
    let trimmed = raw_stdout.trim();
    if trimmed.is_empty() {
        return Ok(ParserOutput::Vulnerabilities(VulnerabilityBucket::default()));
    }

    let cleaned = sanitize::unescape_one_level(trimmed);
    let report: Report = serde_json::from_str(&cleaned).map_err(|e| ParseError::Malformed {
        tool: def.name.clone(),
        reason: e.to_string(),
    })?;

    let mut bucket = VulnerabilityBucket::default();
    for finding in report.results {
        bucket.push(Vulnerability {
            language: def.language.clone(),
            security_tool: def.name.clone(),
            severity: severity::normalize(&finding.severity),
            title: finding.rule_id.clone(),
            details: finding.description,
            file: finding.location.filename,
            line: finding.location.start_line,
            code: String::new(),
            vuln_type: finding.rule_id,
            confidence: String::new(),
            version: String::new(),
            vulnerable_below: String::new(),
            occurrences: 1,
        });
    }
    bucket.sort_deterministic();
    Ok(ParserOutput::Vulnerabilities(bucket))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::def;

    const SAMPLE: &str = r#"{
        "results": [
            {"rule_id": "aws-s3-enable-bucket-encryption", "description": "Bucket lacks encryption",
             "severity": "HIGH", "location": {"filename": "main.tf", "start_line": 5}}
        ]
    }"#;

    #[test]
    fn parses_plain_json() {
        let out = parse(SAMPLE, "", &def("tfsec")).expect("parse");
        match out {
            ParserOutput::Vulnerabilities(bucket) => assert_eq!(bucket.high.len(), 1),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn parses_double_escaped_json_the_same_way() {
        let escaped = SAMPLE.replace('\\', "\\\\").replace('"', "\\\"");
        let out = parse(&escaped, "", &def("tfsec")).expect("parse");
        match out {
            ParserOutput::Vulnerabilities(bucket) => assert_eq!(bucket.high.len(), 1),
            other => panic!("unexpected output: {other:?}"),
        }
    }
}
