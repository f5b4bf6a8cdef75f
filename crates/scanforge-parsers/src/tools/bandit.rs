//! `bandit` parser (spec §4.5). Input: bandit's `-f json` report,
//! `{"results": [{"filename", "line_number", "issue_severity",
//! "issue_confidence", "issue_text", "test_id", "test_name"}]}`.

use serde::Deserialize;

use scanforge_core::{ScanDefinition, Vulnerability, VulnerabilityBucket};

use crate::output::ParserOutput;
use crate::severity;
use crate::ParseError;

#[derive(Deserialize)]
struct Report {
    #[serde(default)]
    results: Vec<Finding>,
}

#[derive(Deserialize)]
struct Finding {
    filename: String,
    line_number: u32,
    issue_severity: String,
    #[serde(default)]
    issue_confidence: String,
    issue_text: String,
    #[serde(default)]
    test_id: String,
    #[serde(default)]
    test_name: String,
    #[serde(default)]
    code: String,
}

pub fn parse(raw_stdout: &str, _raw_stderr: &str, def: &ScanDefinition) -> Result<ParserOutput, ParseError> {
    let trimmed = raw_stdout.trim();
    if trimmed.is_empty() {
        return Ok(ParserOutput::Vulnerabilities(VulnerabilityBucket::default()));
    }

    let report: Report = serde_json::from_str(trimmed).map_err(|e| ParseError::Malformed {
        tool: def.name.clone(),
        reason: e.to_string(),
    })?;

    let mut bucket = VulnerabilityBucket::default();
    for finding in report.results {
        bucket.push(Vulnerability {
            language: def.language.clone(),
            security_tool: def.name.clone(),
            severity: severity::normalize(&finding.issue_severity),
            title: if finding.test_name.is_empty() { finding.test_id.clone() } else { finding.test_name },
            details: finding.issue_text,
            file: finding.filename,
            line: finding.line_number,
            code: finding.code,
            vuln_type: finding.test_id,
            confidence: finding.issue_confidence,
            version: String::new(),
            vulnerable_below: String::new(),
            occurrences: 1,
        });
    }
    bucket.sort_deterministic();
    Ok(ParserOutput::Vulnerabilities(bucket))
}
