//! `brakeman` parser (spec §4.5). Input: `brakeman -f json`,
//! `{"warnings": [{"warning_type", "message", "file", "line", "confidence",
//! "code"}]}`. Brakeman does not report a severity field; its `confidence`
//! (`High` / `Medium` / `Weak`) is used as the severity proxy.

use serde::Deserialize;

use scanforge_core::{ScanDefinition, Severity, Vulnerability, VulnerabilityBucket};

use crate::output::ParserOutput;
use crate::ParseError;

#[derive(Deserialize)]
struct Report {
    #[serde(default)]
    warnings: Vec<Warning>,
}

#[derive(Deserialize)]
struct Warning {
    warning_type: String,
    message: String,
    file: String,
    #[serde(default)]
    line: u32,
    confidence: String,
    #[serde(default)]
    code: String,
}

fn confidence_to_severity(raw: &str) -> Severity {
    match raw.trim().to_ascii_lowercase().as_str() {
        "high" => Severity::High,
        "medium" => Severity::Medium,
        "weak" => Severity::Low,
        _ => Severity::Info,
    }
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
    for warning in report.warnings {
        bucket.push(Vulnerability {
            language: def.language.clone(),
            security_tool: def.name.clone(),
            severity: confidence_to_severity(&warning.confidence),
            title: warning.warning_type.clone(),
            details: warning.message,
            file: warning.file,
            line: warning.line,
            code: warning.code,
            vuln_type: warning.warning_type,
            confidence: warning.confidence,
            version: String::new(),
            vulnerable_below: String::new(),
            occurrences: 1,
        });
    }
    bucket.sort_deterministic();
    Ok(ParserOutput::Vulnerabilities(bucket))
}
