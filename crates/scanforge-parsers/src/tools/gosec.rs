//! `gosec` parser (spec §4.5). Input: `gosec -fmt=json` report,
//! `{"Issues": [{"severity", "confidence", "rule_id", "details", "file",
//! "line", "code"}]}`. gosec reports `line` as a string (sometimes a
//! `"10-14"` range), so it is parsed leniently, falling back to `0`.

use serde::Deserialize;

use scanforge_core::{ScanDefinition, Vulnerability, VulnerabilityBucket};

use crate::output::ParserOutput;
use crate::severity;
use crate::ParseError;

#[derive(Deserialize)]
struct Report {
    #[serde(default, rename = "Issues")]
    issues: Vec<Issue>,
}

#[derive(Deserialize)]
struct Issue {
    severity: String,
    #[serde(default)]
    confidence: String,
    rule_id: String,
    details: String,
    file: String,
    line: String,
    #[serde(default)]
    code: String,
}

fn leading_line_number(raw: &str) -> u32 {
    raw.split(['-', ':']).next().and_then(|s| s.trim().parse().ok()).unwrap_or(0)
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
    for issue in report.issues {
        bucket.push(Vulnerability {
            language: def.language.clone(),
            security_tool: def.name.clone(),
            severity: severity::normalize(&issue.severity),
            title: issue.rule_id.clone(),
            details: issue.details,
            file: issue.file,
            line: leading_line_number(&issue.line),
            code: issue.code,
            vuln_type: issue.rule_id,
            confidence: issue.confidence,
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
        "Issues": [
            {"severity": "HIGH", "confidence": "HIGH", "rule_id": "G101",
             "details": "Potential hardcoded credentials", "file": "main.go",
             "line": "10-12", "code": "password := \"hunter2\""}
        ]
    }"#;

    #[test]
    fn parses_range_style_line_numbers() {
        let out = parse(SAMPLE, "", &def("gosec")).expect("parse");
        match out {
            ParserOutput::Vulnerabilities(bucket) => {
                assert_eq!(bucket.high[0].line, 10);
                assert_eq!(bucket.high[0].title, "G101");
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn empty_output_is_an_empty_bucket() {
        let out = parse("   ", "", &def("gosec")).expect("parse");
        assert_eq!(out, ParserOutput::Vulnerabilities(VulnerabilityBucket::default()));
    }
}
