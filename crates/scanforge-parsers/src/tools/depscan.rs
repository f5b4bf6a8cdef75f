//! `dependency-scanner` parser (spec §4.5). Input:
//! `{"status": "no_manifest"}` when the repository has nothing to scan
//! (no `package.json`/`go.mod`/etc.), otherwise `{"vulnerabilities": [
//! {"package", "installed_version", "severity", "title",
//! "vulnerable_below"}]}`.

use serde::Deserialize;

use scanforge_core::{ScanDefinition, Vulnerability, VulnerabilityBucket};

use crate::output::ParserOutput;
use crate::severity;
use crate::ParseError;

#[derive(Deserialize)]
#[serde(untagged)]
enum Report {
    NoManifest { status: String },
    Findings { #[serde(default)] vulnerabilities: Vec<Finding> },
}

#[derive(Deserialize)]
struct Finding {
    package: String,
    #[serde(default)]
    installed_version: String,
    severity: String,
    title: String,
    #[serde(default)]
    vulnerable_below: String,
}

pub fn parse(raw_stdout: &str, _raw_stderr: &str, def: &ScanDefinition) -> Result<ParserOutput, ParseError> {
    let trimmed = raw_stdout.trim();
    if trimmed.is_empty() {
        return Ok(ParserOutput::NotApplicable);
    }

    let report: Report = serde_json::from_str(trimmed).map_err(|e| ParseError::Malformed {
        tool: def.name.clone(),
        reason: e.to_string(),
    })?;

    let findings = match report {
        Report::NoManifest { status } if status == "no_manifest" => return Ok(ParserOutput::NotApplicable),
        Report::NoManifest { .. } => Vec::new(),
        Report::Findings { vulnerabilities } => vulnerabilities,
    };

    let mut bucket = VulnerabilityBucket::default();
    for finding in findings {
        bucket.push(Vulnerability {
            language: def.language.clone(),
            security_tool: def.name.clone(),
            severity: severity::normalize(&finding.severity),
            title: finding.title,
            details: format!("{} is vulnerable below {}", finding.package, finding.vulnerable_below),
            file: String::new(),
            line: 0,
            code: String::new(),
            vuln_type: "dependency".to_string(),
            confidence: String::new(),
            version: finding.installed_version,
            vulnerable_below: finding.vulnerable_below,
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

    #[test]
    fn no_manifest_status_is_not_applicable() {
        let out = parse(r#"{"status": "no_manifest"}"#, "", &def("dependency-scanner")).expect("parse");
        assert_eq!(out, ParserOutput::NotApplicable);
    }

    #[test]
    fn empty_output_is_also_not_applicable() {
        let out = parse("", "", &def("dependency-scanner")).expect("parse");
        assert_eq!(out, ParserOutput::NotApplicable);
    }

    #[test]
    fn parses_vulnerable_dependency_findings() {
        let sample = r#"{"vulnerabilities": [
            {"package": "lodash", "installed_version": "4.17.15", "severity": "high",
             "title": "Prototype Pollution", "vulnerable_below": "4.17.21"}
        ]}"#;
        let out = parse(sample, "", &def("dependency-scanner")).expect("parse");
        match out {
            ParserOutput::Vulnerabilities(bucket) => {
                assert_eq!(bucket.high.len(), 1);
                assert_eq!(bucket.high[0].version, "4.17.15");
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }
}
