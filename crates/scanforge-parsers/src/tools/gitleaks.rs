//! `gitleaks` parser (spec §4.5). Input: `gitleaks detect --report-format
//! json`, a top-level array of leak records. Gitleaks does not report a
//! severity; every finding is tagged with `def.default_severity`.

use serde::Deserialize;

use scanforge_core::{ScanDefinition, Vulnerability, VulnerabilityBucket};

use crate::output::ParserOutput;
use crate::ParseError;

#[derive(Deserialize)]
struct Leak {
    #[serde(default)]
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "File")]
    file: String,
    #[serde(rename = "StartLine")]
    start_line: u32,
    #[serde(default)]
    #[serde(rename = "Rule")]
    rule: String,
}

pub fn parse(raw_stdout: &str, _raw_stderr: &str, def: &ScanDefinition) -> Result<ParserOutput, ParseError> {
    let trimmed = raw_stdout.trim();
    if trimmed.is_empty() {
        return Ok(ParserOutput::Vulnerabilities(VulnerabilityBucket::default()));
    }

    let leaks: Vec<Leak> = serde_json::from_str(trimmed).map_err(|e| ParseError::Malformed {
        tool: def.name.clone(),
        reason: e.to_string(),
    })?;

    let mut bucket = VulnerabilityBucket::default();
    for leak in leaks {
        bucket.push(Vulnerability {
            language: def.language.clone(),
            security_tool: def.name.clone(),
            severity: def.default_severity,
            title: leak.rule.clone(),
            details: leak.description,
            file: leak.file,
            line: leak.start_line,
            code: String::new(),
            vuln_type: leak.rule,
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

    const SAMPLE: &str = r#"[
        {"Description": "AWS Access Key", "File": "config.yml", "StartLine": 3, "Rule": "aws-access-key"}
    ]"#;

    #[test]
    fn uses_definition_default_severity_for_every_finding() {
        let out = parse(SAMPLE, "", &def("gitleaks")).expect("parse");
        match out {
            ParserOutput::Vulnerabilities(bucket) => {
                assert_eq!(bucket.high.len(), 1, "gitleaks built-in definition defaults to High");
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn empty_array_is_an_empty_bucket() {
        let out = parse("[]", "", &def("gitleaks")).expect("parse");
        assert_eq!(out, ParserOutput::Vulnerabilities(VulnerabilityBucket::default()));
    }
}
