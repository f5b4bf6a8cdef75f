//! `eslint-security` parser (spec §4.5). Input: `eslint --format json`,
//! a top-level array of per-file results each carrying a `messages` array.
//! ESLint's numeric severity (`1` = warn, `2` = error) is mapped directly
//! rather than through the textual [`crate::severity::normalize`] table.

use serde::Deserialize;

use scanforge_core::{ScanDefinition, Severity, Vulnerability, VulnerabilityBucket};

use crate::output::ParserOutput;
use crate::ParseError;

#[derive(Deserialize)]
struct FileResult {
    #[serde(rename = "filePath")]
    file_path: String,
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    #[serde(rename = "ruleId")]
    rule_id: Option<String>,
    message: String,
    #[serde(default)]
    line: u32,
    severity: u8,
}

fn eslint_severity(level: u8) -> Severity {
    match level {
        2 => Severity::High,
        1 => Severity::Medium,
        _ => Severity::Info,
    }
}

pub fn parse(raw_stdout: &str, _raw_stderr: &str, def: &ScanDefinition) -> Result<ParserOutput, ParseError> {
    let trimmed = raw_stdout.trim();
    if trimmed.is_empty() {
        return Ok(ParserOutput::Vulnerabilities(VulnerabilityBucket::default()));
    }

    let files: Vec<FileResult> = serde_json::from_str(trimmed).map_err(|e| ParseError::Malformed {
        tool: def.name.clone(),
        reason: e.to_string(),
    })?;

    let mut bucket = VulnerabilityBucket::default();
    for file in files {
        for message in file.messages {
            let rule = message.rule_id.unwrap_or_else(|| "unknown-rule".to_string());
            bucket.push(Vulnerability {
                language: def.language.clone(),
                security_tool: def.name.clone(),
                severity: eslint_severity(message.severity),
                title: rule.clone(),
                details: message.message,
                file: file.file_path.clone(),
                line: message.line,
                code: String::new(),
                vuln_type: rule,
                confidence: String::new(),
                version: String::new(),
                vulnerable_below: String::new(),
                occurrences: 1,
            });
        }
    }
    bucket.sort_deterministic();
    Ok(ParserOutput::Vulnerabilities(bucket))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::def;

    const SAMPLE: &str = r#"[
        {"filePath": "src/app.js", "messages": [
            {"ruleId": "security/detect-eval-with-expression", "message": "eval is unsafe", "line": 7, "severity": 2}
        ]}
    ]"#;

    #[test]
    fn maps_numeric_severity_two_to_high() {
        let out = parse(SAMPLE, "", &def("eslint-security")).expect("parse");
        match out {
            ParserOutput::Vulnerabilities(bucket) => assert_eq!(bucket.high.len(), 1),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn empty_output_is_an_empty_bucket() {
        let out = parse("", "", &def("eslint-security")).expect("parse");
        assert_eq!(out, ParserOutput::Vulnerabilities(VulnerabilityBucket::default()));
    }
}
