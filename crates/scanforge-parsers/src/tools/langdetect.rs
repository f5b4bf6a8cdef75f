//! `language-detector` parser (spec §4.4 `LanguageDetector`, §4.5).
//!
//! Expects `raw_stdout` to be a JSON object mapping a language name to the
//! list of files detected in that language, e.g. `{"Go": ["main.go"]}`.

use std::collections::BTreeMap;

use scanforge_core::ScanDefinition;

use crate::output::ParserOutput;
use crate::ParseError;

pub fn parse(raw_stdout: &str, _raw_stderr: &str, def: &ScanDefinition) -> Result<ParserOutput, ParseError> {
    let trimmed = raw_stdout.trim();
    if trimmed.is_empty() {
        return Ok(ParserOutput::Languages(BTreeMap::new()));
    }

    let parsed: BTreeMap<String, Vec<String>> = serde_json::from_str(trimmed).map_err(|e| ParseError::Malformed {
        tool: def.name.clone(),
        reason: e.to_string(),
    })?;

    Ok(ParserOutput::Languages(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::def;

    #[test]
    fn parses_language_to_files_map() {
        let out = parse(r#"{"Go": ["main.go", "util.go"], "Python": ["s.py"]}"#, "", &def("language-detector"))
            .expect("parse");
        match out {
            ParserOutput::Languages(map) => {
                assert_eq!(map.get("Go").unwrap().len(), 2);
                assert_eq!(map.get("Python").unwrap(), &vec!["s.py".to_string()]);
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn empty_output_is_an_empty_map_not_an_error() {
        let out = parse("  \n", "", &def("language-detector")).expect("parse");
        assert_eq!(out, ParserOutput::Languages(BTreeMap::new()));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = parse("not json", "", &def("language-detector"));
        assert!(matches!(result, Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn is_idempotent() {
        let raw = r#"{"Go": ["main.go"]}"#;
        assert_eq!(
            parse(raw, "", &def("language-detector")).unwrap(),
            parse(raw, "", &def("language-detector")).unwrap()
        );
    }
}
