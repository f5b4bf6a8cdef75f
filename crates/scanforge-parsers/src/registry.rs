//! Lookup of parser implementations keyed by `ScanDefinition.name` (spec
//! §4.5: "one parser per tool name, registered in a lookup table").

use std::collections::BTreeMap;
use std::sync::OnceLock;

use scanforge_core::ScanDefinition;

use crate::output::ParserOutput;
use crate::tools;
use crate::ParseError;

type ParserFn = fn(&str, &str, &ScanDefinition) -> Result<ParserOutput, ParseError>;

fn table() -> &'static BTreeMap<&'static str, ParserFn> {
    static TABLE: OnceLock<BTreeMap<&'static str, ParserFn>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut m: BTreeMap<&'static str, ParserFn> = BTreeMap::new();
        m.insert("language-detector", tools::langdetect::parse);
        m.insert("commit-authors", tools::commit_authors::parse);
        m.insert("bandit", tools::bandit::parse);
        m.insert("gosec", tools::gosec::parse);
        m.insert("eslint-security", tools::eslint::parse);
        m.insert("brakeman", tools::brakeman::parse);
        m.insert("semgrep", tools::semgrep::parse);
        m.insert("gitleaks", tools::gitleaks::parse);
        m.insert("tfsec", tools::tfsec::parse);
        m.insert("dependency-scanner", tools::depscan::parse);
        m
    })
}

/// Parse `raw_stdout`/`raw_stderr` from running `def` into a [`ParserOutput`].
/// There is no generic fallback: a `ScanDefinition.name` without a
/// registered parser is a configuration bug, surfaced as `Malformed`
/// rather than silently skipped.
pub fn parse(raw_stdout: &str, raw_stderr: &str, def: &ScanDefinition) -> Result<ParserOutput, ParseError> {
    match table().get(def.name.as_str()) {
        Some(parser) => parser(raw_stdout, raw_stderr, def),
        None => Err(ParseError::Malformed {
            tool: def.name.clone(),
            reason: "no parser registered for this scan definition".to_string(),
        }),
    }
}
