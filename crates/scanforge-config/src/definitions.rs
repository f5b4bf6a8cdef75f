//! The static scan-definition table (spec §4.3, §4.5 parser-table minimum).

use scanforge_core::{ScanDefinition, Severity};

const GIT_CLONE_LINE: &str =
    "git clone %GIT_REPO% --branch %GIT_BRANCH% code 2>/dev/null || git clone %GIT_REPO% code";

fn def(
    name: &str,
    image: &str,
    image_tag: &str,
    language: &str,
    default_severity: Severity,
    timeout_seconds: u64,
    run_cmd: &str,
) -> ScanDefinition {
    ScanDefinition {
        name: name.to_string(),
        image: image.to_string(),
        image_tag: image_tag.to_string(),
        cmd: format!("{GIT_CLONE_LINE} && cd code && {run_cmd}"),
        language: language.to_string(),
        default_severity,
        timeout_seconds,
    }
}

/// The process-wide, read-only scan-definition table loaded at startup
/// (spec §3: "process-wide read-only configuration loaded at startup and
/// reconciled into the Store").
pub fn builtin_scan_definitions() -> Vec<ScanDefinition> {
    vec![
        def(
            "language-detector",
            "scanforge/langdetect",
            "stable",
            "Generic",
            Severity::Info,
            60,
            "langdetect --json .",
        ),
        def(
            "commit-authors",
            "scanforge/gitutil",
            "stable",
            "Generic",
            Severity::Info,
            60,
            "git log --format='%an <%ae>' | sort -u",
        ),
        def(
            "bandit",
            "scanforge/bandit",
            "1.7",
            "Python",
            Severity::Low,
            300,
            "bandit -r -f json .",
        ),
        def(
            "gosec",
            "scanforge/gosec",
            "2.19",
            "Go",
            Severity::Medium,
            300,
            "gosec -fmt=json ./...",
        ),
        def(
            "eslint-security",
            "scanforge/eslint-security",
            "8",
            "JavaScript",
            Severity::Low,
            300,
            "eslint --format json .",
        ),
        def(
            "brakeman",
            "scanforge/brakeman",
            "6",
            "Ruby",
            Severity::Medium,
            300,
            "brakeman -f json .",
        ),
        def(
            "semgrep",
            "scanforge/semgrep",
            "1",
            "Generic",
            Severity::Info,
            600,
            "semgrep --json --config=auto .",
        ),
        def(
            "gitleaks",
            "scanforge/gitleaks",
            "8",
            "Generic",
            Severity::High,
            300,
            "gitleaks detect --report-format json --report-path -",
        ),
        def(
            "tfsec",
            "scanforge/tfsec",
            "1",
            "Generic",
            Severity::Medium,
            300,
            "tfsec --format json .",
        ),
        def(
            "dependency-scanner",
            "scanforge/depscan",
            "stable",
            "Generic",
            Severity::Medium,
            300,
            "depscan --json .",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_table_has_unique_names() {
        let defs = builtin_scan_definitions();
        let names: HashSet<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), defs.len());
    }

    #[test]
    fn includes_required_minimum_parser_coverage() {
        let defs = builtin_scan_definitions();
        let names: HashSet<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        for required in [
            "language-detector",
            "commit-authors",
            "bandit",
            "gosec",
            "eslint-security",
            "brakeman",
        ] {
            assert!(names.contains(required), "missing required tool {required}");
        }
        // At least one generic/secret/IaC/dependency scanner beyond the above.
        assert!(names.contains("semgrep") || names.contains("gitleaks") || names.contains("tfsec"));
    }

    #[test]
    fn generic_definitions_apply_regardless_of_language() {
        let defs = builtin_scan_definitions();
        for d in defs.iter().filter(|d| d.language == "Generic") {
            assert!(d.applies_to(&HashSet::new()));
        }
    }
}
