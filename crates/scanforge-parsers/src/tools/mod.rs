//! One module per supported security tool (spec §4.5).

pub mod bandit;
pub mod brakeman;
pub mod commit_authors;
pub mod depscan;
pub mod eslint;
pub mod gitleaks;
pub mod gosec;
pub mod langdetect;
pub mod semgrep;
pub mod tfsec;

#[cfg(test)]
pub(crate) mod test_support {
    use scanforge_core::{ScanDefinition, Severity};

    /// A minimal `ScanDefinition` stand-in for parser unit tests; only
    /// `name`/`language`/`default_severity` are exercised by any parser.
    pub fn def(name: &str) -> ScanDefinition {
        ScanDefinition {
            name: name.to_string(),
            image: format!("scanforge/{name}"),
            image_tag: "test".to_string(),
            cmd: String::new(),
            language: "Generic".to_string(),
            default_severity: Severity::High,
            timeout_seconds: 300,
        }
    }
}
