//! Command templating (spec §4.3, REDESIGN FLAGS §9: "replace multi-pass
//! string substitution with a single template expansion function").

use std::collections::BTreeMap;

use regex::Regex;

/// Sentinel substituted for a placeholder whose configured value is unset
/// (spec §4.3).
pub const NIL_SENTINEL: &str = "nil";

/// Values available for placeholder substitution in a `ScanDefinition.cmd`.
#[derive(Debug, Clone, Default)]
pub struct TemplateValues {
    pub git_repo: Option<String>,
    pub git_branch: Option<String>,
    pub git_ssh_url: Option<String>,
    pub git_url_to_substitute: Option<String>,
    pub git_private_ssh_key: Option<String>,
}

fn placeholder_map(values: &TemplateValues) -> BTreeMap<&'static str, String> {
    let mut map = BTreeMap::new();
    // %GIT_REPO% / %GIT_BRANCH% are substituted only if *both* are present
    // (spec §4.3); otherwise they are left untouched for the next expansion
    // pass (e.g. archive mode rewrites the clone line before this one runs).
    if let (Some(repo), Some(branch)) = (&values.git_repo, &values.git_branch) {
        map.insert("%GIT_REPO%", repo.clone());
        map.insert("%GIT_BRANCH%", branch.clone());
    }
    map.insert(
        "%GIT_SSH_URL%",
        values.git_ssh_url.clone().unwrap_or_else(|| NIL_SENTINEL.to_string()),
    );
    map.insert(
        "%GIT_URL_TO_SUBSTITUTE%",
        values
            .git_url_to_substitute
            .clone()
            .unwrap_or_else(|| NIL_SENTINEL.to_string()),
    );
    map.insert(
        "%GIT_PRIVATE_SSH_KEY%",
        values
            .git_private_ssh_key
            .clone()
            .unwrap_or_else(|| NIL_SENTINEL.to_string()),
    );
    map
}

/// Rewrite any `git clone ... %GIT_REPO% ... code` line into a copy from the
/// staged workspace, per archive mode (spec §4.3).
fn rewrite_for_archive(cmd: &str) -> String {
    // Matches lines of the documented shape: `*git clone* %GIT_REPO%*code*`.
    let clone_line = Regex::new(r"(?m)^.*git clone.*%GIT_REPO%.*code.*$").expect("valid regex");
    clone_line
        .replace_all(
            cmd,
            "mkdir -p code && cp -r /workspace/. code/ 2>/dev/null || cp -r /workspace/* code/",
        )
        .into_owned()
}

/// Expand every placeholder in `cmd` against `values` in a single pass.
///
/// When `repository_url` has scheme `file://` (archive mode), the clone line
/// is rewritten to a copy first (spec §4.3), then remaining placeholders are
/// substituted literally.
pub fn expand(cmd: &str, values: &TemplateValues, repository_url: &str) -> String {
    let base = if repository_url.starts_with("file://") {
        rewrite_for_archive(cmd)
    } else {
        cmd.to_string()
    };

    let map = placeholder_map(values);
    let mut out = base;
    for (placeholder, value) in map {
        out = out.replace(placeholder, &value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_values() -> TemplateValues {
        TemplateValues {
            git_repo: Some("https://example.com/acme/svc.git".to_string()),
            git_branch: Some("main".to_string()),
            git_ssh_url: Some("ssh://git@example.com".to_string()),
            git_url_to_substitute: Some("https://internal.example.com".to_string()),
            git_private_ssh_key: Some("-----BEGIN KEY-----".to_string()),
        }
    }

    #[test]
    fn substitutes_repo_and_branch_when_both_present() {
        let cmd = "git clone %GIT_REPO% --branch %GIT_BRANCH% code";
        let out = expand(cmd, &full_values(), "https://example.com/acme/svc.git");
        assert_eq!(out, "git clone https://example.com/acme/svc.git --branch main code");
    }

    #[test]
    fn leaves_repo_branch_untouched_when_either_missing() {
        let cmd = "git clone %GIT_REPO% --branch %GIT_BRANCH% code";
        let values = TemplateValues {
            git_repo: Some("https://x/y.git".to_string()),
            git_branch: None,
            ..Default::default()
        };
        let out = expand(cmd, &values, "https://x/y.git");
        assert!(out.contains("%GIT_REPO%"));
        assert!(out.contains("%GIT_BRANCH%"));
    }

    #[test]
    fn unset_sentinel_values_become_nil() {
        let cmd = "export KEY=%GIT_PRIVATE_SSH_KEY% SUB=%GIT_URL_TO_SUBSTITUTE%";
        let out = expand(cmd, &TemplateValues::default(), "https://x/y.git");
        assert_eq!(out, "export KEY=nil SUB=nil");
    }

    #[test]
    fn archive_mode_rewrites_clone_line_then_substitutes_remaining_placeholders() {
        let cmd = "git clone %GIT_REPO% --branch %GIT_BRANCH% code\nexport SUB=%GIT_URL_TO_SUBSTITUTE%";
        let out = expand(cmd, &TemplateValues::default(), "file://zz1");
        assert!(out.contains("mkdir -p code && cp -r /workspace/. code/"));
        assert!(!out.contains("%GIT_REPO%"));
        assert!(out.contains("SUB=nil"));
    }

    #[test]
    fn template_expansion_is_idempotent_once_placeholders_are_gone() {
        let cmd = "run %GIT_SSH_URL%";
        let once = expand(cmd, &full_values(), "https://x/y.git");
        let twice = expand(&once, &full_values(), "https://x/y.git");
        assert_eq!(once, twice);
    }
}
