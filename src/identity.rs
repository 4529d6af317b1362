//! Works out which remote repository a directory belongs to.

use std::path::Path;

use crate::config::Config;
use crate::models::TargetIdentity;

/// Used when the working directory has no final path component (e.g. `/`)
pub const FALLBACK_REPO_NAME: &str = "repository";

/// Turn a directory name into a repository name: lower-case it, then collapse
/// every run of whitespace or underscores into a single hyphen.
#[must_use]
pub fn derive_repo_name(dir_name: &str) -> String {
    let mut name = String::with_capacity(dir_name.len());
    let mut in_separator_run = false;

    for c in dir_name.chars().flat_map(char::to_lowercase) {
        if c == '_' || c.is_whitespace() {
            if !in_separator_run {
                name.push('-');
                in_separator_run = true;
            }
        } else {
            name.push(c);
            in_separator_run = false;
        }
    }

    name
}

/// Repository name for `workdir`, preferring an explicit override.
#[must_use]
pub fn resolve_repo_name(explicit: Option<&str>, workdir: &Path) -> String {
    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    workdir
        .file_name()
        .map(|n| derive_repo_name(&n.to_string_lossy()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| FALLBACK_REPO_NAME.to_string())
}

/// Combine the repository name with the account, host and protocol from config.
#[must_use]
pub fn resolve(
    explicit: Option<&str>,
    workdir: &Path,
    account: &str,
    config: &Config,
) -> TargetIdentity {
    TargetIdentity {
        host: config.host.clone(),
        account: account.to_string(),
        repo_name: resolve_repo_name(explicit, workdir),
        protocol: config.protocol,
        base_url: config.base_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteProtocol;
    use std::path::PathBuf;

    #[test]
    fn test_derive_my_project() {
        assert_eq!(derive_repo_name("My Project"), "my-project");
    }

    #[test]
    fn test_derive_collapses_mixed_runs() {
        assert_eq!(derive_repo_name("Data__Set  _ Tools"), "data-set-tools");
        assert_eq!(derive_repo_name("Hyper2DRoPE_Tests"), "hyper2drope-tests");
        assert_eq!(derive_repo_name("already-fine"), "already-fine");
    }

    #[test]
    fn test_derive_is_idempotent() {
        for name in ["My Project", "a_b c", "  Leading", "UPPER__lower", "x-_-y", "Ünïcode Dir"] {
            let once = derive_repo_name(name);
            assert_eq!(derive_repo_name(&once), once, "not idempotent for {name:?}");
            assert!(!once.contains(' ') && !once.contains('_'));
            assert_eq!(once, once.to_lowercase());
        }
    }

    #[test]
    fn test_resolve_prefers_explicit_name() {
        let dir = PathBuf::from("/home/me/My Project");
        assert_eq!(resolve_repo_name(Some("Custom-Repo"), &dir), "Custom-Repo");
        assert_eq!(resolve_repo_name(Some("   "), &dir), "my-project");
        assert_eq!(resolve_repo_name(None, &dir), "my-project");
    }

    #[test]
    fn test_resolve_root_directory() {
        assert_eq!(resolve_repo_name(None, Path::new("/")), FALLBACK_REPO_NAME);
    }

    #[test]
    fn test_resolve_builds_expected_url() {
        let config = Config {
            host: "github.example.com".to_string(),
            protocol: RemoteProtocol::Ssh,
            ..Config::default()
        };
        let identity = resolve(None, Path::new("/work/Sync_Me"), "team", &config);
        assert_eq!(identity.repo_name, "sync-me");
        assert_eq!(identity.remote_url(), "git@github.example.com:team/sync-me.git");
    }
}
