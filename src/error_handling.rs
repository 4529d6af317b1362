use std::fmt;
use std::path::Path;

use crate::error::SyncError;
use crate::ui;

/// Why a git network or merge operation failed, read from its stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Authentication,
    NotFound,
    Network,
    Diverged,
    Conflict,
    Other,
}

impl FailureReason {
    #[must_use]
    pub fn classify(stderr: &str) -> Self {
        let lower = stderr.to_lowercase();
        if lower.contains("permission denied")
            || lower.contains("publickey")
            || lower.contains("authentication failed")
            || lower.contains("could not read username")
            || lower.contains("terminal prompts disabled")
        {
            Self::Authentication
        } else if lower.contains("not found")
            || lower.contains("does not exist")
            || lower.contains("does not appear to be a git repository")
        {
            Self::NotFound
        } else if lower.contains("rejected")
            || lower.contains("non-fast-forward")
            || lower.contains("fetch first")
            || lower.contains("divergent branches")
            || lower.contains("unrelated histories")
        {
            Self::Diverged
        } else if lower.contains("conflict") || lower.contains("would be overwritten") {
            Self::Conflict
        } else if lower.contains("could not resolve host")
            || lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("network")
            || lower.contains("unable to access")
        {
            Self::Network
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Authentication => "authentication failed",
            Self::NotFound => "remote repository not found",
            Self::Network => "network error",
            Self::Diverged => "histories have diverged",
            Self::Conflict => "local changes conflict",
            Self::Other => "unclassified failure",
        };
        f.write_str(text)
    }
}

/// Fix-it suggestions for a classified failure
fn suggestions(reason: FailureReason, remote_url: &str) -> Vec<String> {
    match reason {
        FailureReason::Authentication => vec![
            "Test SSH connection: ssh -T git@github.com".to_string(),
            "Or sign in with a credential helper: gh auth login".to_string(),
        ],
        FailureReason::NotFound => vec![
            format!("Create the repository first: {remote_url}"),
            "Check the account and repository name".to_string(),
        ],
        FailureReason::Network => vec![
            "Check internet connection".to_string(),
            "Try again in a few moments".to_string(),
        ],
        FailureReason::Diverged => vec!["Pull the remote history first: ghsync pull".to_string()],
        FailureReason::Conflict => vec!["Inspect the local changes: git status".to_string()],
        FailureReason::Other => vec!["Check the repository URL and permissions".to_string()],
    }
}

/// Print what went wrong with a failed remote operation and how to recover
pub fn report_failure(err: &SyncError, remote_url: &str) {
    let SyncError::OperationFailed {
        operation,
        reason,
        stderr,
    } = err
    else {
        ui::print_error(&format!("❌ {err}"));
        return;
    };

    if !stderr.trim().is_empty() {
        ui::print_info(&format!("   • Error: {}", stderr.trim()));
    }
    let hints = suggestions(*reason, remote_url);
    let hints: Vec<&str> = hints.iter().map(String::as_str).collect();
    ui::show_error_with_help(&format!("git {operation} failed: {reason}"), &hints);
}

/// Print help for a clone that could not be staged into the working directory
pub fn report_clone_failure(err: &SyncError, workdir: &Path, remote_url: &str) {
    report_failure(err, remote_url);
    ui::print_info(&format!(
        "   • {} was left as it was before the clone",
        workdir.display()
    ));
}
