use super::target_branch;
use super::reconcile::urls_match;
use crate::config::Config;
use crate::error::Result;
use crate::git::{VersionControl, REMOTE_NAME};
use crate::models::{TargetIdentity, WorkingCopyState};
use crate::ui;

/// Read-only snapshot of how a directory relates to its target repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub identity: TargetIdentity,
    pub expected_url: String,
    pub configured_url: Option<String>,
    pub state: WorkingCopyState,
    pub branch: Option<String>,
    pub changed_paths: usize,
    pub unpushed_commits: usize,
}

impl StatusReport {
    #[must_use]
    pub fn remote_matches(&self) -> bool {
        self.configured_url
            .as_deref()
            .is_some_and(|url| urls_match(url, &self.expected_url))
    }
}

pub fn collect_status(
    vcs: &impl VersionControl,
    identity: &TargetIdentity,
    config: &Config,
) -> Result<StatusReport> {
    let expected_url = identity.remote_url();

    if !vcs.is_repository() {
        return Ok(StatusReport {
            identity: identity.clone(),
            expected_url,
            configured_url: None,
            state: WorkingCopyState::Absent,
            branch: None,
            changed_paths: 0,
            unpushed_commits: 0,
        });
    }

    let status = vcs.status()?;
    let branch = target_branch(vcs, config)?;
    Ok(StatusReport {
        identity: identity.clone(),
        expected_url,
        configured_url: vcs.remote_url(REMOTE_NAME)?,
        state: status.state(),
        changed_paths: status.changed_paths(),
        unpushed_commits: vcs.unpushed_commit_count(REMOTE_NAME, &branch)?,
        branch: Some(branch),
    })
}

pub fn print_status(report: &StatusReport) {
    ui::print_header("Sync Status");
    ui::print_info(&format!("Target:   {}", report.identity));
    ui::print_info(&format!("Expected: {}", report.expected_url));

    match &report.configured_url {
        None => ui::print_warning(&format!("Remote:   no '{REMOTE_NAME}' configured")),
        Some(url) if report.remote_matches() => ui::print_success(&format!("Remote:   {url} ✓")),
        Some(url) => ui::print_warning(&format!("Remote:   {url} (does not match)")),
    }

    if let Some(branch) = &report.branch {
        ui::print_info(&format!("Branch:   {branch}"));
    }

    let state = match report.state {
        WorkingCopyState::Absent | WorkingCopyState::Clean => report.state.to_string(),
        _ => format!("{} ({} path(s))", report.state, report.changed_paths),
    };
    ui::print_info(&format!("Working copy: {state}"));

    if report.unpushed_commits > 0 {
        ui::print_info(&format!("{} commit(s) not yet pushed", report.unpushed_commits));
    }
}
