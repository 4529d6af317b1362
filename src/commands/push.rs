use tracing::{info, warn};

use super::reconcile::reconcile_remote;
use super::timestamp;
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::error_handling;
use crate::git::{PushMode, VersionControl, REMOTE_NAME};
use crate::gitignore;
use crate::interactive::Prompter;
use crate::models::{PushOutcome, StagedChangesChoice, TargetIdentity};
use crate::ui;

/// Options for one push-sync run
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Commit message instead of the timestamped default
    pub message: Option<String>,
}

/// Commit everything in the working directory and push it to `origin`.
pub fn sync_push(
    vcs: &impl VersionControl,
    prompter: &mut impl Prompter,
    identity: &TargetIdentity,
    config: &Config,
    options: &PushOptions,
) -> Result<PushOutcome> {
    let remote_url = identity.remote_url();
    ui::print_step(&format!("Syncing {} to {identity} ({remote_url})", vcs.workdir().display()));

    let linkage = reconcile_remote(vcs, prompter, identity, config)?;
    info!(?linkage, "remote linkage ready");

    let branch = checked_out_branch(vcs)?;

    if config.write_gitignore && gitignore::write_if_absent(vcs.workdir())? {
        ui::print_info("Created .gitignore with default exclusions");
    }

    resolve_staged_changes(vcs, prompter)?;

    ui::print_step("Staging all changes");
    vcs.stage_all()?;

    let staged = vcs.status()?.staged;

    if staged.is_empty() {
        let ahead = vcs.unpushed_commit_count(REMOTE_NAME, &branch)?;
        if ahead == 0 {
            ui::print_success("✅ No changes to commit; repository is up to date");
            return Ok(PushOutcome::UpToDate);
        }
        ui::print_info(&format!(
            "No new changes; {ahead} local commit(s) not yet on {REMOTE_NAME}/{branch}"
        ));
    } else {
        let message = options
            .message
            .clone()
            .unwrap_or_else(|| format!("Update repository - {}", timestamp()));
        ui::print_step(&format!("Committing {} file(s): {message}", staged.len()));
        vcs.commit(&message)?;
    }

    let outcome = dispatch_push(vcs, prompter, &branch, &remote_url)?;
    ui::print_success("✅ Repository successfully synced");
    Ok(outcome)
}

/// A commit made on a detached HEAD would never reach the pushed branch
fn checked_out_branch(vcs: &impl VersionControl) -> Result<String> {
    vcs.current_branch()?.ok_or_else(|| {
        SyncError::PreconditionUnmet("HEAD is detached; check out a branch first".to_string())
    })
}

/// Changes staged before the run must be dealt with explicitly
fn resolve_staged_changes(vcs: &impl VersionControl, prompter: &mut impl Prompter) -> Result<()> {
    let status = vcs.status()?;
    if status.staged.is_empty() {
        return Ok(());
    }

    match prompter.staged_changes(&status)? {
        StagedChangesChoice::ProceedWithExisting => {
            let message = format!("Commit previously staged changes - {}", timestamp());
            ui::print_step(&format!("Committing {} staged file(s)", status.staged.len()));
            vcs.commit(&message)
        }
        StagedChangesChoice::ResetAndRestage => {
            ui::print_step("Unstaging previously staged changes");
            vcs.unstage_all()
        }
        StagedChangesChoice::Abort => Err(SyncError::UserAborted {
            stage: "staged changes check",
        }),
    }
}

/// Push, and on failure offer a single forced push.
pub fn dispatch_push(
    vcs: &impl VersionControl,
    prompter: &mut impl Prompter,
    branch: &str,
    remote_url: &str,
) -> Result<PushOutcome> {
    ui::print_step(&format!("Pushing {branch} to {REMOTE_NAME}"));
    let err = match vcs.push(REMOTE_NAME, branch, PushMode::Normal) {
        Ok(()) => return Ok(PushOutcome::Pushed),
        Err(err @ SyncError::OperationFailed { .. }) => err,
        Err(other) => return Err(other),
    };

    warn!(error = %err, "push failed");
    error_handling::report_failure(&err, remote_url);

    if !prompter.confirm("Force push? This overwrites the history on the remote")? {
        return Err(SyncError::DestructiveConfirmationDenied {
            action: "Force push",
        });
    }

    ui::print_step(&format!("Force pushing {branch} to {REMOTE_NAME}"));
    vcs.push(REMOTE_NAME, branch, PushMode::Force)?;
    Ok(PushOutcome::ForcePushed)
}
