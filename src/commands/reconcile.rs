//! Gate that makes sure a repository exists and `origin` points at the
//! expected URL before anything is staged, pushed or pulled.

use tracing::info;

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::git::{VersionControl, REMOTE_NAME};
use crate::interactive::Prompter;
use crate::models::{LinkageAction, RemoteMismatchChoice, TargetIdentity};
use crate::ui;

/// Exact comparison; host casing or protocol differences are mismatches.
#[must_use]
pub fn urls_match(current: &str, expected: &str) -> bool {
    current.trim() == expected.trim()
}

pub fn reconcile_remote(
    vcs: &impl VersionControl,
    prompter: &mut impl Prompter,
    identity: &TargetIdentity,
    config: &Config,
) -> Result<LinkageAction> {
    let expected = identity.remote_url();

    if !vcs.is_repository() {
        ui::print_step(&format!(
            "Initialising git repository on branch '{}'",
            config.default_branch
        ));
        initialize(vcs, identity, config, &expected)?;
        info!(url = %expected, "initialised repository");
        return Ok(LinkageAction::Initialized);
    }

    let Some(current) = vcs.remote_url(REMOTE_NAME)? else {
        ui::print_step(&format!("Adding remote {REMOTE_NAME}: {expected}"));
        vcs.add_remote(REMOTE_NAME, &expected)?;
        return Ok(LinkageAction::Added);
    };

    if urls_match(&current, &expected) {
        info!(url = %current, "remote already matches");
        return Ok(LinkageAction::Unchanged);
    }

    info!(current = %current, expected = %expected, "remote mismatch");
    match prompter.remote_mismatch(&current, &expected)? {
        RemoteMismatchChoice::FreshReinit => {
            let warning = format!(
                "A fresh start deletes all git history in {}",
                vcs.workdir().display()
            );
            if !prompter.confirm_typed(&warning)? {
                return Err(SyncError::DestructiveConfirmationDenied {
                    action: "Fresh re-initialisation",
                });
            }
            vcs.destroy_repository()?;
            initialize(vcs, identity, config, &expected)?;
            ui::print_success("✓ Repository re-initialised");
            Ok(LinkageAction::Reinitialized)
        }
        RemoteMismatchChoice::UpdateRemoteOnly => {
            vcs.set_remote_url(REMOTE_NAME, &expected)?;
            ui::print_success(&format!("✓ Remote {REMOTE_NAME} now points at {expected}"));
            Ok(LinkageAction::Repointed)
        }
        RemoteMismatchChoice::Abort => Err(SyncError::UserAborted {
            stage: "remote verification",
        }),
    }
}

fn initialize(
    vcs: &impl VersionControl,
    identity: &TargetIdentity,
    config: &Config,
    expected: &str,
) -> Result<()> {
    vcs.init(&config.default_branch)?;
    ensure_commit_identity(vcs, &identity.account, config)?;
    vcs.add_remote(REMOTE_NAME, expected)
}

/// Set `user.name` / `user.email` when git has no value for them, so the
/// first commit is attributable.
pub fn ensure_commit_identity(
    vcs: &impl VersionControl,
    account: &str,
    config: &Config,
) -> Result<()> {
    if vcs.config_get("user.name")?.is_none() {
        vcs.config_set("user.name", &config.fallback_user_name(account))?;
    }
    if vcs.config_get("user.email")?.is_none() {
        vcs.config_set("user.email", &config.fallback_user_email(account))?;
    }
    Ok(())
}
