pub mod pull;
pub mod push;
pub mod reconcile;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::git::VersionControl;
use crate::interactive::Prompter;

/// Local time in the form used for commit and stash messages
#[must_use]
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Branch to push or pull: the checked-out branch, else the configured default
pub fn target_branch(vcs: &impl VersionControl, config: &Config) -> Result<String> {
    Ok(vcs
        .current_branch()?
        .unwrap_or_else(|| config.default_branch.clone()))
}

/// Account from configuration, asking the user when none is set
pub fn resolve_account(config: &Config, prompter: &mut impl Prompter) -> Result<String> {
    if let Some(account) = config.account.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        return Ok(account.to_string());
    }

    match prompter.account()? {
        Some(account) if !account.contains('/') => Ok(account),
        Some(account) => Err(SyncError::PreconditionUnmet(format!(
            "'{account}' is not a valid account name"
        ))),
        None => Err(SyncError::PreconditionUnmet(
            "no account configured; pass --account or set GHSYNC_ACCOUNT".to_string(),
        )),
    }
}
