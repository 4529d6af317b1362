use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::reconcile::reconcile_remote;
use super::{target_branch, timestamp};
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::error_handling;
use crate::git::{VersionControl, REMOTE_NAME};
use crate::interactive::Prompter;
use crate::models::{LocalChangesChoice, PullOutcome, TargetIdentity};
use crate::ui;

/// Prefix of the per-invocation clone staging directory
pub const CLONE_STAGING_PREFIX: &str = ".ghsync-clone-";

/// Bring the working directory up to date with `origin`, cloning it first
/// when there is no local repository.
pub fn sync_pull(
    vcs: &impl VersionControl,
    prompter: &mut impl Prompter,
    identity: &TargetIdentity,
    config: &Config,
) -> Result<PullOutcome> {
    let remote_url = identity.remote_url();
    ui::print_step(&format!(
        "Syncing {} from {identity} ({remote_url})",
        vcs.workdir().display()
    ));

    if !vcs.is_repository() {
        return bootstrap_clone(vcs, prompter, &remote_url, config);
    }

    let linkage = reconcile_remote(vcs, prompter, identity, config)?;
    info!(?linkage, "remote linkage ready");

    reconcile_local_changes(vcs, prompter)?;

    ui::print_step(&format!("Fetching from {REMOTE_NAME}"));
    vcs.fetch(REMOTE_NAME).inspect_err(|err| {
        error_handling::report_failure(err, &remote_url);
    })?;

    let branch = target_branch(vcs, config)?;
    ui::print_step(&format!("Merging {REMOTE_NAME}/{branch}"));
    let err = match vcs.pull(REMOTE_NAME, &branch) {
        Ok(()) => {
            ui::print_success("✅ Local copy is up to date with the remote");
            return Ok(PullOutcome::Pulled);
        }
        Err(err @ SyncError::OperationFailed { .. }) => err,
        Err(other) => return Err(other),
    };

    warn!(error = %err, "pull failed");
    error_handling::report_failure(&err, &remote_url);

    let tip = format!("{REMOTE_NAME}/{branch}");
    if !prompter.confirm(&format!(
        "Overwrite the local branch with {tip}? Local commits not on the remote will be lost"
    ))? {
        return Err(SyncError::DestructiveConfirmationDenied {
            action: "Forced overwrite from the remote",
        });
    }

    ui::print_step(&format!("Resetting to {tip}"));
    vcs.reset_hard(Some(&tip))?;
    ui::print_success(&format!("✅ Local copy now matches {tip}"));
    Ok(PullOutcome::ForceReset)
}

/// Uncommitted work must be stashed or discarded before merging
fn reconcile_local_changes(vcs: &impl VersionControl, prompter: &mut impl Prompter) -> Result<()> {
    let status = vcs.status()?;
    if status.is_clean() {
        return Ok(());
    }
    info!(state = %status.state(), paths = status.changed_paths(), "local changes present");

    match prompter.local_changes(&status)? {
        LocalChangesChoice::StashAndContinue => {
            let message = format!("ghsync auto-stash - {}", timestamp());
            ui::print_step(&format!("Stashing local changes as '{message}'"));
            vcs.stash_push(&message)?;
            ui::print_info("Restore them later with: git stash pop");
            Ok(())
        }
        LocalChangesChoice::HardResetAndContinue => {
            if !prompter.confirm_typed(
                "Hard reset discards all uncommitted changes and deletes untracked files",
            )? {
                return Err(SyncError::DestructiveConfirmationDenied {
                    action: "Hard reset",
                });
            }
            ui::print_step("Discarding local changes");
            vcs.reset_hard(None)?;
            vcs.clean_untracked()
        }
        LocalChangesChoice::Abort => Err(SyncError::UserAborted {
            stage: "local changes check",
        }),
    }
}

/// Entries in `dir` other than the tool's own files and staging leftovers
pub fn existing_entries(dir: &Path, ignore: &[String]) -> Result<Vec<String>> {
    let read = fs::read_dir(dir)
        .map_err(|e| SyncError::io(format!("Failed to list {}", dir.display()), e))?;

    let mut names = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| SyncError::io(format!("Failed to list {}", dir.display()), e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if ignore.iter().any(|i| *i == name) || name.starts_with(CLONE_STAGING_PREFIX) {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Clone into a private staging directory, then move the result into place.
/// The staging directory is removed on every path.
pub fn bootstrap_clone(
    vcs: &impl VersionControl,
    prompter: &mut impl Prompter,
    remote_url: &str,
    config: &Config,
) -> Result<PullOutcome> {
    let workdir = vcs.workdir();
    let existing = existing_entries(workdir, &config.clone_ignore)?;

    if !existing.is_empty() {
        ui::print_warning(&format!(
            "⚠️  {} is not empty and has no git repository:",
            workdir.display()
        ));
        for name in existing.iter().take(10) {
            ui::print_warning(&format!("   • {name}"));
        }
        if existing.len() > 10 {
            ui::print_warning(&format!("   • ... and {} more", existing.len() - 10));
        }
        if !prompter.confirm("Clone here anyway? Files with the same names will be replaced")? {
            return Err(SyncError::UserAborted {
                stage: "clone into a non-empty directory",
            });
        }
    }

    let staging = tempfile::Builder::new()
        .prefix(&format!("{CLONE_STAGING_PREFIX}{}-", std::process::id()))
        .tempdir_in(workdir)
        .map_err(|e| SyncError::io("Failed to create clone staging directory", e))?;
    let checkout = staging.path().join("checkout");

    ui::print_step(&format!("Cloning {remote_url}"));
    if let Err(err) = vcs.clone_into(remote_url, &checkout) {
        error_handling::report_clone_failure(&err, workdir, remote_url);
        return Err(err);
    }

    let moved = move_entries(&checkout, workdir)?;
    info!(entries = moved.len(), "moved clone into working directory");

    staging
        .close()
        .map_err(|e| SyncError::io("Failed to remove clone staging directory", e))?;

    ui::print_success(&format!("✅ Cloned {remote_url} into {}", workdir.display()));
    Ok(PullOutcome::Cloned)
}

/// Move every entry of `from`, hidden ones included, into `to`, replacing
/// entries with the same name.
fn move_entries(from: &Path, to: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |what: &str, path: &Path, e| SyncError::io(format!("{what} {}", path.display()), e);

    let mut moved = Vec::new();
    for entry in fs::read_dir(from).map_err(|e| io_err("Failed to read", from, e))? {
        let entry = entry.map_err(|e| io_err("Failed to read", from, e))?;
        let target = to.join(entry.file_name());

        if let Ok(meta) = fs::symlink_metadata(&target) {
            let removed = if meta.is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };
            removed.map_err(|e| io_err("Failed to replace", &target, e))?;
        }

        fs::rename(entry.path(), &target).map_err(|e| io_err("Failed to move into", &target, e))?;
        moved.push(target);
    }
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::FakeVcs;
    use crate::interactive::{Answer, ScriptedPrompter};
    use crate::models::RemoteProtocol;
    use tempfile::TempDir;

    fn identity() -> TargetIdentity {
        TargetIdentity {
            host: "github.com".to_string(),
            account: "octocat".to_string(),
            repo_name: "my-project".to_string(),
            protocol: RemoteProtocol::Https,
            base_url: None,
        }
    }

    fn pull(vcs: &FakeVcs, prompter: &mut ScriptedPrompter) -> Result<PullOutcome> {
        sync_pull(vcs, prompter, &identity(), &Config::default())
    }

    fn staging_leftovers(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .starts_with(CLONE_STAGING_PREFIX)
            })
            .count()
    }

    #[test]
    fn test_clone_into_empty_directory() {
        let dir = TempDir::new().unwrap();
        let vcs = FakeVcs::new(dir.path());
        vcs.state.borrow_mut().clone_files = vec![
            (".git/HEAD".to_string(), "ref: refs/heads/main\n".to_string()),
            ("README.md".to_string(), "# hello\n".to_string()),
            ("src/lib.rs".to_string(), "\n".to_string()),
        ];

        assert_eq!(
            pull(&vcs, &mut ScriptedPrompter::default()).unwrap(),
            PullOutcome::Cloned
        );
        assert!(dir.path().join(".git/HEAD").exists());
        assert!(dir.path().join("src/lib.rs").exists());
        assert_eq!(staging_leftovers(dir.path()), 0);
    }

    #[test]
    fn test_clone_declined_leaves_directory_untouched() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "mine\n").unwrap();
        let vcs = FakeVcs::new(dir.path());
        let mut prompter = ScriptedPrompter::new([Answer::Confirm(false)]);

        let err = pull(&vcs, &mut prompter).unwrap_err();

        assert!(matches!(err, SyncError::UserAborted { .. }));
        assert!(!vcs.called("clone"));
        assert_eq!(existing_entries(dir.path(), &[]).unwrap(), vec!["notes.txt"]);
        assert_eq!(fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "mine\n");
    }

    #[test]
    fn test_clone_confirmed_replaces_same_names() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "old\n").unwrap();
        fs::write(dir.path().join("keep.txt"), "keep\n").unwrap();
        let vcs = FakeVcs::new(dir.path());
        vcs.state.borrow_mut().clone_files =
            vec![("README.md".to_string(), "new\n".to_string())];
        let mut prompter = ScriptedPrompter::new([Answer::Confirm(true)]);

        pull(&vcs, &mut prompter).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("README.md")).unwrap(), "new\n");
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn test_failed_clone_removes_staging() {
        let dir = TempDir::new().unwrap();
        let vcs = FakeVcs::new(dir.path());
        vcs.fail_next("clone", "remote: Repository not found.");

        let err = pull(&vcs, &mut ScriptedPrompter::default()).unwrap_err();

        assert!(matches!(err, SyncError::OperationFailed { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_tool_files_do_not_count_as_existing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ghsync"), "").unwrap();
        fs::create_dir(dir.path().join(".ghsync-clone-1-abc")).unwrap();
        let ignore = Config::default().clone_ignore;
        assert!(existing_entries(dir.path(), &ignore).unwrap().is_empty());
    }

    #[test]
    fn test_clean_copy_fetches_and_pulls() {
        let vcs = FakeVcs::with_repo("/work", Some(&identity().remote_url()));

        assert_eq!(
            pull(&vcs, &mut ScriptedPrompter::default()).unwrap(),
            PullOutcome::Pulled
        );
        assert_eq!(vcs.calls(), vec!["fetch", "pull"]);
    }

    #[test]
    fn test_dirty_copy_stash_then_pull() {
        let vcs = FakeVcs::with_repo("/work", Some(&identity().remote_url()));
        vcs.set_status(" M a.txt\n");
        let mut prompter =
            ScriptedPrompter::new([Answer::LocalChanges(LocalChangesChoice::StashAndContinue)]);

        pull(&vcs, &mut prompter).unwrap();

        assert_eq!(vcs.calls(), vec!["stash", "fetch", "pull"]);
        assert!(vcs.state.borrow().stashes[0].starts_with("ghsync auto-stash - "));
    }

    #[test]
    fn test_hard_reset_requires_typed_yes() {
        let vcs = FakeVcs::with_repo("/work", Some(&identity().remote_url()));
        vcs.set_status(" M a.txt\n?? b.txt\n");
        let mut prompter = ScriptedPrompter::new([
            Answer::LocalChanges(LocalChangesChoice::HardResetAndContinue),
            Answer::Typed("y".to_string()),
        ]);

        let err = pull(&vcs, &mut prompter).unwrap_err();

        assert!(matches!(err, SyncError::DestructiveConfirmationDenied { .. }));
        assert!(vcs.calls().is_empty());
    }

    #[test]
    fn test_hard_reset_confirmed_discards_and_cleans() {
        let vcs = FakeVcs::with_repo("/work", Some(&identity().remote_url()));
        vcs.set_status(" M a.txt\n?? b.txt\n");
        let mut prompter = ScriptedPrompter::new([
            Answer::LocalChanges(LocalChangesChoice::HardResetAndContinue),
            Answer::Typed("yes".to_string()),
        ]);

        pull(&vcs, &mut prompter).unwrap();

        assert_eq!(vcs.calls(), vec!["reset_hard", "clean", "fetch", "pull"]);
        assert!(vcs.state.borrow().status.is_clean());
    }

    #[test]
    fn test_dirty_copy_abort() {
        let vcs = FakeVcs::with_repo("/work", Some(&identity().remote_url()));
        vcs.set_status("?? b.txt\n");
        let mut prompter =
            ScriptedPrompter::new([Answer::LocalChanges(LocalChangesChoice::Abort)]);

        let err = pull(&vcs, &mut prompter).unwrap_err();
        assert!(matches!(err, SyncError::UserAborted { .. }));
        assert!(!vcs.called("fetch"));
    }

    #[test]
    fn test_fetch_failure_is_terminal() {
        let vcs = FakeVcs::with_repo("/work", Some(&identity().remote_url()));
        vcs.fail_next("fetch", "fatal: unable to access: Could not resolve host: github.com");

        let err = pull(&vcs, &mut ScriptedPrompter::default()).unwrap_err();
        assert!(matches!(err, SyncError::OperationFailed { .. }));
        assert!(!vcs.called("pull"));
    }

    #[test]
    fn test_failed_pull_offers_forced_reset() {
        let vcs = FakeVcs::with_repo("/work", Some(&identity().remote_url()));
        vcs.fail_next("pull", "fatal: refusing to merge unrelated histories");
        let mut prompter = ScriptedPrompter::new([Answer::Confirm(true)]);

        assert_eq!(pull(&vcs, &mut prompter).unwrap(), PullOutcome::ForceReset);
        assert!(vcs.called("reset_hard_remote"));
    }

    #[test]
    fn test_failed_pull_declined_reset() {
        let vcs = FakeVcs::with_repo("/work", Some(&identity().remote_url()));
        vcs.fail_next("pull", "CONFLICT (content): Merge conflict in a.txt");
        let mut prompter = ScriptedPrompter::new([Answer::Confirm(false)]);

        let err = pull(&vcs, &mut prompter).unwrap_err();
        assert!(matches!(err, SyncError::DestructiveConfirmationDenied { .. }));
        assert!(!vcs.called("reset_hard_remote"));
    }
}
