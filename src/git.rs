use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::error::{Result, SyncError};
use crate::models::WorkingCopyStatus;

/// The only remote linkage ghsync manages
pub const REMOTE_NAME: &str = "origin";

/// Run a git command and return the output
pub fn run_git_command<S: AsRef<OsStr>>(args: &[S], working_dir: Option<&Path>) -> Result<Output> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    // A missing credential must fail the command, not block on a hidden prompt
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let printable = describe(args);
    debug!(command = %printable, dir = ?working_dir, "running git");

    let output = cmd.output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            SyncError::GitUnavailable
        } else {
            SyncError::io(format!("Failed to execute git command: git {printable}"), e)
        }
    })?;

    debug!(
        command = %printable,
        status = ?output.status.code(),
        "git finished"
    );
    Ok(output)
}

/// Run a git command and return trimmed stdout, failing on a non-zero exit
pub fn run_git_command_string<S: AsRef<OsStr>>(args: &[S], cwd: Option<&Path>) -> Result<String> {
    let output = run_git_command(args, cwd)?;
    let stdout = checked_stdout(args, output)?;
    Ok(stdout.trim().to_string())
}

fn checked_stdout<S: AsRef<OsStr>>(args: &[S], output: Output) -> Result<String> {
    if !output.status.success() {
        let operation = args
            .first()
            .map_or_else(String::new, |a| a.as_ref().to_string_lossy().into_owned());
        return Err(SyncError::operation_failed(
            operation,
            String::from_utf8_lossy(&output.stderr),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn describe<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| a.as_ref().to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check if git is available on the system
pub fn check_git_availability() -> Result<()> {
    let output = run_git_command(&["--version"], None)?;
    if output.status.success() {
        Ok(())
    } else {
        Err(SyncError::GitUnavailable)
    }
}

/// Check if a directory is a git repository
#[must_use]
pub fn is_git_repo(path: &Path) -> bool {
    path.join(".git").exists()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    Normal,
    Force,
}

/// Everything the sync procedures need from version control.
///
/// Operations that touch a remote or rewrite state return
/// [`SyncError::OperationFailed`] with git's stderr when git refuses.
pub trait VersionControl {
    fn workdir(&self) -> &Path;
    fn is_repository(&self) -> bool;
    /// Create a repository whose unborn HEAD points at `default_branch`
    fn init(&self, default_branch: &str) -> Result<()>;
    /// Delete all version-control metadata, leaving the files in place
    fn destroy_repository(&self) -> Result<()>;

    fn remote_url(&self, remote: &str) -> Result<Option<String>>;
    fn add_remote(&self, remote: &str, url: &str) -> Result<()>;
    fn set_remote_url(&self, remote: &str, url: &str) -> Result<()>;

    fn config_get(&self, key: &str) -> Result<Option<String>>;
    fn config_set(&self, key: &str, value: &str) -> Result<()>;

    fn status(&self) -> Result<WorkingCopyStatus>;
    fn stage_all(&self) -> Result<()>;
    fn unstage_all(&self) -> Result<()>;
    fn commit(&self, message: &str) -> Result<()>;
    fn has_commits(&self) -> bool;
    /// `None` for a detached HEAD
    fn current_branch(&self) -> Result<Option<String>>;
    /// Commits on HEAD that `remote/branch` does not have. Without a
    /// tracking ref every commit counts.
    fn unpushed_commit_count(&self, remote: &str, branch: &str) -> Result<usize>;

    fn push(&self, remote: &str, branch: &str, mode: PushMode) -> Result<()>;
    fn fetch(&self, remote: &str) -> Result<()>;
    fn pull(&self, remote: &str, branch: &str) -> Result<()>;
    fn stash_push(&self, message: &str) -> Result<()>;
    /// Hard reset to `target`, or to HEAD when `None`
    fn reset_hard(&self, target: Option<&str>) -> Result<()>;
    fn clean_untracked(&self) -> Result<()>;
    fn clone_into(&self, url: &str, destination: &Path) -> Result<()>;
}

/// [`VersionControl`] backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<()> {
        run_git_command_string(args, Some(&self.workdir)).map(|_| ())
    }

    fn query(&self, args: &[&str]) -> Result<String> {
        run_git_command_string(args, Some(&self.workdir))
    }

    /// Run a command whose non-zero exit means "absent" rather than failure
    fn probe(&self, args: &[&str]) -> Result<Option<String>> {
        let output = run_git_command(args, Some(&self.workdir))?;
        if output.status.success() {
            Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim().to_string(),
            ))
        } else {
            Ok(None)
        }
    }

    fn parse_count(text: &str) -> Result<usize> {
        text.trim().parse().map_err(|_| {
            SyncError::operation_failed("rev-list", format!("unexpected commit count '{text}'"))
        })
    }
}

impl VersionControl for GitCli {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn is_repository(&self) -> bool {
        is_git_repo(&self.workdir)
    }

    fn init(&self, default_branch: &str) -> Result<()> {
        self.run(&["init", "--quiet"])?;
        self.run(&[
            "symbolic-ref",
            "HEAD",
            &format!("refs/heads/{default_branch}"),
        ])
    }

    fn destroy_repository(&self) -> Result<()> {
        let git_dir = self.workdir.join(".git");
        let removed = if git_dir.is_dir() {
            fs::remove_dir_all(&git_dir)
        } else {
            fs::remove_file(&git_dir)
        };
        removed.map_err(|e| SyncError::io(format!("Failed to remove {}", git_dir.display()), e))
    }

    fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        self.probe(&["remote", "get-url", remote])
    }

    fn add_remote(&self, remote: &str, url: &str) -> Result<()> {
        self.run(&["remote", "add", remote, url])
    }

    fn set_remote_url(&self, remote: &str, url: &str) -> Result<()> {
        self.run(&["remote", "set-url", remote, url])
    }

    fn config_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .probe(&["config", "--get", key])?
            .filter(|v| !v.is_empty()))
    }

    fn config_set(&self, key: &str, value: &str) -> Result<()> {
        self.run(&["config", key, value])
    }

    fn status(&self) -> Result<WorkingCopyStatus> {
        let args = ["status", "--porcelain", "--untracked-files=all"];
        let output = run_git_command(&args, Some(&self.workdir))?;
        // Not trimmed: the leading column of the first line is significant
        let stdout = checked_stdout(&args, output)?;
        Ok(WorkingCopyStatus::from_porcelain(&stdout))
    }

    fn stage_all(&self) -> Result<()> {
        self.run(&["add", "-A"])
    }

    fn unstage_all(&self) -> Result<()> {
        if self.has_commits() {
            self.run(&["reset", "--quiet"])
        } else {
            self.run(&["read-tree", "--empty"])
        }
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run(&["commit", "--quiet", "-m", message])
    }

    fn has_commits(&self) -> bool {
        matches!(
            self.probe(&["rev-parse", "--verify", "--quiet", "HEAD"]),
            Ok(Some(_))
        )
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self
            .probe(&["symbolic-ref", "--quiet", "--short", "HEAD"])?
            .filter(|b| !b.is_empty()))
    }

    fn unpushed_commit_count(&self, remote: &str, branch: &str) -> Result<usize> {
        let tracking = format!("refs/remotes/{remote}/{branch}");
        if self
            .probe(&["rev-parse", "--verify", "--quiet", &tracking])?
            .is_some()
        {
            let range = format!("{remote}/{branch}..HEAD");
            return Self::parse_count(&self.query(&["rev-list", "--count", &range])?);
        }

        if self.has_commits() {
            Self::parse_count(&self.query(&["rev-list", "--count", "HEAD"])?)
        } else {
            Ok(0)
        }
    }

    fn push(&self, remote: &str, branch: &str, mode: PushMode) -> Result<()> {
        match mode {
            PushMode::Normal => self.run(&["push", "-u", remote, branch]),
            PushMode::Force => self.run(&["push", "-u", "--force", remote, branch]),
        }
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.run(&["fetch", "--quiet", remote])
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.run(&["pull", "--quiet", "--no-rebase", "--no-edit", remote, branch])
    }

    fn stash_push(&self, message: &str) -> Result<()> {
        self.run(&["stash", "push", "--quiet", "--include-untracked", "-m", message])
    }

    fn reset_hard(&self, target: Option<&str>) -> Result<()> {
        match target {
            Some(target) => self.run(&["reset", "--hard", "--quiet", target]),
            None if self.has_commits() => self.run(&["reset", "--hard", "--quiet", "HEAD"]),
            // Unborn branch: emptying the index turns staged files into
            // untracked ones for the following clean
            None => self.run(&["read-tree", "--empty"]),
        }
    }

    fn clean_untracked(&self) -> Result<()> {
        self.run(&["clean", "-fdq"])
    }

    fn clone_into(&self, url: &str, destination: &Path) -> Result<()> {
        let args = [
            OsStr::new("clone"),
            OsStr::new("--quiet"),
            OsStr::new(url),
            destination.as_os_str(),
        ];
        let output = run_git_command(&args, Some(&self.workdir))?;
        checked_stdout(&args, output).map(|_| ())
    }
}
