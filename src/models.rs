use serde::{Deserialize, Serialize};
use std::fmt;

/// How the expected remote URL is spelled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RemoteProtocol {
    #[default]
    Https,
    Ssh,
}

/// The repository a directory should be synced with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetIdentity {
    pub host: String,
    pub account: String,
    pub repo_name: String,
    pub protocol: RemoteProtocol,
    /// Replaces host and protocol, e.g. an enterprise mirror or a local path
    pub base_url: Option<String>,
}

impl TargetIdentity {
    /// Fully qualified URL `origin` is expected to point at
    #[must_use]
    pub fn remote_url(&self) -> String {
        if let Some(base) = &self.base_url {
            return format!(
                "{}/{}/{}.git",
                base.trim_end_matches('/'),
                self.account,
                self.repo_name
            );
        }
        match self.protocol {
            RemoteProtocol::Https => {
                format!("https://{}/{}/{}.git", self.host, self.account, self.repo_name)
            }
            RemoteProtocol::Ssh => {
                format!("git@{}:{}/{}.git", self.host, self.account, self.repo_name)
            }
        }
    }
}

impl fmt::Display for TargetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.repo_name)
    }
}

/// Coarse classification that picks the branch of the decision procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingCopyState {
    Absent,
    Clean,
    DirtyUnstaged,
    DirtyStaged,
}

impl fmt::Display for WorkingCopyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Absent => "no local repository",
            Self::Clean => "clean",
            Self::DirtyUnstaged => "unstaged changes",
            Self::DirtyStaged => "staged changes",
        };
        f.write_str(text)
    }
}

/// Paths reported by `git status --porcelain`, split by index/worktree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingCopyStatus {
    pub staged: Vec<String>,
    pub unstaged: Vec<String>,
    pub untracked: Vec<String>,
}

impl WorkingCopyStatus {
    /// Parse porcelain v1 output. Each line is `XY <path>`; renames carry
    /// `old -> new` and only the new path is kept.
    #[must_use]
    pub fn from_porcelain(output: &str) -> Self {
        let mut status = Self::default();
        for line in output.lines() {
            if line.len() < 4 {
                continue;
            }
            let (codes, path) = line.split_at(3);
            let path = path.rsplit(" -> ").next().unwrap_or(path).to_string();
            let mut chars = codes.chars();
            let index = chars.next().unwrap_or(' ');
            let worktree = chars.next().unwrap_or(' ');

            if index == '?' && worktree == '?' {
                status.untracked.push(path);
                continue;
            }
            if index == '!' {
                continue;
            }
            if index != ' ' {
                status.staged.push(path.clone());
            }
            if worktree != ' ' {
                status.unstaged.push(path);
            }
        }
        status
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> WorkingCopyState {
        if !self.staged.is_empty() {
            WorkingCopyState::DirtyStaged
        } else if self.unstaged.is_empty() && self.untracked.is_empty() {
            WorkingCopyState::Clean
        } else {
            WorkingCopyState::DirtyUnstaged
        }
    }

    /// Number of distinct paths with any kind of change
    #[must_use]
    pub fn changed_paths(&self) -> usize {
        let mut paths: Vec<&String> = self
            .staged
            .iter()
            .chain(&self.unstaged)
            .chain(&self.untracked)
            .collect();
        paths.sort();
        paths.dedup();
        paths.len()
    }
}

/// Answer to "origin points somewhere else"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteMismatchChoice {
    FreshReinit,
    UpdateRemoteOnly,
    Abort,
}

/// Answer to "changes are already staged" before a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedChangesChoice {
    ProceedWithExisting,
    ResetAndRestage,
    Abort,
}

/// Answer to "uncommitted changes" before a pull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalChangesChoice {
    StashAndContinue,
    HardResetAndContinue,
    Abort,
}

/// What the remote-linkage gate did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkageAction {
    Initialized,
    Added,
    Unchanged,
    Reinitialized,
    Repointed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    ForcePushed,
    UpToDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Cloned,
    Pulled,
    ForceReset,
}
