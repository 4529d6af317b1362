//! In-memory [`VersionControl`] for exercising the decision procedures.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::git::{PushMode, VersionControl};
use crate::models::WorkingCopyStatus;

#[derive(Debug, Default)]
pub struct FakeState {
    pub repository: bool,
    pub branch: String,
    pub detached: bool,
    pub remote: Option<String>,
    pub config: HashMap<String, String>,
    pub status: WorkingCopyStatus,
    pub commits: Vec<String>,
    pub pushed_commits: usize,
    pub stashes: Vec<String>,
    /// Scripted failures (stderr) per operation name, consumed in order
    pub failures: HashMap<&'static str, VecDeque<String>>,
    /// Files a successful clone writes into its destination
    pub clone_files: Vec<(String, String)>,
    pub calls: Vec<String>,
}

pub struct FakeVcs {
    workdir: PathBuf,
    pub state: RefCell<FakeState>,
}

/// Operations that change something on the remote or in `origin`
pub const REMOTE_MODIFYING: &[&str] = &["add_remote", "set_remote_url", "push", "init", "destroy"];

impl FakeVcs {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            state: RefCell::new(FakeState {
                branch: "main".to_string(),
                ..FakeState::default()
            }),
        }
    }

    /// Repository with one commit that is already on the remote
    pub fn with_repo(workdir: impl Into<PathBuf>, remote: Option<&str>) -> Self {
        let fake = Self::new(workdir);
        {
            let mut state = fake.state.borrow_mut();
            state.repository = true;
            state.remote = remote.map(str::to_string);
            state.commits.push("initial".to_string());
            state.pushed_commits = 1;
        }
        fake
    }

    pub fn fail_next(&self, operation: &'static str, stderr: &str) {
        self.state
            .borrow_mut()
            .failures
            .entry(operation)
            .or_default()
            .push_back(stderr.to_string());
    }

    pub fn set_status(&self, porcelain: &str) {
        self.state.borrow_mut().status = WorkingCopyStatus::from_porcelain(porcelain);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn called(&self, operation: &str) -> bool {
        self.state.borrow().calls.iter().any(|c| c == operation)
    }

    fn record(&self, operation: &'static str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(operation.to_string());
        match state.failures.get_mut(operation).and_then(VecDeque::pop_front) {
            Some(stderr) => Err(SyncError::operation_failed(operation, stderr)),
            None => Ok(()),
        }
    }
}

impl VersionControl for FakeVcs {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn is_repository(&self) -> bool {
        self.state.borrow().repository
    }

    fn init(&self, default_branch: &str) -> Result<()> {
        self.record("init")?;
        let mut state = self.state.borrow_mut();
        state.repository = true;
        state.branch = default_branch.to_string();
        state.remote = None;
        state.commits.clear();
        state.pushed_commits = 0;
        Ok(())
    }

    fn destroy_repository(&self) -> Result<()> {
        self.record("destroy")?;
        let mut state = self.state.borrow_mut();
        state.repository = false;
        state.remote = None;
        state.commits.clear();
        state.config.clear();
        Ok(())
    }

    fn remote_url(&self, _remote: &str) -> Result<Option<String>> {
        Ok(self.state.borrow().remote.clone())
    }

    fn add_remote(&self, _remote: &str, url: &str) -> Result<()> {
        self.record("add_remote")?;
        self.state.borrow_mut().remote = Some(url.to_string());
        Ok(())
    }

    fn set_remote_url(&self, _remote: &str, url: &str) -> Result<()> {
        self.record("set_remote_url")?;
        self.state.borrow_mut().remote = Some(url.to_string());
        Ok(())
    }

    fn config_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.borrow().config.get(key).cloned())
    }

    fn config_set(&self, key: &str, value: &str) -> Result<()> {
        self.record("config_set")?;
        self.state
            .borrow_mut()
            .config
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn status(&self) -> Result<WorkingCopyStatus> {
        Ok(self.state.borrow().status.clone())
    }

    fn stage_all(&self) -> Result<()> {
        self.record("stage_all")?;
        let mut state = self.state.borrow_mut();
        let mut staged = std::mem::take(&mut state.status.staged);
        staged.append(&mut state.status.unstaged);
        staged.append(&mut state.status.untracked);
        staged.sort();
        staged.dedup();
        state.status.staged = staged;
        Ok(())
    }

    fn unstage_all(&self) -> Result<()> {
        self.record("unstage_all")?;
        let mut state = self.state.borrow_mut();
        let mut staged = std::mem::take(&mut state.status.staged);
        state.status.unstaged.append(&mut staged);
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.record("commit")?;
        let mut state = self.state.borrow_mut();
        if state.status.staged.is_empty() {
            return Err(SyncError::operation_failed("commit", "nothing to commit"));
        }
        state.status.staged.clear();
        state.commits.push(message.to_string());
        Ok(())
    }

    fn has_commits(&self) -> bool {
        !self.state.borrow().commits.is_empty()
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let state = self.state.borrow();
        Ok((!state.detached).then(|| state.branch.clone()))
    }

    fn unpushed_commit_count(&self, _remote: &str, _branch: &str) -> Result<usize> {
        let state = self.state.borrow();
        Ok(state.commits.len().saturating_sub(state.pushed_commits))
    }

    fn push(&self, _remote: &str, _branch: &str, mode: PushMode) -> Result<()> {
        self.record(match mode {
            PushMode::Normal => "push",
            PushMode::Force => "force_push",
        })?;
        let mut state = self.state.borrow_mut();
        state.pushed_commits = state.commits.len();
        Ok(())
    }

    fn fetch(&self, _remote: &str) -> Result<()> {
        self.record("fetch")
    }

    fn pull(&self, _remote: &str, _branch: &str) -> Result<()> {
        self.record("pull")
    }

    fn stash_push(&self, message: &str) -> Result<()> {
        self.record("stash")?;
        let mut state = self.state.borrow_mut();
        state.status = WorkingCopyStatus::default();
        state.stashes.push(message.to_string());
        Ok(())
    }

    fn reset_hard(&self, target: Option<&str>) -> Result<()> {
        self.record(if target.is_some() {
            "reset_hard_remote"
        } else {
            "reset_hard"
        })?;
        let mut state = self.state.borrow_mut();
        state.status.staged.clear();
        state.status.unstaged.clear();
        Ok(())
    }

    fn clean_untracked(&self) -> Result<()> {
        self.record("clean")?;
        self.state.borrow_mut().status.untracked.clear();
        Ok(())
    }

    fn clone_into(&self, _url: &str, destination: &Path) -> Result<()> {
        self.record("clone")?;
        let files = self.state.borrow().clone_files.clone();
        for (name, content) in files {
            let path = destination.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| SyncError::io("fake clone", e))?;
            }
            fs::write(&path, content).map_err(|e| SyncError::io("fake clone", e))?;
        }
        self.state.borrow_mut().repository = true;
        Ok(())
    }
}
