use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::models::RemoteProtocol;

pub const DEFAULT_HOST: &str = "github.com";
pub const DEFAULT_BRANCH: &str = "main";

/// Settings layered from the config file, then `GHSYNC_*` variables, then CLI flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Account (user or organisation) owning the remote repository
    pub account: Option<String>,
    pub host: String,
    pub protocol: RemoteProtocol,
    /// Base for remote URLs instead of `host`/`protocol`
    pub base_url: Option<String>,
    pub default_branch: String,
    /// Fallback commit identity for freshly initialised repositories
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub write_gitignore: bool,
    /// Entries that do not count as "existing files" before a clone
    pub clone_ignore: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: None,
            host: DEFAULT_HOST.to_string(),
            protocol: RemoteProtocol::Https,
            base_url: None,
            default_branch: DEFAULT_BRANCH.to_string(),
            user_name: None,
            user_email: None,
            write_gitignore: true,
            clone_ignore: vec![
                "ghsync".to_string(),
                "ghsync.exe".to_string(),
                ".DS_Store".to_string(),
            ],
        }
    }
}

/// Values given on the command line; `None` leaves the lower layer alone
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub account: Option<String>,
    pub host: Option<String>,
    pub protocol: Option<RemoteProtocol>,
    pub base_url: Option<String>,
    pub branch: Option<String>,
    pub no_gitignore: bool,
}

/// Get the ghsync configuration directory
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ghsync"))
}

/// Default location of the config file
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.json"))
}

impl Config {
    /// Load from an explicit path (which must exist) or from the default
    /// location (which may be missing).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load_from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::io(format!("Failed to read config file {}", path.display()), e)
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| SyncError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, origin: &Path) -> Result<()> {
        let invalid = |message: &str| SyncError::Config {
            path: origin.to_path_buf(),
            message: message.to_string(),
        };

        if self.host.trim().is_empty() {
            return Err(invalid("'host' cannot be empty"));
        }
        if self.default_branch.trim().is_empty() {
            return Err(invalid("'default_branch' cannot be empty"));
        }
        if self.account.as_deref().is_some_and(|a| a.contains('/')) {
            return Err(invalid("'account' cannot contain '/'"));
        }
        Ok(())
    }

    /// Apply `GHSYNC_*` variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(account) = get("GHSYNC_ACCOUNT") {
            self.account = Some(account);
        }
        if let Some(host) = get("GHSYNC_HOST") {
            self.host = host;
        }
        if let Some(protocol) = get("GHSYNC_PROTOCOL") {
            self.protocol = match protocol.to_lowercase().as_str() {
                "https" => RemoteProtocol::Https,
                "ssh" => RemoteProtocol::Ssh,
                other => {
                    return Err(SyncError::Config {
                        path: PathBuf::from("GHSYNC_PROTOCOL"),
                        message: format!("unknown protocol '{other}', expected 'https' or 'ssh'"),
                    })
                }
            };
        }
        if let Some(base) = get("GHSYNC_BASE_URL") {
            self.base_url = Some(base);
        }
        if let Some(branch) = get("GHSYNC_BRANCH") {
            self.default_branch = branch;
        }
        if let Some(name) = get("GHSYNC_USER_NAME") {
            self.user_name = Some(name);
        }
        if let Some(email) = get("GHSYNC_USER_EMAIL") {
            self.user_email = Some(email);
        }
        self.validate(Path::new("GHSYNC_* environment"))
    }

    /// Apply command-line values and re-check the merged result.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(account) = &overrides.account {
            self.account = Some(account.clone());
        }
        if let Some(host) = &overrides.host {
            self.host.clone_from(host);
        }
        if let Some(protocol) = overrides.protocol {
            self.protocol = protocol;
        }
        if let Some(base) = &overrides.base_url {
            self.base_url = Some(base.clone());
        }
        if let Some(branch) = &overrides.branch {
            self.default_branch.clone_from(branch);
        }
        if overrides.no_gitignore {
            self.write_gitignore = false;
        }
        self.validate(Path::new("command-line flags"))
    }

    /// Commit author name for a new repository
    #[must_use]
    pub fn fallback_user_name(&self, account: &str) -> String {
        self.user_name
            .clone()
            .unwrap_or_else(|| account.to_string())
    }

    /// Commit author email for a new repository
    #[must_use]
    pub fn fallback_user_email(&self, account: &str) -> String {
        self.user_email
            .clone()
            .unwrap_or_else(|| format!("{account}@users.noreply.{}", self.host))
    }
}
