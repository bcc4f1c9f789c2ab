//! Configuration file handling for the budget home directory.
//!
//! The configuration file is stored at `$BUDGET_HOME/config.json` and contains the remote git
//! repository URL, the commit identity and the optional location of the access token.

use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

const APP_NAME: &str = "budget";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const TOKEN: &str = "token";
const CONFIG_JSON: &str = "config.json";
const DATA: &str = "data";
const REPO: &str = "repo";
const LAST_SYNCED: &str = "last_synced.txt";
const DEFAULT_COMMITTER_NAME: &str = "budget-sync";
const DEFAULT_COMMITTER_EMAIL: &str = "budget-sync@localhost";

/// When set, this environment variable takes precedence over the token file.
pub const TOKEN_ENV: &str = "BUDGET_GIT_TOKEN";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BUDGET_HOME` and from there it loads `$BUDGET_HOME/config.json`. It provides
/// paths to the working set, the local clone and the other files that live in the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    data: PathBuf,
    repo: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its subdirectories and:
    /// - Creates an initial `config.json` file using `remote_url` along with default settings
    /// - Moves `token_file`, if given, into its default location in the home directory.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/budget`
    /// - `remote_url` - The URL of the git repository that holds the ledger files.
    /// - `token_file` - A file holding an access token for the remote.
    /// - `branch` - The branch to clone, or `None` for the remote's default branch.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        remote_url: &str,
        token_file: Option<&Path>,
        branch: Option<String>,
    ) -> Result<Self> {
        if remote_url.trim().is_empty() {
            bail!("The remote URL must not be empty");
        }

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budget home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;
        let data = root.join(DATA);
        utils::make_dir(&data).await?;

        if let Some(token_file) = token_file {
            utils::rename(token_file, secrets.join(TOKEN)).await?;
        }

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            remote_url: remote_url.trim().to_string(),
            branch,
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            repo: root.join(REPO),
            root,
            secrets,
            data,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the `budget_home` exists and that the config file exists
    /// - load the config file
    /// - make sure the working set directory exists
    /// - return the loaded configuration object
    pub async fn load(budget_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = budget_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The budget home directory is missing, run 'budget init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let data = root.join(DATA);
        utils::make_dir(&data).await?;

        Ok(Self {
            secrets: root.join(SECRETS),
            repo: root.join(REPO),
            root,
            data,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// The local working set: the directory the store reads and writes.
    pub fn data_dir(&self) -> &Path {
        &self.data
    }

    /// The local clone of the remote repository.
    pub fn repo_dir(&self) -> &Path {
        &self.repo
    }

    pub fn last_synced_path(&self) -> PathBuf {
        self.root.join(LAST_SYNCED)
    }

    pub fn remote_url(&self) -> &str {
        &self.config_file.remote_url
    }

    pub fn branch(&self) -> Option<&str> {
        self.config_file.branch.as_deref()
    }

    pub fn committer_name(&self) -> &str {
        &self.config_file.committer_name
    }

    pub fn committer_email(&self) -> &str {
        &self.config_file.committer_email
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves the relative path.
    pub fn token_path(&self) -> PathBuf {
        let p = self.config_file.token_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Returns the access token from `$BUDGET_GIT_TOKEN`, or else from the token file. A missing
    /// token is not an error, the remote may not need one.
    pub async fn token(&self) -> Result<Option<String>> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                debug!("Using the git token from {TOKEN_ENV}");
                return Ok(Some(token.trim().to_string()));
            }
        }
        let path = self.token_path();
        if !path.is_file() {
            return Ok(None);
        }
        let token = utils::read(&path).await?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    /// The remote URL with the access token injected into the user-info, when there is a token
    /// and the remote is an http(s) URL. Anything else is returned unchanged.
    pub async fn authenticated_url(&self) -> Result<String> {
        let token = self.token().await?;
        Ok(authenticate(self.remote_url(), token.as_deref()))
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budget",
///   "config_version": 1,
///   "remote_url": "https://github.com/someone/budget-ledger.git",
///   "committer_name": "budget-sync",
///   "committer_email": "budget-sync@localhost",
///   "token_path": ".secrets/token"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "budget"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL of the git repository that holds the ledger
    remote_url: String,

    /// Branch to clone, the remote's default branch when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch: Option<String>,

    #[serde(default = "default_committer_name")]
    committer_name: String,

    #[serde(default = "default_committer_email")]
    committer_email: String,

    /// Path to the access token file (optional, relative to the home directory or absolute)
    /// Defaults to $BUDGET_HOME/.secrets/token if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

fn default_committer_name() -> String {
    DEFAULT_COMMITTER_NAME.to_string()
}

fn default_committer_email() -> String {
    DEFAULT_COMMITTER_EMAIL.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            remote_url: String::new(),
            branch: None,
            committer_name: default_committer_name(),
            committer_email: default_committer_email(),
            token_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            !config.remote_url.trim().is_empty(),
            "The config file at {} has an empty remote_url",
            path.display()
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the token path.
    ///
    /// If the path is relative, it should be interpreted as relative to the home directory.
    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN))
    }
}

fn authenticate(remote_url: &str, token: Option<&str>) -> String {
    let Some(token) = token else {
        return remote_url.to_string();
    };
    match Url::parse(remote_url) {
        Ok(mut url) if matches!(url.scheme(), "http" | "https") => {
            if url.set_username(token).is_err() {
                return remote_url.to_string();
            }
            url.to_string()
        }
        _ => remote_url.to_string(),
    }
}

/// Strips any user-info from `remote_url` so that it can be logged.
pub(crate) fn redact(remote_url: &str) -> String {
    match Url::parse(remote_url) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            let _ = url.set_username("***");
            let _ = url.set_password(None);
            url.to_string()
        }
        _ => remote_url.to_string(),
    }
}
