//! Keeps the local working set in step with a remote git repository.
//!
//! `sync_down` refreshes a local clone and copies the ledger files out of it, `sync_up` copies the
//! ledger files into the clone, commits and pushes. Both are fail-open towards the remote: a
//! failed pull is answered with a fresh clone and a rejected push with a force-push, so the last
//! writer always wins.

mod git_cli;
mod test_git;

use crate::config::redact;
use crate::store::{DATA_FOLDER, ROOT_FILES};
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use git_cli::GitCli;
pub use test_git::TestGit;

/// When set and non-empty, the remote is simulated with [`TestGit`] instead of the `git`
/// executable.
pub const TEST_MODE_ENV: &str = "BUDGET_SYNC_IN_TEST_MODE";

/// The directory, inside the home directory, that stands in for the remote in [`Mode::Test`].
pub(crate) const TEST_REMOTE: &str = ".test_remote";

const GIT_DIR: &str = ".git";

/// Whether we talk to a real git remote or to a simulated one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Git,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Git,
        }
    }
}

/// The git operations that synchronization needs. Every method operates on the clone at `dir`.
#[async_trait::async_trait]
pub trait Git: Send + Sync {
    /// Clones `url` into `dir`, which must not exist.
    async fn clone_repo(&self, url: &str, branch: Option<&str>, dir: &Path) -> Result<()>;

    /// Fast-forward pull from the tracked remote branch.
    async fn pull(&self, dir: &Path) -> Result<()>;

    /// Stages every change in the working tree, including deletions.
    async fn add_all(&self, dir: &Path) -> Result<()>;

    /// Commits the staged changes. Returns `false` when there was nothing to commit.
    async fn commit(&self, dir: &Path, message: &str) -> Result<bool>;

    async fn push(&self, dir: &Path) -> Result<()>;

    /// Pushes, overwriting whatever the remote branch holds.
    async fn force_push(&self, dir: &Path) -> Result<()>;
}

/// What `sync_down` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncDown {
    /// How many ledger files were copied into the working set.
    pub files: usize,
    /// Whether the local clone had to be (re)created.
    pub cloned: bool,
    /// The timestamp written to `last_synced.txt`.
    pub synced_at: String,
}

/// What `sync_up` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncUp {
    /// How many ledger files were copied into the clone.
    pub files: usize,
    /// `false` when the working set matched the clone.
    pub committed: bool,
    /// Whether the normal push was rejected and a force-push was used.
    pub forced: bool,
}

/// The remote sync adapter.
#[derive(Clone)]
pub struct Remote {
    config: Config,
    git: Arc<dyn Git>,
}

impl std::fmt::Debug for Remote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remote")
            .field("remote_url", &redact(self.config.remote_url()))
            .field("repo_dir", &self.config.repo_dir())
            .finish()
    }
}

impl Remote {
    pub fn new(config: Config, git: Arc<dyn Git>) -> Self {
        Self { config, git }
    }

    /// Creates a `Remote` backed by the `git` executable, or by a [`TestGit`] whose remote is a
    /// directory in the home directory, depending on `mode`.
    pub fn for_mode(config: Config, mode: Mode) -> Self {
        let git: Arc<dyn Git> = match mode {
            Mode::Git => Arc::new(GitCli::new(
                config.committer_name(),
                config.committer_email(),
            )),
            Mode::Test => Arc::new(TestGit::new(config.root().join(TEST_REMOTE))),
        };
        Self::new(config, git)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Makes sure a fresh local clone exists and copies the ledger files from it into the working
    /// set, overwriting local copies. The remote always wins here.
    ///
    /// # Errors
    /// - Returns an error if cloning fails, including the fresh clone that follows a failed pull.
    /// - Returns an error if the files cannot be copied or `last_synced.txt` cannot be written.
    pub async fn sync_down(&self) -> Result<SyncDown> {
        let repo = self.config.repo_dir();
        let cloned = if !self.has_valid_clone() {
            info!("No valid clone at {}, cloning", repo.display());
            self.fresh_clone().await?;
            true
        } else {
            match self.git.pull(repo).await {
                Ok(()) => {
                    debug!("Pulled the latest changes into {}", repo.display());
                    false
                }
                Err(e) => {
                    warn!("Pull failed, discarding the clone and cloning again: {e:#}");
                    self.fresh_clone()
                        .await
                        .context("Unable to clone the remote after a failed pull")?;
                    true
                }
            }
        };

        let files = copy_tracked(repo, self.config.data_dir()).await?;
        let synced_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        utils::write(self.config.last_synced_path(), format!("{synced_at}\n")).await?;
        info!("Synced down {files} file(s) at {synced_at}");

        Ok(SyncDown {
            files,
            cloned,
            synced_at,
        })
    }

    /// Copies the working set into the clone, commits and pushes. A rejected push is followed by
    /// a force-push.
    ///
    /// # Errors
    /// - Returns an error if there is no clone and cloning fails.
    /// - Returns an error if the force-push fails.
    pub async fn sync_up(&self) -> Result<SyncUp> {
        let repo = self.config.repo_dir();
        if !self.has_valid_clone() {
            info!("No valid clone at {}, cloning before push", repo.display());
            self.fresh_clone().await?;
        }

        let files = copy_tracked(self.config.data_dir(), repo).await?;
        self.git.add_all(repo).await?;

        let message = format!("Auto-update on {}", Local::now().format("%Y-%m-%dT%H:%M:%S%.6f"));
        let committed = match self.git.commit(repo, &message).await {
            Ok(committed) => committed,
            Err(e) => {
                warn!("Commit failed, pushing anyway: {e:#}");
                false
            }
        };
        if !committed {
            debug!("Nothing new to commit in {}", repo.display());
        }

        let forced = match self.git.push(repo).await {
            Ok(()) => false,
            Err(e) => {
                warn!("Push was rejected, force-pushing: {e:#}");
                self.git
                    .force_push(repo)
                    .await
                    .context("Force-push to the remote failed")?;
                true
            }
        };
        info!(
            "Synced up {files} file(s){}",
            if forced { " with force" } else { "" }
        );

        Ok(SyncUp {
            files,
            committed,
            forced,
        })
    }

    /// The contents of `last_synced.txt`, if a sync-down has ever completed.
    pub async fn last_synced(&self) -> Result<Option<String>> {
        let path = self.config.last_synced_path();
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(utils::read(&path).await?.trim().to_string()))
    }

    fn has_valid_clone(&self) -> bool {
        self.config.repo_dir().join(GIT_DIR).is_dir()
    }

    /// Discards whatever is at the clone location and clones the remote again.
    async fn fresh_clone(&self) -> Result<()> {
        let repo = self.config.repo_dir();
        utils::remove_dir_all(repo).await?;
        let url = self.config.authenticated_url().await?;
        self.git
            .clone_repo(&url, self.config.branch(), repo)
            .await
            .with_context(|| format!("Unable to clone {}", redact(self.config.remote_url())))
    }
}

/// Copies the ledger files from the `from` tree to the `to` tree: the label and recurring files at
/// the root and every file in the month-file folder. Returns the number of files copied.
async fn copy_tracked(from: &Path, to: &Path) -> Result<usize> {
    let mut count = 0;
    for name in ROOT_FILES {
        let source = from.join(name);
        if source.is_file() {
            utils::make_dir(to).await?;
            utils::copy(&source, to.join(name)).await?;
            count += 1;
        }
    }

    let month_files = utils::list_files(from.join(DATA_FOLDER)).await?;
    if !month_files.is_empty() {
        utils::make_dir(to.join(DATA_FOLDER)).await?;
    }
    for source in month_files {
        if let Some(name) = source.file_name() {
            utils::copy(&source, to.join(DATA_FOLDER).join(name)).await?;
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_sync_down_clones_and_copies() {
        let env = TestEnv::new().await;
        env.seed_remote("categories.csv", "category\nFood\n");
        env.seed_remote("budget_data/2024-03.csv", "id,date,type,amount,category,note,source\n");

        let report = env.remote().sync_down().await.unwrap();
        assert!(report.cloned);
        assert_eq!(report.files, 2);
        let data = env.config().data_dir().to_path_buf();
        assert!(data.join("categories.csv").is_file());
        assert!(data.join("budget_data").join("2024-03.csv").is_file());
        assert_eq!(
            env.remote().last_synced().await.unwrap(),
            Some(report.synced_at)
        );
    }

    #[tokio::test]
    async fn test_sync_down_remote_wins() {
        let env = TestEnv::new().await;
        env.seed_remote("sources.csv", "source\nCard\n");
        env.remote().sync_down().await.unwrap();

        let local = env.config().data_dir().join("sources.csv");
        std::fs::write(&local, "source\nLocal only\n").unwrap();
        env.remote().sync_down().await.unwrap();
        assert_eq!(std::fs::read_to_string(&local).unwrap(), "source\nCard\n");
    }

    #[tokio::test]
    async fn test_sync_down_pulls_when_clone_exists() {
        let env = TestEnv::new().await;
        env.remote().sync_down().await.unwrap();
        let report = env.remote().sync_down().await.unwrap();
        assert!(!report.cloned);
        assert_eq!(env.git().count_calls("clone"), 1);
        assert_eq!(env.git().count_calls("pull"), 1);
    }

    #[tokio::test]
    async fn test_sync_down_reclones_after_failed_pull() {
        let env = TestEnv::new().await;
        env.remote().sync_down().await.unwrap();
        env.git().set_fail_pull(true);
        env.seed_remote("recurring.csv", "id,type,amount,category,note,source\n");

        let report = env.remote().sync_down().await.unwrap();
        assert!(report.cloned);
        assert_eq!(env.git().count_calls("clone"), 2);
        assert!(env.config().data_dir().join("recurring.csv").is_file());
    }

    #[tokio::test]
    async fn test_sync_down_reclones_invalid_clone() {
        let env = TestEnv::new().await;
        let repo = env.config().repo_dir().to_path_buf();
        std::fs::create_dir_all(&repo).unwrap();
        std::fs::write(repo.join("junk.txt"), "partial").unwrap();

        let report = env.remote().sync_down().await.unwrap();
        assert!(report.cloned);
        assert!(!repo.join("junk.txt").exists());
    }

    #[tokio::test]
    async fn test_sync_down_fails_when_clone_fails() {
        let env = TestEnv::new().await;
        env.git().set_fail_clone(1);
        assert!(env.remote().sync_down().await.is_err());
    }

    #[tokio::test]
    async fn test_sync_up_pushes() {
        let env = TestEnv::new().await;
        std::fs::write(env.config().data_dir().join("categories.csv"), "category\nRent\n")
            .unwrap();

        let report = env.remote().sync_up().await.unwrap();
        assert!(report.committed);
        assert!(!report.forced);
        assert_eq!(env.read_remote("categories.csv"), Some("category\nRent\n".to_string()));
    }

    #[tokio::test]
    async fn test_sync_up_nothing_to_commit_is_fine() {
        let env = TestEnv::new().await;
        env.seed_remote("categories.csv", "category\nFood\n");
        env.remote().sync_down().await.unwrap();

        let report = env.remote().sync_up().await.unwrap();
        assert!(!report.committed);
        assert!(!report.forced);
    }

    #[tokio::test]
    async fn test_sync_up_force_pushes_when_rejected() {
        let env = TestEnv::new().await;
        env.remote().sync_down().await.unwrap();
        env.git().set_fail_push(true);
        std::fs::write(env.config().data_dir().join("sources.csv"), "source\nCash\n").unwrap();

        let report = env.remote().sync_up().await.unwrap();
        assert!(report.forced);
        assert_eq!(env.git().count_calls("force_push"), 1);
        assert_eq!(env.read_remote("sources.csv"), Some("source\nCash\n".to_string()));
    }

    #[tokio::test]
    async fn test_sync_up_commit_error_still_pushes() {
        let env = TestEnv::new().await;
        env.git().set_fail_commit(true);
        std::fs::write(env.config().data_dir().join("sources.csv"), "source\nCash\n").unwrap();

        let report = env.remote().sync_up().await.unwrap();
        assert!(!report.committed);
        assert_eq!(env.git().count_calls("push"), 1);
    }

    #[test]
    fn test_mode_default() {
        assert_eq!(Mode::default(), Mode::Git);
    }
}
