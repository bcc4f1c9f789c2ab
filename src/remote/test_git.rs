//! A stand-in for the `git` executable whose "remote" is a plain directory.
//!
//! Note: this is compiled even in the production version so we can run the whole app top-to-bottom
//! without a network or a git installation. Set `BUDGET_SYNC_IN_TEST_MODE` to use it.

use crate::remote::Git;
use crate::Result;
use anyhow::{anyhow, bail, Context};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const GIT_DIR: &str = ".git";

/// Failure switches and a record of the calls made, shared between clones of a `TestGit`.
#[derive(Debug, Default, Clone)]
pub struct TestGitState {
    /// The names of the operations called, in order.
    pub calls: Vec<String>,
    /// The number of upcoming clones that fail.
    pub fail_clone: usize,
    pub fail_pull: bool,
    pub fail_commit: bool,
    /// Makes the normal push fail. A force-push still succeeds.
    pub fail_push: bool,
    /// Makes the force-push fail as well.
    pub fail_force_push: bool,
}

#[derive(Debug, Clone)]
pub struct TestGit {
    remote: PathBuf,
    state: Arc<Mutex<TestGitState>>,
}

impl TestGit {
    /// Creates a `TestGit` whose remote is the directory `remote`. It is created on first use.
    pub fn new(remote: impl Into<PathBuf>) -> Self {
        Self {
            remote: remote.into(),
            state: Arc::new(Mutex::new(TestGitState::default())),
        }
    }

    pub fn remote_dir(&self) -> &Path {
        &self.remote
    }

    pub fn get_state(&self) -> TestGitState {
        self.lock().clone()
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == name).count()
    }

    pub fn set_fail_clone(&self, count: usize) {
        self.lock().fail_clone = count;
    }

    pub fn set_fail_pull(&self, fail: bool) {
        self.lock().fail_pull = fail;
    }

    pub fn set_fail_commit(&self, fail: bool) {
        self.lock().fail_commit = fail;
    }

    pub fn set_fail_push(&self, fail: bool) {
        self.lock().fail_push = fail;
    }

    pub fn set_fail_force_push(&self, fail: bool) {
        self.lock().fail_force_push = fail;
    }

    fn lock(&self) -> MutexGuard<'_, TestGitState> {
        // A poisoned lock only means another test thread panicked; the state is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records the call and returns the state so the caller can check its failure switch.
    fn record(&self, name: &str) -> MutexGuard<'_, TestGitState> {
        let mut state = self.lock();
        state.calls.push(name.to_string());
        state
    }
}

#[async_trait::async_trait]
impl Git for TestGit {
    async fn clone_repo(&self, url: &str, _branch: Option<&str>, dir: &Path) -> Result<()> {
        {
            let mut state = self.record("clone");
            if state.fail_clone > 0 {
                state.fail_clone -= 1;
                bail!("Simulated failure cloning {url}");
            }
        }
        if dir.exists() {
            bail!("Destination {} already exists", dir.display());
        }
        std::fs::create_dir_all(&self.remote)
            .with_context(|| format!("Unable to create {}", self.remote.display()))?;
        mirror(&self.remote, dir)?;
        std::fs::create_dir_all(dir.join(GIT_DIR))
            .with_context(|| format!("Unable to create {}", dir.display()))?;
        Ok(())
    }

    async fn pull(&self, dir: &Path) -> Result<()> {
        if self.record("pull").fail_pull {
            bail!("Simulated failure pulling into {}", dir.display());
        }
        mirror(&self.remote, dir)
    }

    async fn add_all(&self, _dir: &Path) -> Result<()> {
        drop(self.record("add_all"));
        Ok(())
    }

    async fn commit(&self, dir: &Path, _message: &str) -> Result<bool> {
        if self.record("commit").fail_commit {
            bail!("Simulated failure committing in {}", dir.display());
        }
        Ok(snapshot(dir)? != snapshot(&self.remote)?)
    }

    async fn push(&self, dir: &Path) -> Result<()> {
        if self.record("push").fail_push {
            bail!("Simulated rejection of the push from {}", dir.display());
        }
        mirror(dir, &self.remote)
    }

    async fn force_push(&self, dir: &Path) -> Result<()> {
        if self.record("force_push").fail_force_push {
            bail!("Simulated failure force-pushing from {}", dir.display());
        }
        mirror(dir, &self.remote)
    }
}

/// Every file below `root`, outside of `.git`, keyed by its relative path.
fn snapshot(root: &Path) -> Result<BTreeMap<PathBuf, Vec<u8>>> {
    let mut files = BTreeMap::new();
    if root.is_dir() {
        walk(root, root, &mut files)?;
    }
    Ok(files)
}

fn walk(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) -> Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Unable to read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.file_name().is_some_and(|n| n == GIT_DIR) {
            continue;
        }
        if path.is_dir() {
            walk(root, &path, files)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .map_err(|e| anyhow!("{e}"))?
                .to_path_buf();
            let contents = std::fs::read(&path)
                .with_context(|| format!("Unable to read {}", path.display()))?;
            let _ = files.insert(relative, contents);
        }
    }
    Ok(())
}

/// Makes the files of `to` (outside of `.git`) the same as those of `from`.
fn mirror(from: &Path, to: &Path) -> Result<()> {
    let wanted = snapshot(from)?;
    for stale in snapshot(to)?.keys().filter(|k| !wanted.contains_key(*k)) {
        std::fs::remove_file(to.join(stale))
            .with_context(|| format!("Unable to remove {}", stale.display()))?;
    }
    for (relative, contents) in wanted {
        let path = to.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Unable to create {}", parent.display()))?;
        }
        std::fs::write(&path, contents)
            .with_context(|| format!("Unable to write {}", path.display()))?;
    }
    Ok(())
}
