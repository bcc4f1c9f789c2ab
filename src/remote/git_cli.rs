use crate::config::redact;
use crate::remote::Git;
use crate::Result;
use anyhow::{bail, Context};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs the `git` executable found on the `PATH`.
#[derive(Debug, Clone)]
pub struct GitCli {
    committer_name: String,
    committer_email: String,
}

impl GitCli {
    pub fn new(committer_name: impl Into<String>, committer_email: impl Into<String>) -> Self {
        Self {
            committer_name: committer_name.into(),
            committer_email: committer_email.into(),
        }
    }

    /// Runs git with `args`, inside `dir` when given, and returns its standard output. Any
    /// occurrence of `url` in the arguments or the output is redacted before it reaches a log line
    /// or an error message.
    async fn run(&self, dir: Option<&Path>, args: &[&str], url: Option<&str>) -> Result<String> {
        let scrub = |s: &str| match url {
            Some(url) if !url.is_empty() => s.replace(url, &redact(url)),
            _ => s.to_string(),
        };
        let printable = scrub(&args.join(" "));
        debug!("Running git {printable}");

        let mut cmd = Command::new("git");
        cmd.arg("-c")
            .arg(format!("user.name={}", self.committer_name))
            .arg("-c")
            .arg(format!("user.email={}", self.committer_email));
        if let Some(dir) = dir {
            cmd.arg("-C").arg(dir);
        }
        let output = cmd
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .await
            .context("Unable to run git, is it installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "git {printable} failed ({}): {}",
                output.status,
                scrub(stderr.trim())
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait::async_trait]
impl Git for GitCli {
    async fn clone_repo(&self, url: &str, branch: Option<&str>, dir: &Path) -> Result<()> {
        let dir_arg = dir.to_string_lossy().into_owned();
        let mut args = vec!["clone"];
        if let Some(branch) = branch {
            args.extend(["--branch", branch]);
        }
        args.extend([url, dir_arg.as_str()]);
        self.run(None, &args, Some(url)).await?;
        Ok(())
    }

    async fn pull(&self, dir: &Path) -> Result<()> {
        self.run(Some(dir), &["pull", "--ff-only"], None).await?;
        Ok(())
    }

    async fn add_all(&self, dir: &Path) -> Result<()> {
        self.run(Some(dir), &["add", "-A"], None).await?;
        Ok(())
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<bool> {
        let status = self
            .run(Some(dir), &["status", "--porcelain"], None)
            .await?;
        if status.trim().is_empty() {
            return Ok(false);
        }
        self.run(Some(dir), &["commit", "-m", message], None).await?;
        Ok(true)
    }

    async fn push(&self, dir: &Path) -> Result<()> {
        self.run(Some(dir), &["push", "origin", "HEAD"], None)
            .await?;
        Ok(())
    }

    async fn force_push(&self, dir: &Path) -> Result<()> {
        self.run(Some(dir), &["push", "--force", "origin", "HEAD"], None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::Remote;
    use crate::Config;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn git_installed() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn home(dir: &Path, name: &str, url: &str) -> Remote {
        let config = Config::create(dir.join(name), url, None, None)
            .await
            .unwrap();
        let git = GitCli::new(config.committer_name(), config.committer_email());
        Remote::new(config, Arc::new(git))
    }

    #[tokio::test]
    async fn test_round_trip_through_a_bare_repository() {
        if !git_installed() {
            eprintln!("git is not installed, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let bare = dir.path().join("ledger.git");
        let status = std::process::Command::new("git")
            .args(["init", "--bare", "--quiet"])
            .arg(&bare)
            .status()
            .unwrap();
        assert!(status.success());
        let url = bare.to_string_lossy().into_owned();

        let laptop = home(dir.path(), "laptop", &url).await;
        let report = laptop.sync_down().await.unwrap();
        assert_eq!(report.files, 0);

        let categories = laptop.config().data_dir().join("categories.csv");
        std::fs::write(&categories, "category\nFood\n").unwrap();
        let up = laptop.sync_up().await.unwrap();
        assert!(up.committed);
        assert!(!up.forced);
        assert!(!laptop.sync_up().await.unwrap().committed);

        let desktop = home(dir.path(), "desktop", &url).await;
        desktop.sync_down().await.unwrap();
        let copied = desktop.config().data_dir().join("categories.csv");
        assert_eq!(std::fs::read_to_string(&copied).unwrap(), "category\nFood\n");

        std::fs::write(&copied, "category\nFood\nRent\n").unwrap();
        desktop.sync_up().await.unwrap();
        laptop.sync_down().await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&categories).unwrap(),
            "category\nFood\nRent\n"
        );
    }

    #[tokio::test]
    async fn test_failed_command_is_named_in_the_error() {
        if !git_installed() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let git = GitCli::new("budget-sync", "budget-sync@localhost");
        let url = format!("{}/missing.git", dir.path().display());
        let err = git
            .clone_repo(&url, None, &dir.path().join("clone"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("git clone"));
    }
}
