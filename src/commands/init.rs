use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its subdirectories and:
/// - Creates an initial `config.json` file using `remote_url` along with default settings
/// - Moves `token_file`, if given, into its default location in the home directory.
///
/// Nothing is cloned yet, that happens on the first command that reads the ledger.
///
/// # Arguments
/// - `budget_home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/budget`
/// - `remote_url` - The URL of the git repository where the ledger is stored.
/// - `token_file` - A file holding an access token for the repository, if it needs one.
/// - `branch` - The branch to use instead of the repository's default branch.
///
/// # Errors
/// - Returns an error if the URL is blank.
/// - Returns an error if any file operations fail.
pub async fn init(
    budget_home: &Path,
    remote_url: &str,
    token_file: Option<&Path>,
    branch: Option<&str>,
) -> Result<Out<()>> {
    let _config = Config::create(
        budget_home,
        remote_url,
        token_file,
        branch.map(String::from),
    )
    .await
    .context("Unable to create the budget home directory and config")?;
    Ok("Successfully created the budget directory and config".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("budget");
        let token = dir.path().join("token.txt");
        std::fs::write(&token, "s3cret\n").unwrap();

        let out = init(&home, "https://example.com/me/ledger.git", Some(&token), None)
            .await
            .unwrap();
        assert!(out.message().contains("Successfully"));
        assert!(!token.exists());

        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.remote_url(), "https://example.com/me/ledger.git");
        assert!(config.token_path().is_file());
    }

    #[tokio::test]
    async fn test_init_rejects_blank_url() {
        let dir = TempDir::new().unwrap();
        assert!(init(dir.path(), "  ", None, None).await.is_err());
    }
}
