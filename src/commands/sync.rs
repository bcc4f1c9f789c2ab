use crate::commands::Out;
use crate::remote::{Mode, Remote, SyncDown, SyncUp};
use crate::{Config, Result};

/// Refreshes the local clone from the remote and copies the ledger files into the working set,
/// replacing local copies.
///
/// # Errors
/// - Returns an error if the remote cannot be cloned, including after a failed pull.
pub async fn sync_down(config: Config, mode: Mode) -> Result<Out<SyncDown>> {
    let report = Remote::for_mode(config, mode).sync_down().await?;
    let how = if report.cloned { "cloned" } else { "pulled" };
    let message = format!(
        "Synced down {} file(s) ({how}) at {}",
        report.files, report.synced_at
    );
    Ok(Out::new(message, report))
}

/// Copies the working set into the local clone, commits and pushes it. When the push is rejected
/// the remote is overwritten with a force-push.
///
/// Unlike the push that follows every change, this reports failures as errors.
///
/// # Errors
/// - Returns an error if there is no clone and cloning fails.
/// - Returns an error if the force-push fails.
pub async fn sync_up(config: Config, mode: Mode) -> Result<Out<SyncUp>> {
    let report = Remote::for_mode(config, mode).sync_up().await?;
    let message = match (report.committed, report.forced) {
        (false, _) => "Nothing new to commit, the remote is up to date".to_string(),
        (true, false) => format!("Pushed {} file(s)", report.files),
        (true, true) => format!("Force-pushed {} file(s)", report.files),
    };
    Ok(Out::new(message, report))
}
