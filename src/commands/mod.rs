//! Command handlers for the budget CLI.
//!
//! This module contains implementations for all CLI subcommands. Every handler that touches the
//! ledger starts with a sync-down, so it always works on the latest files from the remote.

mod apply;
mod delete;
mod init;
mod insert;
mod list;
mod summary;
mod sync;
mod update;

use crate::remote::{Mode, Remote};
use crate::store::Store;
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use apply::apply_recurring;
pub use delete::{delete_label, delete_recurring, delete_transaction};
pub use init::init;
pub use insert::{insert_label, insert_recurring, insert_transaction};
pub use list::{list_labels, list_recurring, list_transactions};
pub use summary::{report, summary, Report, Summary};
pub use sync::{sync_down, sync_up};
pub use update::update_transaction;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Creates the store for `config` and refreshes the working set from the remote.
///
/// # Errors
/// - Returns an error if the remote cannot be cloned.
async fn open_store(config: Config, mode: Mode) -> Result<Store> {
    let remote = Remote::for_mode(config, mode);
    let _ = remote.sync_down().await?;
    Ok(Store::new(remote))
}

/// Rejects blank values for the field called `what`, returning the value trimmed.
fn non_blank<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    anyhow::ensure!(!trimmed.is_empty(), "The {what} must not be blank");
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_from_message() {
        let out: Out<()> = "hello".into();
        assert_eq!(out.message(), "hello");
        assert!(out.structure().is_none());

        let out = Out::new("count", 3usize);
        assert_eq!(out.structure(), Some(&3));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("category", "  Food ").unwrap(), "Food");
        let err = non_blank("source", " \t").unwrap_err();
        assert_eq!(err.to_string(), "The source must not be blank");
    }
}
