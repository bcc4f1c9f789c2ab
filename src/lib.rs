//! budget-sync keeps a personal ledger of income and expenses as CSV files in a git repository.
//!
//! The [`store::Store`] reads and writes the ledger files of a local working set, the
//! [`remote::Remote`] keeps that working set in step with the repository, and [`aggregate`] turns
//! transactions into totals and rollups. The [`commands`] tie these together for the CLI.

pub mod aggregate;
pub mod apply;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod remote;
pub mod store;
mod utils;


pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use remote::Mode;
