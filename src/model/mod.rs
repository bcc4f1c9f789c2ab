//! Types that represent the ledger data model, such as `Transaction` and `RecurringCharge`, and
//! the schema-driven `Table` they are read into.
mod amount;
mod category;
mod kind;
mod mapping;
mod month;
mod recurring;
pub mod schema;
mod table;
mod transaction;

pub use amount::{Amount, AmountError};
pub use category::{Label, LabelKind};
pub use kind::TxnType;
pub use mapping::Mapping;
pub use month::MonthKey;
pub use recurring::RecurringCharge;
pub use schema::{ColumnDef, ColumnKind, Schema};
pub use table::{Identified, Row, Table};
pub use transaction::{LedgerEntry, Transaction};
