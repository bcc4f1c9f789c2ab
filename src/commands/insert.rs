//! Insert command handlers.

use crate::args::{InsertRecurringArgs, InsertTransactionArgs, LabelArgs};
use crate::commands::{non_blank, open_store, Out};
use crate::model::{LabelKind, RecurringCharge, Transaction};
use crate::remote::Mode;
use crate::store::Store;
use crate::{Config, Result};
use anyhow::ensure;
use chrono::Local;
use tracing::info;

/// Adds a transaction to a month-file.
///
/// The transaction gets the next free id of its month-file, which is returned on success. If its
/// category or source is not in the corresponding list yet, it is added there as well.
///
/// # Arguments
///
/// - `config` - The application configuration.
/// - `mode` - Whether to use the real remote or the test remote.
/// - `args` - The transaction to add. The date defaults to today and the month-file defaults to
///   the month of the date.
///
/// # Errors
///
/// - Returns an error if the amount is not positive, or the category or source is blank. Nothing
///   is written in that case.
/// - Returns an error if the remote cannot be cloned, or a file cannot be read or written.
pub async fn insert_transaction(
    config: Config,
    mode: Mode,
    args: InsertTransactionArgs,
) -> Result<Out<u64>> {
    ensure!(args.amount.is_positive(), "The amount must be greater than zero");
    let category = non_blank("category", &args.category)?;
    let source = non_blank("source", &args.source)?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let month = args.month.month_key_or(date)?;

    let store = open_store(config, mode).await?;
    let mut table = store.load_transactions(month).await?;
    let id = table.next_id()?;
    table.push(Transaction::new(
        id,
        date,
        args.r#type,
        args.amount,
        category,
        args.note.trim(),
        source,
    ));
    store.save_transactions(month, &table).await?;

    add_label_if_missing(&store, LabelKind::Category, category).await?;
    add_label_if_missing(&store, LabelKind::Source, source).await?;

    let message = format!(
        "Inserted {} of {} into {month} with ID: {id}",
        args.r#type,
        args.amount.currency()
    );
    Ok(Out::new(message, id))
}

/// Adds a category or source. Adding a value that is already present changes nothing.
///
/// # Errors
///
/// - Returns an error if the name is blank.
/// - Returns an error if the remote cannot be cloned, or a file cannot be read or written.
pub async fn insert_label(
    config: Config,
    mode: Mode,
    kind: LabelKind,
    args: LabelArgs,
) -> Result<Out<String>> {
    let name = non_blank(&kind.to_string(), &args.name)?;
    let store = open_store(config, mode).await?;
    let message = if add_label_if_missing(&store, kind, name).await? {
        format!("Inserted {kind}: {name}")
    } else {
        format!("The {kind} '{name}' already exists")
    };
    Ok(Out::new(message, name.to_string()))
}

/// Adds a recurring charge template. Its id is returned on success.
///
/// # Errors
///
/// - Returns an error if the amount is not positive or the category is blank. Nothing is written
///   in that case.
/// - Returns an error if the remote cannot be cloned, or a file cannot be read or written.
pub async fn insert_recurring(
    config: Config,
    mode: Mode,
    args: InsertRecurringArgs,
) -> Result<Out<u64>> {
    ensure!(args.amount.is_positive(), "The amount must be greater than zero");
    let category = non_blank("category", &args.category)?;

    let store = open_store(config, mode).await?;
    let mut table = store.load_recurring().await?;
    let id = table.next_id()?;
    table.push(RecurringCharge::new(
        id,
        args.r#type,
        args.amount,
        category,
        args.note.trim(),
        args.source.trim(),
    ));
    store.save_recurring(&table).await?;

    let message = format!(
        "Inserted recurring {} of {} for {category} with ID: {id}",
        args.r#type,
        args.amount.currency()
    );
    Ok(Out::new(message, id))
}

/// Returns whether the label was added.
async fn add_label_if_missing(store: &Store, kind: LabelKind, value: &str) -> Result<bool> {
    let mut labels = store.load_labels(kind).await?;
    if !labels.insert(value) {
        return Ok(false);
    }
    store.save_labels(kind, &labels).await?;
    info!("Added {value} to the {}", kind.plural());
    Ok(true)
}
