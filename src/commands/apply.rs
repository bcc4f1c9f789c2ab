use crate::apply::apply_to_month;
use crate::args::MonthArgs;
use crate::commands::{open_store, Out};
use crate::remote::Mode;
use crate::{Config, Result};

/// Adds one transaction per recurring charge to the month-file, dated today. Returns how many
/// were added.
///
/// # Errors
/// - Returns an error if the remote cannot be cloned, or a file cannot be read or written.
pub async fn apply_recurring(config: Config, mode: Mode, args: MonthArgs) -> Result<Out<usize>> {
    let month = args.month_key()?;
    let store = open_store(config, mode).await?;
    let count = apply_to_month(&store, month).await?;
    let message = if count == 0 {
        "There are no recurring charges to apply".to_string()
    } else {
        format!("Applied {count} recurring charge(s) to {month}")
    };
    Ok(Out::new(message, count))
}
