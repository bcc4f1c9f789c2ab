//! Update command handlers.

use crate::args::UpdateTransactionArgs;
use crate::commands::{open_store, Out};
use crate::model::Transaction;
use crate::remote::Mode;
use crate::{Config, Result};
use anyhow::{bail, ensure};

/// Changes the fields of one transaction in place. Its id and position in the month-file stay
/// the same, and so does its month-file, even when the date moves to another month.
///
/// The new values are taken as given, they are not validated the way a new transaction is.
///
/// # Returns
///
/// On success, returns an `Out` containing:
/// - A message indicating the transaction was updated.
/// - The updated `Transaction`.
///
/// # Errors
///
/// - Returns an error if no field is given.
/// - Returns an error if the month-file has no transaction with the id. Nothing is written.
/// - Returns an error if the remote cannot be cloned, or a file cannot be read or written.
pub async fn update_transaction(
    config: Config,
    mode: Mode,
    args: UpdateTransactionArgs,
) -> Result<Out<Transaction>> {
    ensure!(args.has_changes(), "Nothing to update, give at least one field");
    let month = args.month.month_key()?;

    let store = open_store(config, mode).await?;
    let mut table = store.load_transactions(month).await?;
    let Some(transaction) = table.get_mut(args.id) else {
        bail!("There is no transaction with ID {} in {month}", args.id);
    };

    if let Some(amount) = args.amount {
        transaction.amount = amount;
    }
    if let Some(category) = &args.category {
        transaction.category = category.trim().to_string();
    }
    if let Some(note) = &args.note {
        transaction.note = note.trim().to_string();
    }
    if let Some(date) = args.date {
        transaction.date = Some(date);
    }
    if let Some(source) = &args.source {
        transaction.source = source.trim().to_string();
    }
    let updated = transaction.clone();

    store.save_transactions(month, &table).await?;
    Ok(Out::new(
        format!("Updated transaction {} in {month}", args.id),
        updated,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::MonthArgs;
    use crate::model::Amount;
    use crate::test::TestEnv;

    const MARCH: &str = "id,date,type,amount,category,note,source\n\
                         1,2024-03-01,expense,10,Food,,Card\n\
                         2,2024-03-02,expense,20,Fun,movie,Cash\n";

    fn edit(id: u64) -> UpdateTransactionArgs {
        UpdateTransactionArgs {
            id,
            month: MonthArgs::of(2024, 3),
            ..UpdateTransactionArgs::default()
        }
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let env = TestEnv::new().await;
        env.seed_remote("budget_data/2024-03.csv", MARCH);

        let args = UpdateTransactionArgs {
            amount: Some("25.75".parse::<Amount>().unwrap()),
            category: Some("Dining".to_string()),
            ..edit(2)
        };
        let out = update_transaction(env.config(), Mode::Test, args)
            .await
            .unwrap();
        let updated = out.structure().unwrap();
        assert_eq!(updated.category, "Dining");
        assert_eq!(updated.note, "movie");

        assert_eq!(
            env.read_data("budget_data/2024-03.csv"),
            "id,date,type,amount,category,note,source\n\
             1,2024-03-01,expense,10,Food,,Card\n\
             2,2024-03-02,expense,25.75,Dining,movie,Cash\n"
        );
    }

    #[tokio::test]
    async fn test_update_keeps_unparsable_cells_of_other_rows() {
        let env = TestEnv::new().await;
        env.seed_remote(
            "budget_data/2024-03.csv",
            "id,date,type,amount,category,note,source\n\
             1,2024-03-01,expense,10,Food,,Card\n\
             2,15/03/2024,transfer,20,Savings,,Bank\n",
        );

        let args = UpdateTransactionArgs {
            note: Some("lunch".to_string()),
            ..edit(1)
        };
        update_transaction(env.config(), Mode::Test, args)
            .await
            .unwrap();
        assert_eq!(
            env.read_data("budget_data/2024-03.csv"),
            "id,date,type,amount,category,note,source\n\
             1,2024-03-01,expense,10,Food,lunch,Card\n\
             2,15/03/2024,transfer,20,Savings,,Bank\n"
        );
    }

    #[tokio::test]
    async fn test_update_unknown_id_writes_nothing() {
        let env = TestEnv::new().await;
        env.seed_remote("budget_data/2024-03.csv", MARCH);

        let args = UpdateTransactionArgs {
            note: Some("x".to_string()),
            ..edit(9)
        };
        let err = update_transaction(env.config(), Mode::Test, args)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ID 9"));
        assert_eq!(env.read_data("budget_data/2024-03.csv"), MARCH);
    }

    #[tokio::test]
    async fn test_update_without_fields_is_rejected() {
        let env = TestEnv::new().await;
        assert!(update_transaction(env.config(), Mode::Test, edit(1))
            .await
            .is_err());
    }
}
