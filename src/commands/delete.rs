//! Delete command handlers.

use crate::args::{DeleteRecurringArgs, DeleteTransactionArgs, LabelArgs};
use crate::commands::{open_store, Out};
use crate::model::{LabelKind, RecurringCharge, Transaction};
use crate::remote::Mode;
use crate::{Config, Result};
use anyhow::bail;

/// Removes exactly one transaction from its month-file. The other rows keep their ids and order.
///
/// # Returns
///
/// On success, returns an `Out` containing a message and the removed `Transaction`.
///
/// # Errors
///
/// - Returns an error if the month-file has no transaction with the id. Nothing is written.
/// - Returns an error if the remote cannot be cloned, or a file cannot be read or written.
pub async fn delete_transaction(
    config: Config,
    mode: Mode,
    args: DeleteTransactionArgs,
) -> Result<Out<Transaction>> {
    let month = args.month.month_key()?;
    let store = open_store(config, mode).await?;
    let mut table = store.load_transactions(month).await?;
    let Some(removed) = table.remove(args.id) else {
        bail!("There is no transaction with ID {} in {month}", args.id);
    };
    store.save_transactions(month, &table).await?;
    Ok(Out::new(
        format!("Deleted transaction {} from {month}", args.id),
        removed,
    ))
}

/// Removes a category or source from its list. Transactions that use it are not changed.
///
/// # Errors
///
/// - Returns an error if the value is not in the list. Nothing is written.
/// - Returns an error if the remote cannot be cloned, or a file cannot be read or written.
pub async fn delete_label(
    config: Config,
    mode: Mode,
    kind: LabelKind,
    args: LabelArgs,
) -> Result<Out<String>> {
    let name = args.name.trim();
    let store = open_store(config, mode).await?;
    let mut labels = store.load_labels(kind).await?;
    if !labels.remove_value(name) {
        bail!("The {kind} '{name}' does not exist");
    }
    store.save_labels(kind, &labels).await?;
    Ok(Out::new(format!("Deleted {kind}: {name}"), name.to_string()))
}

/// Removes a recurring charge template.
///
/// # Errors
///
/// - Returns an error if there is no template with the id. Nothing is written.
/// - Returns an error if the remote cannot be cloned, or a file cannot be read or written.
pub async fn delete_recurring(
    config: Config,
    mode: Mode,
    args: DeleteRecurringArgs,
) -> Result<Out<RecurringCharge>> {
    let store = open_store(config, mode).await?;
    let mut table = store.load_recurring().await?;
    let Some(removed) = table.remove(args.id) else {
        bail!("There is no recurring charge with ID {}", args.id);
    };
    store.save_recurring(&table).await?;
    Ok(Out::new(
        format!("Deleted recurring charge {}", args.id),
        removed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::MonthArgs;
    use crate::model::MonthKey;
    use crate::test::TestEnv;

    const HEADER: &str = "id,date,type,amount,category,note,source\n";

    #[tokio::test]
    async fn test_delete_transaction_removes_exactly_one() {
        let env = TestEnv::new().await;
        env.seed_remote(
            "budget_data/2024-03.csv",
            &format!(
                "{HEADER}1,2024-03-01,expense,10,Food,,Card\n\
                 2,2024-03-02,expense,20,Fun,,Cash\n\
                 3,2024-03-03,income,30,Gift,,Bank\n"
            ),
        );

        let args = DeleteTransactionArgs {
            id: 2,
            month: MonthArgs::of(2024, 3),
        };
        let out = delete_transaction(env.config(), Mode::Test, args.clone())
            .await
            .unwrap();
        assert_eq!(out.structure().map(|t| t.category.as_str()), Some("Fun"));

        let month = MonthKey::new(2024, 3).unwrap();
        let table = env.store().load_transactions(month).await.unwrap();
        let ids: Vec<u64> = table.rows().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);

        assert!(delete_transaction(env.config(), Mode::Test, args)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_delete_label_does_not_cascade() {
        let env = TestEnv::new().await;
        env.seed_remote("categories.csv", "category\nFood\nFun\n");
        env.seed_remote(
            "budget_data/2024-03.csv",
            &format!("{HEADER}1,2024-03-01,expense,10,Food,,Card\n"),
        );

        delete_label(env.config(), Mode::Test, LabelKind::Category, LabelArgs::new("Food"))
            .await
            .unwrap();
        assert_eq!(env.read_data("categories.csv"), "category\nFun\n");
        let month = MonthKey::new(2024, 3).unwrap();
        let table = env.store().load_transactions(month).await.unwrap();
        assert_eq!(table.rows()[0].category, "Food");

        let err = delete_label(env.config(), Mode::Test, LabelKind::Category, LabelArgs::new("Food"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_delete_recurring() {
        let env = TestEnv::new().await;
        env.seed_remote(
            "recurring.csv",
            "id,type,amount,category,note,source\n1,income,1000,Salary,,\n2,expense,900,Rent,,Bank\n",
        );
        let out = delete_recurring(env.config(), Mode::Test, DeleteRecurringArgs { id: 1 })
            .await
            .unwrap();
        assert_eq!(out.structure().map(|r| r.id), Some(1));
        let table = env.store().load_recurring().await.unwrap();
        assert_eq!(table.len(), 1);
        assert!(
            delete_recurring(env.config(), Mode::Test, DeleteRecurringArgs { id: 7 })
                .await
                .is_err()
        );
    }
}
