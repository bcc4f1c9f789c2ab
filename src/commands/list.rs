use crate::args::MonthArgs;
use crate::commands::{open_store, Out};
use crate::model::{LabelKind, RecurringCharge, Transaction, TxnType};
use crate::remote::Mode;
use crate::{Config, Result};
use std::fmt::Write;

/// Prints the transactions of one month-file in file order.
pub async fn list_transactions(
    config: Config,
    mode: Mode,
    args: MonthArgs,
) -> Result<Out<Vec<Transaction>>> {
    let month = args.month_key()?;
    let store = open_store(config, mode).await?;
    let rows = store.load_transactions(month).await?.into_rows();

    let mut message = format!("{} transaction(s) in {month}", rows.len());
    for t in &rows {
        let date = t.date.map(|d| d.to_string()).unwrap_or_default();
        let _ = write!(
            message,
            "\n{:>4}  {date:<10}  {:<7}  {:>12}  {:<16}  {:<12}  {}",
            t.id,
            type_name(t.r#type),
            t.amount.currency(),
            t.category,
            t.source,
            t.note
        );
    }
    Ok(Out::new(message, rows))
}

/// Prints the categories or sources in file order.
pub async fn list_labels(config: Config, mode: Mode, kind: LabelKind) -> Result<Out<Vec<String>>> {
    let store = open_store(config, mode).await?;
    let values: Vec<String> = store
        .load_labels(kind)
        .await?
        .values()
        .into_iter()
        .map(String::from)
        .collect();

    let mut message = format!("{} {}", values.len(), kind.plural());
    for value in &values {
        let _ = write!(message, "\n  {value}");
    }
    Ok(Out::new(message, values))
}

/// Prints the recurring charge templates.
pub async fn list_recurring(config: Config, mode: Mode) -> Result<Out<Vec<RecurringCharge>>> {
    let store = open_store(config, mode).await?;
    let rows = store.load_recurring().await?.into_rows();

    let mut message = format!("{} recurring charge(s)", rows.len());
    for r in &rows {
        let source = if r.source.is_empty() { "-" } else { &r.source };
        let _ = write!(
            message,
            "\n{:>4}  {:<7}  {:>12}  {:<16}  {:<12}  {}",
            r.id,
            type_name(r.r#type),
            r.amount.currency(),
            r.category,
            source,
            r.note
        );
    }
    Ok(Out::new(message, rows))
}

fn type_name(r#type: Option<TxnType>) -> String {
    r#type.map(|t| t.to_string()).unwrap_or_else(|| "?".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_list_transactions() {
        let env = TestEnv::new().await;
        env.seed_remote(
            "budget_data/2024-03.csv",
            "id,date,type,amount,category,note,source\n\
             1,2024-03-01,expense,1234.5,Rent,march,Bank\n",
        );
        let out = list_transactions(env.config(), Mode::Test, MonthArgs::of(2024, 3))
            .await
            .unwrap();
        assert!(out.message().starts_with("1 transaction(s) in 2024-03"));
        assert!(out.message().contains("$1,234.50"));
        assert_eq!(out.structure().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_list_empty_month() {
        let env = TestEnv::new().await;
        let out = list_transactions(env.config(), Mode::Test, MonthArgs::of(2020, 1))
            .await
            .unwrap();
        assert_eq!(out.message(), "0 transaction(s) in 2020-01");
    }

    #[tokio::test]
    async fn test_list_labels_and_recurring() {
        let env = TestEnv::new().await;
        env.seed_remote("sources.csv", "source\nCard\nCash\nCard\n");
        env.seed_remote(
            "recurring.csv",
            "id,type,amount,category,note,source\n1,income,1000,Salary,,\n",
        );

        let out = list_labels(env.config(), Mode::Test, LabelKind::Source)
            .await
            .unwrap();
        assert_eq!(out.structure(), Some(&vec!["Card".to_string(), "Cash".to_string()]));
        assert_eq!(out.message(), "2 sources\n  Card\n  Cash");

        let out = list_recurring(env.config(), Mode::Test).await.unwrap();
        assert!(out.message().contains("Salary"));
    }
}
