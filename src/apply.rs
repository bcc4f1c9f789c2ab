use crate::model::{MonthKey, Transaction};
use crate::store::Store;
use crate::Result;
use chrono::Local;
use tracing::{debug, info};

/// The source given to applied charges whose template has none.
pub const DEFAULT_SOURCE: &str = "Recurring";

/// Appends one transaction per recurring template to the month-file of `month` and saves it once.
/// The new rows are dated today, whatever the target month. Returns how many rows were added;
/// when there are no templates nothing is read or written beyond the templates themselves.
pub async fn apply_to_month(store: &Store, month: MonthKey) -> Result<usize> {
    let templates = store.load_recurring().await?;
    if templates.is_empty() {
        debug!("No recurring charges to apply to {month}");
        return Ok(0);
    }

    let today = Local::now().date_naive();
    let mut table = store.load_transactions(month).await?;
    for template in templates.rows() {
        let source = if template.source.trim().is_empty() {
            DEFAULT_SOURCE.to_string()
        } else {
            template.source.clone()
        };
        let transaction = Transaction {
            id: table.next_id()?,
            date: Some(today),
            r#type: template.r#type,
            amount: template.amount,
            category: template.category.clone(),
            note: template.note.clone(),
            source,
            ..Transaction::default()
        };
        table.push(transaction);
    }

    store.save_transactions(month, &table).await?;
    info!("Applied {} recurring charge(s) to {month}", templates.len());
    Ok(templates.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, RecurringCharge, Table, TxnType};
    use crate::model::schema::RECURRING;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_no_templates_writes_nothing() {
        let env = TestEnv::new().await;
        let month = MonthKey::new(2024, 4).unwrap();
        assert_eq!(apply_to_month(env.store(), month).await.unwrap(), 0);
        assert!(!env.store().path(&crate::store::TableKey::Month(month)).exists());
        assert_eq!(env.git().count_calls("push"), 0);
    }

    #[tokio::test]
    async fn test_applies_each_template_with_fresh_ids() {
        let env = TestEnv::new().await;
        let month = MonthKey::new(2024, 4).unwrap();
        env.write_data(
            "budget_data/2024-04.csv",
            "id,date,type,amount,category,note,source\n4,2024-04-01,expense,5,Food,,Card\n",
        );
        let templates = Table::with_rows(
            &RECURRING,
            vec![
                RecurringCharge::new(
                    1,
                    TxnType::Income,
                    "1000".parse::<Amount>().unwrap(),
                    "Salary",
                    "",
                    "",
                ),
                RecurringCharge::new(
                    2,
                    TxnType::Expense,
                    "900".parse::<Amount>().unwrap(),
                    "Rent",
                    "flat",
                    "Bank",
                ),
            ],
        );
        env.store().save_recurring(&templates).await.unwrap();
        let pushes = env.git().count_calls("push");

        assert_eq!(apply_to_month(env.store(), month).await.unwrap(), 2);
        assert_eq!(env.git().count_calls("push"), pushes + 1);

        let table = env.store().load_transactions(month).await.unwrap();
        let rows: Vec<(u64, &str, &str)> = table
            .rows()
            .iter()
            .map(|t| (t.id, t.category.as_str(), t.source.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![(4, "Food", "Card"), (5, "Salary", "Recurring"), (6, "Rent", "Bank")]
        );
        let today = Local::now().date_naive();
        assert_eq!(table.rows()[1].date, Some(today));
        assert_eq!(table.rows()[2].note, "flat");
    }
}
