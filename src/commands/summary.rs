use crate::aggregate::{self, CategoryTotal, MonthRollup, TallyRow, Totals, YearRollup};
use crate::args::{ReportArgs, SummaryArgs};
use crate::commands::{open_store, Out};
use crate::model::MonthKey;
use crate::remote::Mode;
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Write;

/// The figures for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub month: MonthKey,
    pub totals: Totals,
    pub top_categories: Vec<CategoryTotal>,
    pub tally: Vec<TallyRow>,
}

/// The figures for the whole ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub years: Vec<YearRollup>,
    pub months: Vec<MonthRollup>,
    pub top_categories: Vec<CategoryTotal>,
}

/// Totals, the top expense categories and the per-category tally of one month.
pub async fn summary(config: Config, mode: Mode, args: SummaryArgs) -> Result<Out<Summary>> {
    let month = args.month.month_key()?;
    let store = open_store(config, mode).await?;
    let table = store.load_transactions(month).await?;
    let summary = Summary {
        month,
        totals: aggregate::totals(table.rows()),
        top_categories: aggregate::top_categories(table.rows(), args.top),
        tally: aggregate::category_tally(table.rows()),
    };

    let t = &summary.totals;
    let mut message = format!(
        "{month}: income {}, expense {}, balance {}",
        t.income.currency(),
        t.expense.currency(),
        t.balance.currency()
    );
    write_top(&mut message, &summary.top_categories);
    if !summary.tally.is_empty() {
        message.push_str("\nBy category:");
        for row in &summary.tally {
            let _ = write!(
                message,
                "\n  {:<7}  {:<16}  {:>12}",
                row.r#type.to_string(),
                row.category,
                row.total.currency()
            );
        }
    }
    Ok(Out::new(message, summary))
}

/// Yearly and monthly totals over every month-file, with the all-time top expense categories.
pub async fn report(config: Config, mode: Mode, args: ReportArgs) -> Result<Out<Report>> {
    let store = open_store(config, mode).await?;
    let entries = store.load_all_transactions().await?;
    let report = Report {
        years: aggregate::yearly_rollup(&entries),
        months: aggregate::monthly_rollup(&entries),
        top_categories: aggregate::top_categories(
            entries.iter().map(|e| &e.transaction),
            args.top,
        ),
    };

    let mut message = format!(
        "{} transaction(s) across {} month(s)",
        entries.len(),
        report.months.len()
    );
    if !report.years.is_empty() {
        message.push_str("\nBy year:");
        for y in &report.years {
            let _ = write!(
                message,
                "\n  {}     income {:>12}  expense {:>12}  balance {:>12}",
                y.year,
                y.income.currency(),
                y.expense.currency(),
                y.balance.currency()
            );
        }
        message.push_str("\nBy month:");
        for m in &report.months {
            let _ = write!(
                message,
                "\n  {}-{:02}  income {:>12}  expense {:>12}  balance {:>12}",
                m.year,
                m.month,
                m.income.currency(),
                m.expense.currency(),
                m.balance.currency()
            );
        }
    }
    write_top(&mut message, &report.top_categories);
    Ok(Out::new(message, report))
}

fn write_top(message: &mut String, top: &[CategoryTotal]) {
    if top.is_empty() {
        return;
    }
    message.push_str("\nTop expense categories:");
    for (ix, c) in top.iter().enumerate() {
        let _ = write!(
            message,
            "\n  {}. {:<16}  {:>12}",
            ix + 1,
            c.category,
            c.total.currency()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::MonthArgs;
    use crate::model::Amount;
    use crate::test::TestEnv;

    const HEADER: &str = "id,date,type,amount,category,note,source\n";

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn seed(env: &TestEnv) {
        env.seed_remote(
            "budget_data/2024-03.csv",
            &format!(
                "{HEADER}1,2024-03-01,expense,42.50,Food,,Card\n\
                 2,2024-03-05,expense,900,Rent,,Bank\n\
                 3,2024-03-06,expense,12,Fun,,Cash\n\
                 4,2024-03-07,expense,3,Books,,Cash\n\
                 5,2024-03-25,income,2000,Salary,,Bank\n"
            ),
        );
        env.seed_remote(
            "budget_data/2023-12.csv",
            &format!("{HEADER}1,2023-12-24,expense,100,Gifts,,Card\n"),
        );
    }

    #[tokio::test]
    async fn test_summary_of_month() {
        let env = TestEnv::new().await;
        seed(&env);
        let args = SummaryArgs {
            month: MonthArgs::of(2024, 3),
            top: 3,
        };
        let out = summary(env.config(), Mode::Test, args).await.unwrap();
        let s = out.structure().unwrap();
        assert_eq!(s.totals.income, amt("2000"));
        assert_eq!(s.totals.expense, amt("957.50"));
        assert_eq!(s.totals.balance, amt("1042.50"));
        let top: Vec<&str> = s.top_categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(top, vec!["Rent", "Food", "Fun"]);
        assert_eq!(s.tally.len(), 5);
        assert!(out.message().starts_with("2024-03: income $2,000.00"));
    }

    #[tokio::test]
    async fn test_summary_of_empty_month() {
        let env = TestEnv::new().await;
        let args = SummaryArgs {
            month: MonthArgs::of(2022, 6),
            top: 3,
        };
        let out = summary(env.config(), Mode::Test, args).await.unwrap();
        let s = out.structure().unwrap();
        assert_eq!(s.totals, Totals::default());
        assert!(s.tally.is_empty());
    }

    #[tokio::test]
    async fn test_report() {
        let env = TestEnv::new().await;
        seed(&env);
        let out = report(env.config(), Mode::Test, ReportArgs { top: 5 })
            .await
            .unwrap();
        let r = out.structure().unwrap();
        let years: Vec<i32> = r.years.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2023, 2024]);
        assert_eq!(r.months.len(), 2);
        assert_eq!(r.months[0].expense, amt("100"));
        assert_eq!(r.top_categories.len(), 5);
        assert_eq!(r.top_categories[1].category, "Gifts");
    }
}
