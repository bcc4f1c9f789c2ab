//! Summaries of the ledger. Everything here is a pure function of the rows passed in.
//!
//! Rows whose type could not be read (neither `income` nor `expense`) count towards nothing.

use crate::model::{Amount, LedgerEntry, Transaction, TxnType};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub income: Amount,
    pub expense: Amount,
    /// `income - expense`
    pub balance: Amount,
}

impl Totals {
    fn add(&mut self, transaction: &Transaction) {
        match transaction.r#type {
            Some(TxnType::Income) => self.income += transaction.amount,
            Some(TxnType::Expense) => self.expense += transaction.amount,
            None => return,
        }
        self.balance = self.income - self.expense;
    }
}

/// Income, expense and balance over `rows`. All zero when there are no rows.
pub fn totals<'a>(rows: impl IntoIterator<Item = &'a Transaction>) -> Totals {
    let mut totals = Totals::default();
    for row in rows {
        totals.add(row);
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyRow {
    pub category: String,
    #[serde(rename = "type")]
    pub r#type: TxnType,
    pub total: Amount,
}

/// The sum of each (category, type) pair. Expenses come before income, then larger totals first,
/// then categories alphabetically.
pub fn category_tally<'a>(rows: impl IntoIterator<Item = &'a Transaction>) -> Vec<TallyRow> {
    let mut sums: BTreeMap<(TxnType, &str), Amount> = BTreeMap::new();
    for row in rows {
        if let Some(r#type) = row.r#type {
            *sums.entry((r#type, row.category.as_str())).or_default() += row.amount;
        }
    }
    let mut tally: Vec<TallyRow> = sums
        .into_iter()
        .map(|((r#type, category), total)| TallyRow {
            category: category.to_string(),
            r#type,
            total,
        })
        .collect();
    tally.sort_by(|a, b| {
        a.r#type
            .cmp(&b.r#type)
            .then_with(|| b.total.cmp(&a.total))
            .then_with(|| a.category.cmp(&b.category))
    });
    tally
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Amount,
}

/// The `n` expense categories with the largest totals. Ties are broken alphabetically.
pub fn top_categories<'a>(
    rows: impl IntoIterator<Item = &'a Transaction>,
    n: usize,
) -> Vec<CategoryTotal> {
    let mut sums: BTreeMap<&str, Amount> = BTreeMap::new();
    for row in rows.into_iter().filter(|r| r.is_expense()) {
        *sums.entry(row.category.as_str()).or_default() += row.amount;
    }
    let mut top: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
        })
        .collect();
    top.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    top.truncate(n);
    top
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthRollup {
    pub year: i32,
    pub month: u32,
    pub income: Amount,
    pub expense: Amount,
    pub balance: Amount,
}

/// Totals per month-file, in chronological order.
pub fn monthly_rollup(entries: &[LedgerEntry]) -> Vec<MonthRollup> {
    let mut months: BTreeMap<(i32, u32), Totals> = BTreeMap::new();
    for entry in entries {
        months
            .entry((entry.month.year(), entry.month.month()))
            .or_default()
            .add(&entry.transaction);
    }
    months
        .into_iter()
        .map(|((year, month), t)| MonthRollup {
            year,
            month,
            income: t.income,
            expense: t.expense,
            balance: t.balance,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearRollup {
    pub year: i32,
    pub income: Amount,
    pub expense: Amount,
    pub balance: Amount,
}

/// Totals per year, in chronological order.
pub fn yearly_rollup(entries: &[LedgerEntry]) -> Vec<YearRollup> {
    let mut years: BTreeMap<i32, Totals> = BTreeMap::new();
    for entry in entries {
        years
            .entry(entry.month.year())
            .or_default()
            .add(&entry.transaction);
    }
    years
        .into_iter()
        .map(|(year, t)| YearRollup {
            year,
            income: t.income,
            expense: t.expense,
            balance: t.balance,
        })
        .collect()
}
