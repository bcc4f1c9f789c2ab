use crate::model::schema::{AMOUNT, CATEGORY, DATE, ID, NOTE, SOURCE, TYPE};
use crate::model::table::{keep_unparsed, Identified, Row};
use crate::model::{Amount, MonthKey, TxnType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Represents a single row of a month-file.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    /// Unique within its month-file only.
    pub id: u64,
    pub date: Option<NaiveDate>,
    /// `None` when the file holds something other than `income` or `expense`.
    #[serde(rename = "type")]
    pub r#type: Option<TxnType>,
    pub amount: Amount,
    pub category: String,
    pub note: String,
    pub source: String,
    /// Columns found in the file that are not part of the transactions schema.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other_fields: BTreeMap<String, String>,
    /// Raw `date` and `type` cells that did not parse, written back as they were read.
    #[serde(skip)]
    pub unparsed: BTreeMap<String, String>,
}

impl Transaction {
    pub fn new(
        id: u64,
        date: NaiveDate,
        r#type: TxnType,
        amount: Amount,
        category: impl Into<String>,
        note: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id,
            date: Some(date),
            r#type: Some(r#type),
            amount,
            category: category.into(),
            note: note.into(),
            source: source.into(),
            other_fields: BTreeMap::new(),
            unparsed: BTreeMap::new(),
        }
    }

    pub fn is_income(&self) -> bool {
        self.r#type == Some(TxnType::Income)
    }

    pub fn is_expense(&self) -> bool {
        self.r#type == Some(TxnType::Expense)
    }
}

impl Row for Transaction {
    fn set_with_header(&mut self, header: &str, value: String) {
        match header {
            ID => self.id = value.parse().unwrap_or_default(),
            DATE => {
                self.date = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok();
                keep_unparsed(&mut self.unparsed, DATE, value, self.date.is_some());
            }
            TYPE => {
                self.r#type = TxnType::from_cell(&value);
                keep_unparsed(&mut self.unparsed, TYPE, value, self.r#type.is_some());
            }
            AMOUNT => self.amount = Amount::coerce(&value),
            CATEGORY => self.category = value,
            NOTE => self.note = value,
            SOURCE => self.source = value,
            other => {
                let _ = self.other_fields.insert(other.to_string(), value);
            }
        }
    }

    fn get_by_header(&self, header: &str) -> String {
        match header {
            ID => self.id.to_string(),
            DATE => match self.date {
                Some(date) => date.format(DATE_FORMAT).to_string(),
                None => self.unparsed.get(DATE).cloned().unwrap_or_default(),
            },
            TYPE => match self.r#type {
                Some(_) => TxnType::to_cell(self.r#type),
                None => self.unparsed.get(TYPE).cloned().unwrap_or_default(),
            },
            AMOUNT => self.amount.to_string(),
            CATEGORY => self.category.clone(),
            NOTE => self.note.clone(),
            SOURCE => self.source.clone(),
            other => self.other_fields.get(other).cloned().unwrap_or_default(),
        }
    }
}

impl Identified for Transaction {
    fn id(&self) -> u64 {
        self.id
    }
}

/// A transaction together with the month-file it was read from. The month is taken from the file
/// name, it is not stored in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub month: MonthKey,
    pub transaction: Transaction,
}
