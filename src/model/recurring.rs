use crate::model::schema::{AMOUNT, CATEGORY, ID, NOTE, SOURCE, TYPE};
use crate::model::table::{keep_unparsed, Identified, Row};
use crate::model::{Amount, TxnType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A template that is turned into a transaction each time recurring charges are applied to a
/// month. A blank `source` means the applied transaction gets the source `Recurring`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecurringCharge {
    pub id: u64,
    #[serde(rename = "type")]
    pub r#type: Option<TxnType>,
    pub amount: Amount,
    pub category: String,
    pub note: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other_fields: BTreeMap<String, String>,
    #[serde(skip)]
    pub unparsed: BTreeMap<String, String>,
}

impl RecurringCharge {
    pub fn new(
        id: u64,
        r#type: TxnType,
        amount: Amount,
        category: impl Into<String>,
        note: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id,
            r#type: Some(r#type),
            amount,
            category: category.into(),
            note: note.into(),
            source: source.into(),
            other_fields: BTreeMap::new(),
            unparsed: BTreeMap::new(),
        }
    }
}

impl Row for RecurringCharge {
    fn set_with_header(&mut self, header: &str, value: String) {
        match header {
            ID => self.id = value.parse().unwrap_or_default(),
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

impl Identified for RecurringCharge {
    fn id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schema::RECURRING;
    use crate::model::Table;

    #[test]
    fn test_unknown_type_is_written_back() {
        let records = vec![
            vec!["id", "type", "amount", "category", "note", "source"],
            vec!["1", "transfer", "50", "Savings", "", "Bank"],
        ];
        let table: Table<RecurringCharge> = Table::parse(&RECURRING, records);
        assert_eq!(table.rows()[0].r#type, None);
        assert_eq!(table.to_records()[1][1], "transfer");
    }
}
