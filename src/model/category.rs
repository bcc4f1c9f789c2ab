use crate::model::schema::{Schema, CATEGORIES, CATEGORY, SOURCE, SOURCES};
use crate::model::table::{Row, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which of the two label lists is meant. Categories and sources have the same shape and
/// lifecycle but are kept in independent files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Category,
    Source,
}

serde_plain::derive_display_from_serialize!(LabelKind);
serde_plain::derive_fromstr_from_deserialize!(LabelKind);

impl LabelKind {
    pub fn schema(&self) -> &'static Schema {
        match self {
            LabelKind::Category => &CATEGORIES,
            LabelKind::Source => &SOURCES,
        }
    }

    /// English plural, for messages.
    pub fn plural(&self) -> &'static str {
        match self {
            LabelKind::Category => "categories",
            LabelKind::Source => "sources",
        }
    }
}

/// Represents a single row of `categories.csv` or `sources.csv`. Both files have a single
/// declared column named after the list.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub value: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other_fields: BTreeMap<String, String>,
}

impl Label {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            other_fields: BTreeMap::new(),
        }
    }
}

impl Row for Label {
    fn set_with_header(&mut self, header: &str, value: String) {
        match header {
            CATEGORY | SOURCE => self.value = value,
            other => {
                let _ = self.other_fields.insert(other.to_string(), value);
            }
        }
    }

    fn get_by_header(&self, header: &str) -> String {
        match header {
            CATEGORY | SOURCE => self.value.clone(),
            other => self.other_fields.get(other).cloned().unwrap_or_default(),
        }
    }
}

/// A deduplicated, ordered list of labels. Matching is exact and case-sensitive.
impl Table<Label> {
    pub fn values(&self) -> Vec<&str> {
        self.rows().iter().map(|l| l.value.as_str()).collect()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.rows().iter().any(|l| l.value == value)
    }

    /// Appends `value` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, value: &str) -> bool {
        if self.contains(value) {
            return false;
        }
        self.push(Label::new(value));
        true
    }

    /// Removes `value`. Returns whether it was present.
    pub fn remove_value(&mut self, value: &str) -> bool {
        let before = self.len();
        self.rows_mut().retain(|l| l.value != value);
        before != self.len()
    }

    /// Drops blank entries and repeated entries, keeping the first occurrence. Returns how many
    /// rows were dropped.
    pub fn dedup(&mut self) -> usize {
        let before = self.len();
        let mut seen = std::collections::HashSet::new();
        self.rows_mut()
            .retain(|l| !l.value.trim().is_empty() && seen.insert(l.value.clone()));
        before - self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_exact_and_case_sensitive() {
        let mut labels: Table<Label> = Table::new(LabelKind::Category.schema());
        assert!(labels.insert("Food"));
        assert!(!labels.insert("Food"));
        assert!(labels.insert("food"));
        assert_eq!(labels.values(), vec!["Food", "food"]);
    }

    #[test]
    fn test_remove_value() {
        let mut labels: Table<Label> = Table::new(LabelKind::Source.schema());
        labels.insert("Card");
        labels.insert("Cash");
        assert!(labels.remove_value("Card"));
        assert!(!labels.remove_value("Card"));
        assert_eq!(labels.values(), vec!["Cash"]);
    }

    #[test]
    fn test_parse_and_dedup() {
        let mut labels: Table<Label> = Table::parse(
            LabelKind::Category.schema(),
            vec![
                vec!["category"],
                vec!["Food"],
                vec!["Rent"],
                vec!["Food"],
                vec![" "],
            ],
        );
        assert_eq!(labels.dedup(), 2);
        assert_eq!(labels.values(), vec!["Food", "Rent"]);
        assert_eq!(labels.to_records()[0], vec!["category".to_string()]);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(LabelKind::Source.to_string(), "source");
        assert_eq!(LabelKind::Category.plural(), "categories");
    }
}
