//! Declares the columns of every ledger table, their kinds and their typed defaults.
//!
//! Loading, saving and backfilling all consult these descriptors, so a column is added to a table
//! by adding it here and teaching the row type about it.

use crate::model::Amount;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

pub const ID: &str = "id";
pub const DATE: &str = "date";
pub const TYPE: &str = "type";
pub const AMOUNT: &str = "amount";
pub const CATEGORY: &str = "category";
pub const NOTE: &str = "note";
pub const SOURCE: &str = "source";

/// How the cells of a column are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// A non-negative whole number, e.g. an id.
    Integer,
    /// A money value.
    Decimal,
    /// Free text, including dates and enum values.
    Text,
}

impl ColumnKind {
    /// The value used when a column is missing from a file or a row is short.
    pub fn default_value(&self) -> &'static str {
        match self {
            ColumnKind::Integer | ColumnKind::Decimal => "0",
            ColumnKind::Text => "",
        }
    }

    /// Normalizes a raw cell. Numeric cells that cannot be parsed become zero. Returns the value
    /// and whether it had to be replaced.
    pub fn coerce(&self, raw: &str) -> (String, bool) {
        match self {
            ColumnKind::Text => (raw.to_string(), false),
            ColumnKind::Integer => match coerce_integer(raw) {
                Some(n) => (n.to_string(), false),
                None => (self.default_value().to_string(), !raw.trim().is_empty()),
            },
            ColumnKind::Decimal => match Amount::from_str(raw) {
                Ok(amount) => (amount.to_string(), false),
                Err(_) => (self.default_value().to_string(), !raw.trim().is_empty()),
            },
        }
    }
}

/// Accepts `7`, and also `7.0` which is how some spreadsheet tools write whole numbers.
fn coerce_integer(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return Some(n);
    }
    let amount = Amount::from_str(trimmed).ok()?;
    let value = amount.value();
    if value.is_sign_negative() || !value.fract().is_zero() || trimmed.is_empty() {
        return None;
    }
    value.to_u64()
}

/// A single declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn column(name: &'static str, kind: ColumnKind) -> ColumnDef {
    ColumnDef { name, kind }
}

/// The declared shape of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Schema {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl Schema {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }
}

pub static TRANSACTIONS: Schema = Schema {
    name: "transactions",
    columns: &[
        column(ID, ColumnKind::Integer),
        column(DATE, ColumnKind::Text),
        column(TYPE, ColumnKind::Text),
        column(AMOUNT, ColumnKind::Decimal),
        column(CATEGORY, ColumnKind::Text),
        column(NOTE, ColumnKind::Text),
        column(SOURCE, ColumnKind::Text),
    ],
};

pub static RECURRING: Schema = Schema {
    name: "recurring",
    columns: &[
        column(ID, ColumnKind::Integer),
        column(TYPE, ColumnKind::Text),
        column(AMOUNT, ColumnKind::Decimal),
        column(CATEGORY, ColumnKind::Text),
        column(NOTE, ColumnKind::Text),
        column(SOURCE, ColumnKind::Text),
    ],
};

pub static CATEGORIES: Schema = Schema {
    name: "categories",
    columns: &[column(CATEGORY, ColumnKind::Text)],
};

pub static SOURCES: Schema = Schema {
    name: "sources",
    columns: &[column(SOURCE, ColumnKind::Text)],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integer() {
        assert_eq!(ColumnKind::Integer.coerce("12"), ("12".to_string(), false));
        assert_eq!(ColumnKind::Integer.coerce(" 3.0 "), ("3".to_string(), false));
        assert_eq!(ColumnKind::Integer.coerce("abc"), ("0".to_string(), true));
        assert_eq!(ColumnKind::Integer.coerce("-4"), ("0".to_string(), true));
        assert_eq!(ColumnKind::Integer.coerce("2.5"), ("0".to_string(), true));
    }

    #[test]
    fn test_coerce_empty_integer_is_silent_default() {
        assert_eq!(ColumnKind::Integer.coerce(""), ("0".to_string(), false));
    }

    #[test]
    fn test_coerce_decimal() {
        assert_eq!(
            ColumnKind::Decimal.coerce("$1,000.50"),
            ("1000.50".to_string(), false)
        );
        assert_eq!(ColumnKind::Decimal.coerce("n/a"), ("0".to_string(), true));
        assert_eq!(ColumnKind::Decimal.coerce(""), ("0".to_string(), false));
    }

    #[test]
    fn test_coerce_text_is_untouched() {
        assert_eq!(ColumnKind::Text.coerce(" x "), (" x ".to_string(), false));
    }

    #[test]
    fn test_schema_lookup() {
        assert_eq!(
            TRANSACTIONS.column(AMOUNT).map(|c| c.kind),
            Some(ColumnKind::Decimal)
        );
        assert!(TRANSACTIONS.column("Year").is_none());
        let names: Vec<&str> = RECURRING.column_names().collect();
        assert_eq!(names, vec!["id", "type", "amount", "category", "note", "source"]);
    }
}
