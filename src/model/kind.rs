use serde::{Deserialize, Serialize};

/// Whether money came in or went out.
///
/// The declaration order is the sort order used by the category tally: `expense` sorts before
/// `income`, which matches their names sorted alphabetically.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Expense,
    Income,
}

serde_plain::derive_display_from_serialize!(TxnType);
serde_plain::derive_fromstr_from_deserialize!(TxnType);

impl TxnType {
    /// Parses a cell value, returning `None` for anything that is not `income` or `expense`.
    pub(crate) fn from_cell(value: &str) -> Option<TxnType> {
        value.trim().to_lowercase().parse().ok()
    }

    /// The cell value for an optional type, empty when there is none.
    pub(crate) fn to_cell(value: Option<TxnType>) -> String {
        value.map(|t| t.to_string()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        assert_eq!(TxnType::Income.to_string(), "income");
        assert_eq!("expense".parse::<TxnType>().unwrap(), TxnType::Expense);
    }

    #[test]
    fn test_from_cell_is_lenient() {
        assert_eq!(TxnType::from_cell(" Income "), Some(TxnType::Income));
        assert_eq!(TxnType::from_cell("transfer"), None);
        assert_eq!(TxnType::from_cell(""), None);
    }

    #[test]
    fn test_order() {
        assert!(TxnType::Expense < TxnType::Income);
    }
}
