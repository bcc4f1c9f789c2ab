use crate::model::schema::Schema;
use std::collections::HashMap;
use tracing::warn;

/// The header row of a ledger file: which column index holds which header.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    headers: Vec<String>,
    header_map: HashMap<String, usize>,
}

impl Mapping {
    /// Create a new `Mapping` from a header row. Headers are trimmed. When a header appears more
    /// than once only its first column is used.
    pub fn new<S, I>(headers: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|s| s.into().trim().to_string())
            .collect();
        let mut header_map = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if header_map.contains_key(header) {
                warn!("Ignoring duplicate column '{header}' at index {idx}");
                continue;
            }
            header_map.insert(header.clone(), idx);
        }
        Self {
            headers,
            header_map,
        }
    }

    /// The mapping a new file gets: exactly the declared columns.
    pub fn from_schema(schema: &Schema) -> Self {
        Self::new(schema.column_names())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn header_index(&self, header: &str) -> Option<usize> {
        self.header_map.get(header).cloned()
    }

    pub fn contains(&self, header: &str) -> bool {
        self.header_map.contains_key(header)
    }

    /// Headers that are in the file but not declared by `schema`, in file order. Blank headers
    /// and duplicates are dropped.
    pub fn extra_headers(&self, schema: &Schema) -> Vec<String> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(idx, h)| {
                !h.is_empty()
                    && schema.column(h).is_none()
                    && self.header_index(h) == Some(*idx)
            })
            .map(|(_, h)| h.clone())
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::schema::TRANSACTIONS;

    #[test]
    fn test_mapping_trims_and_indexes() {
        let mapping = Mapping::new(vec![" id", "amount ", "category"]);
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.header_index("amount"), Some(1));
        assert!(!mapping.contains("note"));
    }

    #[test]
    fn test_mapping_duplicate_first_wins() {
        let mapping = Mapping::new(vec!["id", "note", "note"]);
        assert_eq!(mapping.header_index("note"), Some(1));
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn test_extra_headers() {
        let mapping = Mapping::new(vec!["id", "Year", "amount", "", "tag", "tag"]);
        assert_eq!(mapping.extra_headers(&TRANSACTIONS), vec!["Year", "tag"]);
    }

    #[test]
    fn test_from_schema() {
        let mapping = Mapping::from_schema(&TRANSACTIONS);
        assert_eq!(mapping.headers()[0], "id");
        assert_eq!(mapping.len(), TRANSACTIONS.columns.len());
        assert!(mapping.extra_headers(&TRANSACTIONS).is_empty());
    }
}
