use crate::model::mapping::Mapping;
use crate::model::schema::{ColumnKind, Schema};
use crate::Result;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::debug;

/// Keeps the raw text of a cell whose typed field could not be parsed, so that it is written back
/// unchanged. Forgets it again once the field parses.
pub(crate) fn keep_unparsed(
    unparsed: &mut BTreeMap<String, String>,
    header: &str,
    value: String,
    parsed: bool,
) {
    if parsed || value.trim().is_empty() {
        let _ = unparsed.remove(header);
    } else {
        let _ = unparsed.insert(header.to_string(), value);
    }
}

/// A typed row of a ledger table.
pub trait Row: Default + Debug + Clone + PartialEq {
    /// Given the `header` name and the `value`, set the appropriate struct field. Headers that the
    /// row type does not know about are kept so that they survive a round-trip.
    fn set_with_header(&mut self, header: &str, value: String);

    /// Given the `header` name, retrieve the appropriate struct field value.
    fn get_by_header(&self, header: &str) -> String;

    /// Given the order of the `headers`, convert the struct field values to a `Vec<String>` where
    /// the values appear in the right order according to the `headers` order.
    fn to_row(&self, headers: &[String]) -> Vec<String> {
        headers.iter().map(|h| self.get_by_header(h)).collect()
    }
}

/// A row that carries an id which is unique within its table.
pub trait Identified {
    fn id(&self) -> u64;
}

/// The rows of one ledger file, along with the schema it was read against and any undeclared
/// columns that were found in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<R: Row> {
    schema: &'static Schema,
    extra: Vec<String>,
    rows: Vec<R>,
}

impl<R: Row> Table<R> {
    /// An empty table with exactly the declared columns.
    pub fn new(schema: &'static Schema) -> Self {
        Self::with_rows(schema, Vec::new())
    }

    pub fn with_rows(schema: &'static Schema, rows: Vec<R>) -> Self {
        Self {
            schema,
            extra: Vec::new(),
            rows,
        }
    }

    /// Parses the raw records of a file. The first record is the header row. An empty record set
    /// gives an empty table.
    ///
    /// Parsing never fails: declared columns missing from the file are backfilled with their
    /// typed default, numeric cells that do not parse become zero, short rows are padded and
    /// cells beyond the header row are dropped.
    pub fn parse<S, Rec, I>(schema: &'static Schema, records: I) -> Self
    where
        S: Into<String>,
        Rec: IntoIterator<Item = S>,
        I: IntoIterator<Item = Rec>,
    {
        let mut records = records.into_iter();
        let mapping = match records.next() {
            Some(header_row) => Mapping::new(header_row),
            None => return Self::new(schema),
        };

        let missing: Vec<_> = schema
            .columns
            .iter()
            .filter(|c| !mapping.contains(c.name))
            .collect();
        if !missing.is_empty() {
            debug!(
                "Backfilling columns {:?} of the {} table",
                missing.iter().map(|c| c.name).collect::<Vec<_>>(),
                schema.name
            );
        }

        let mut rows = Vec::new();
        for (row_ix, record) in records.enumerate() {
            let values: Vec<String> = record.into_iter().map(|s| s.into()).collect();
            if values.len() > mapping.len() {
                debug!(
                    "Dropping {} cells beyond the header row at row {} of the {} table",
                    values.len() - mapping.len(),
                    row_ix + 2,
                    schema.name
                );
            }

            let mut row = R::default();
            for (col_ix, header) in mapping.headers().iter().enumerate() {
                if header.is_empty() || mapping.header_index(header) != Some(col_ix) {
                    continue;
                }
                let raw = values.get(col_ix).map(String::as_str).unwrap_or_default();
                let kind = schema
                    .column(header)
                    .map(|c| c.kind)
                    .unwrap_or(ColumnKind::Text);
                let (value, replaced) = kind.coerce(raw);
                if replaced {
                    debug!(
                        "Unparsable value '{raw}' in column '{header}' at row {} of the {} table \
                        was replaced with {value}",
                        row_ix + 2,
                        schema.name
                    );
                }
                row.set_with_header(header, value);
            }
            for column in &missing {
                row.set_with_header(column.name, column.kind.default_value().to_string());
            }
            rows.push(row);
        }

        Self {
            schema,
            extra: mapping.extra_headers(schema),
            rows,
        }
    }

    /// The header row that is written: the declared columns followed by the undeclared ones.
    pub fn headers(&self) -> Vec<String> {
        self.schema
            .column_names()
            .map(String::from)
            .chain(self.extra.iter().cloned())
            .collect()
    }

    /// Converts the table to records, header row first, suitable for writing to a file.
    pub fn to_records(&self) -> Vec<Vec<String>> {
        let headers = self.headers();
        let mut records = Vec::with_capacity(self.rows.len() + 1);
        records.extend(self.rows.iter().map(|r| r.to_row(&headers)));
        records.insert(0, headers);
        records
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<R> {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: R) {
        self.rows.push(row);
    }
}

impl<R: Row + Identified> Table<R> {
    /// `1` for an empty table, otherwise one more than the largest id.
    ///
    /// # Errors
    ///
    /// Returns an error if the largest id is already `u64::MAX`.
    pub fn next_id(&self) -> Result<u64> {
        match self.rows.iter().map(|r| r.id()).max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).with_context(|| {
                format!("The {} table has no id left after {max}", self.schema.name)
            }),
        }
    }

    pub fn get(&self, id: u64) -> Option<&R> {
        self.rows.iter().find(|r| r.id() == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut R> {
        self.rows.iter_mut().find(|r| r.id() == id)
    }

    /// Removes the row with `id`, leaving every other row in place.
    pub fn remove(&mut self, id: u64) -> Option<R> {
        let ix = self.rows.iter().position(|r| r.id() == id)?;
        Some(self.rows.remove(ix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schema::RECURRING;
    use crate::model::{RecurringCharge, TxnType};

    fn records(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_parse_empty() {
        let table: Table<RecurringCharge> = Table::parse(&RECURRING, Vec::<Vec<String>>::new());
        assert!(table.is_empty());
        assert_eq!(table.headers(), vec!["id", "type", "amount", "category", "note", "source"]);
    }

    #[test]
    fn test_parse_backfills_missing_source() {
        let table: Table<RecurringCharge> = Table::parse(
            &RECURRING,
            records(&[
                &["id", "type", "amount", "category", "note"],
                &["1", "income", "1000", "Salary", ""],
            ]),
        );
        let row = &table.rows()[0];
        assert_eq!(row.source, "");
        assert_eq!(row.r#type, Some(TxnType::Income));
        assert_eq!(table.to_records()[0].len(), 6);
    }

    #[test]
    fn test_parse_coerces_bad_numbers() {
        let table: Table<RecurringCharge> = Table::parse(
            &RECURRING,
            records(&[
                &["id", "type", "amount", "category", "note", "source"],
                &["x", "expense", "cheap", "Food", "", ""],
                &["2.0", "expense"],
            ]),
        );
        assert_eq!(table.rows()[0].id, 0);
        assert!(table.rows()[0].amount.is_zero());
        assert_eq!(table.rows()[1].id, 2);
        assert_eq!(table.rows()[1].category, "");
    }

    #[test]
    fn test_unknown_columns_survive() {
        let input = records(&[
            &["id", "type", "amount", "category", "note", "source", "flag"],
            &["1", "expense", "9.99", "Fun", "movie", "Card", "x"],
        ]);
        let table: Table<RecurringCharge> = Table::parse(&RECURRING, input.clone());
        assert_eq!(table.to_records(), input);
    }

    #[test]
    fn test_next_id_and_remove() {
        let mut table: Table<RecurringCharge> = Table::new(&RECURRING);
        assert_eq!(table.next_id().unwrap(), 1);
        for id in [3, 7, 5] {
            table.push(RecurringCharge {
                id,
                ..RecurringCharge::default()
            });
        }
        assert_eq!(table.next_id().unwrap(), 8);
        assert_eq!(table.remove(7).map(|r| r.id), Some(7));
        assert!(table.remove(7).is_none());
        let ids: Vec<u64> = table.rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 5]);
        assert_eq!(table.next_id().unwrap(), 6);
    }

    #[test]
    fn test_next_id_after_largest_id_is_an_error() {
        let input = records(&[
            &["id", "type", "amount", "category", "note", "source"],
            &["18446744073709551615", "expense", "1", "Fun", "", ""],
        ]);
        let table: Table<RecurringCharge> = Table::parse(&RECURRING, input);
        assert_eq!(table.rows()[0].id, u64::MAX);
        let err = table.next_id().unwrap_err();
        assert!(err.to_string().contains("no id left"));
    }
}
