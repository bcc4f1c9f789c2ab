//! Reads and writes the ledger files of the local working set.
//!
//! Every file is a CSV with a header row. Reading is schema-driven and forgiving (see
//! [`Table::parse`]), writing always emits the declared columns first. Each successful write is
//! followed by a sync-up to the remote, which is allowed to fail.

use crate::model::{
    Label, LabelKind, LedgerEntry, MonthKey, RecurringCharge, Row, Schema, Table, Transaction,
};
use crate::model::schema::{RECURRING, TRANSACTIONS};
use crate::remote::Remote;
use crate::{utils, Config, Result};
use anyhow::Context;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// The folder, relative to the data directory, that holds one file per month.
pub const DATA_FOLDER: &str = "budget_data";
pub const CATEGORIES_FILE: &str = "categories.csv";
pub const SOURCES_FILE: &str = "sources.csv";
pub const RECURRING_FILE: &str = "recurring.csv";

/// The files that live at the top of the data directory.
pub(crate) const ROOT_FILES: [&str; 3] = [CATEGORIES_FILE, SOURCES_FILE, RECURRING_FILE];

/// Names one ledger file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKey {
    Month(MonthKey),
    Labels(LabelKind),
    Recurring,
}

impl TableKey {
    pub fn schema(&self) -> &'static Schema {
        match self {
            TableKey::Month(_) => &TRANSACTIONS,
            TableKey::Labels(kind) => kind.schema(),
            TableKey::Recurring => &RECURRING,
        }
    }

    /// The location of the file relative to the data directory, which is the same as its
    /// location inside the clone.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            TableKey::Month(month) => Path::new(DATA_FOLDER).join(month.file_name()),
            TableKey::Labels(LabelKind::Category) => PathBuf::from(CATEGORIES_FILE),
            TableKey::Labels(LabelKind::Source) => PathBuf::from(SOURCES_FILE),
            TableKey::Recurring => PathBuf::from(RECURRING_FILE),
        }
    }
}

impl Display for TableKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}

/// The ledger files of the working set, with write-through to the remote.
#[derive(Debug, Clone)]
pub struct Store {
    remote: Remote,
}

impl Store {
    pub fn new(remote: Remote) -> Self {
        Self { remote }
    }

    pub fn config(&self) -> &Config {
        self.remote.config()
    }

    pub fn remote(&self) -> &Remote {
        &self.remote
    }

    pub fn path(&self, key: &TableKey) -> PathBuf {
        self.config().data_dir().join(key.relative_path())
    }

    /// Reads the file named by `key`. A file that does not exist, or is empty, is an empty table
    /// with the declared columns.
    pub async fn load<R: Row>(&self, key: &TableKey) -> Result<Table<R>> {
        let path = self.path(key);
        if !path.is_file() {
            debug!("{key} does not exist yet, treating it as empty");
            return Ok(Table::new(key.schema()));
        }
        let contents = utils::read(&path).await?;
        let records = read_records(&contents).with_context(|| format!("Unable to parse {key}"))?;
        Ok(Table::parse(key.schema(), records))
    }

    /// Writes `table` to the file named by `key`, replacing it, and then pushes the working set
    /// to the remote. A failed push is logged and does not fail the save.
    pub async fn save<R: Row>(&self, key: &TableKey, table: &Table<R>) -> Result<()> {
        self.write(key, table).await?;
        if let Err(e) = self.remote.sync_up().await {
            error!("Saved {key} locally but could not push it to the remote: {e:#}");
        }
        Ok(())
    }

    async fn write<R: Row>(&self, key: &TableKey, table: &Table<R>) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            utils::make_dir(parent).await?;
        }
        let bytes = write_records(&table.to_records())
            .with_context(|| format!("Unable to serialize {key}"))?;
        utils::write(&path, bytes).await?;
        debug!("Wrote {} row(s) to {key}", table.len());
        Ok(())
    }

    pub async fn load_transactions(&self, month: MonthKey) -> Result<Table<Transaction>> {
        self.load(&TableKey::Month(month)).await
    }

    pub async fn save_transactions(
        &self,
        month: MonthKey,
        table: &Table<Transaction>,
    ) -> Result<()> {
        self.save(&TableKey::Month(month), table).await
    }

    /// Reads a label list, dropping blank and repeated entries.
    pub async fn load_labels(&self, kind: LabelKind) -> Result<Table<Label>> {
        let key = TableKey::Labels(kind);
        let mut labels: Table<Label> = self.load(&key).await?;
        let dropped = labels.dedup();
        if dropped > 0 {
            warn!("Ignoring {dropped} blank or repeated entries in {key}");
        }
        Ok(labels)
    }

    pub async fn save_labels(&self, kind: LabelKind, labels: &Table<Label>) -> Result<()> {
        self.save(&TableKey::Labels(kind), labels).await
    }

    pub async fn load_recurring(&self) -> Result<Table<RecurringCharge>> {
        self.load(&TableKey::Recurring).await
    }

    pub async fn save_recurring(&self, table: &Table<RecurringCharge>) -> Result<()> {
        self.save(&TableKey::Recurring, table).await
    }

    /// The months that have a month-file, in chronological order. Files in the month folder whose
    /// names are not of the form `YYYY-MM.csv` are ignored.
    pub async fn months(&self) -> Result<Vec<MonthKey>> {
        let dir = self.config().data_dir().join(DATA_FOLDER);
        let mut months = Vec::new();
        for path in utils::list_files(&dir).await? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match MonthKey::from_file_name(&name) {
                Some(month) => months.push(month),
                None => debug!("Skipping {} in the month folder", path.display()),
            }
        }
        months.sort();
        Ok(months)
    }

    /// Every transaction of every month-file, tagged with its month, in month order and then file
    /// order.
    pub async fn load_all_transactions(&self) -> Result<Vec<LedgerEntry>> {
        let mut entries = Vec::new();
        for month in self.months().await? {
            let table = self.load_transactions(month).await?;
            entries.extend(
                table
                    .into_rows()
                    .into_iter()
                    .map(|transaction| LedgerEntry { month, transaction }),
            );
        }
        Ok(entries)
    }
}

fn read_records(contents: &str) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

fn write_records(records: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for record in records {
        wtr.write_record(record)?;
    }
    wtr.into_inner().map_err(|e| anyhow::anyhow!("{e}"))
}
