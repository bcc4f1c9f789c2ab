//! These structs provide the CLI interface for the budget CLI.

use crate::model::{Amount, MonthKey, TxnType};
use crate::Result;
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// budget: A command-line ledger of income and expenses, kept in CSV files in a git repository.
///
/// Transactions are stored in one CSV file per month, along with lists of categories and
/// sources and a set of recurring charges. Every command first pulls the latest files from the
/// remote repository and every change is committed and pushed straight back, so the same ledger
/// can be used from several machines.
///
/// Run `budget init` once to point the program at your repository.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and the configuration file.
    ///
    /// This is the first command you should run. You need a git repository that you can push to,
    /// for example an empty private repository on a git hosting service.
    ///
    /// - Decide what directory you want to store data in and pass this as --budget-home. By
    ///   default, it will be $HOME/budget.
    ///
    /// - Pass the HTTPS URL of the repository as --remote-url.
    ///
    /// - If the repository needs an access token, save it to a file and pass the file as
    ///   --token-file. It will be moved into the home directory. You can also provide the token
    ///   through the BUDGET_GIT_TOKEN environment variable instead.
    Init(InitArgs),
    /// Pull the ledger from, or push it to, the remote repository.
    Sync(SyncArgs),
    /// Add a transaction, category, source or recurring charge.
    Insert(InsertArgs),
    /// Change fields of an existing transaction.
    Update(UpdateArgs),
    /// Remove a transaction, category, source or recurring charge.
    Delete(DeleteArgs),
    /// Print transactions, categories, sources or recurring charges.
    List(ListArgs),
    /// Add every recurring charge to a month as a new transaction.
    ApplyRecurring(MonthArgs),
    /// Income, expense and balance for a month, with the top expense categories.
    Summary(SummaryArgs),
    /// Income, expense and balance for every year and month, with the all-time top categories.
    Report(ReportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the ledger and configuration are held. Defaults to ~/budget
    #[arg(long, env = "BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: PathBuf) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }
}

/// (Not shown): Args for the `budget init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of the git repository that holds the ledger, e.g.
    /// https://github.com/someone/my-budget.git
    #[arg(long)]
    remote_url: String,

    /// A file holding an access token for the repository. It will be moved to the default
    /// secrets location in the home directory.
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// The branch to use. Defaults to the default branch of the repository.
    #[arg(long)]
    branch: Option<String>,
}

impl InitArgs {
    pub fn new(
        remote_url: impl Into<String>,
        token_file: Option<PathBuf>,
        branch: Option<String>,
    ) -> Self {
        Self {
            remote_url: remote_url.into(),
            token_file,
            branch,
        }
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn token_file(&self) -> Option<&Path> {
        self.token_file.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }
}

#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpDown {
    Up,
    #[default]
    Down,
}

serde_plain::derive_display_from_serialize!(UpDown);
serde_plain::derive_fromstr_from_deserialize!(UpDown);

/// (Not shown): Args for the `budget sync` command.
#[derive(Debug, Parser, Clone)]
pub struct SyncArgs {
    /// The direction to sync: "up" or "down"
    direction: UpDown,
}

impl SyncArgs {
    pub fn new(direction: UpDown) -> Self {
        Self { direction }
    }

    pub fn direction(&self) -> UpDown {
        self.direction
    }
}

/// Selects a month-file. When either value is omitted it is taken from today's date.
#[derive(Debug, Default, Parser, Clone, PartialEq, Eq)]
pub struct MonthArgs {
    /// The year, e.g. 2024
    #[arg(long)]
    year: Option<i32>,

    /// The month, 1 through 12
    #[arg(long)]
    month: Option<u32>,
}

impl MonthArgs {
    pub fn new(year: Option<i32>, month: Option<u32>) -> Self {
        Self { year, month }
    }

    /// Shorthand for an explicit year and month.
    pub fn of(year: i32, month: u32) -> Self {
        Self::new(Some(year), Some(month))
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none()
    }

    /// Resolves the month, filling in whatever is missing from today's date.
    ///
    /// # Errors
    /// - Returns an error if the month is not between 1 and 12.
    pub fn month_key(&self) -> Result<MonthKey> {
        self.month_key_or(Local::now().date_naive())
    }

    /// Resolves the month, filling in whatever is missing from `date`.
    pub fn month_key_or(&self, date: NaiveDate) -> Result<MonthKey> {
        MonthKey::new(
            self.year.unwrap_or_else(|| date.year()),
            self.month.unwrap_or_else(|| date.month()),
        )
    }
}

/// (Not shown): Args for the `budget insert` command.
#[derive(Debug, Parser, Clone)]
pub struct InsertArgs {
    #[command(subcommand)]
    entity: InsertSubcommand,
}

impl InsertArgs {
    pub fn new(entity: InsertSubcommand) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> &InsertSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum InsertSubcommand {
    /// Add a transaction to a month-file. Its category and source are added to their lists if
    /// they are new.
    Transaction(InsertTransactionArgs),
    /// Add a category.
    Category(LabelArgs),
    /// Add a source.
    Source(LabelArgs),
    /// Add a recurring charge.
    Recurring(InsertRecurringArgs),
}

/// (Not shown): Args for the `budget insert transaction` command.
#[derive(Debug, Parser, Clone)]
pub struct InsertTransactionArgs {
    /// "income" or "expense"
    #[arg(long = "type", value_enum)]
    pub r#type: TxnType,

    /// A positive amount, e.g. 42.50
    #[arg(long)]
    pub amount: Amount,

    #[arg(long)]
    pub category: String,

    /// Where the money came from or went to, e.g. a card or an account.
    #[arg(long)]
    pub source: String,

    #[arg(long, default_value = "")]
    pub note: String,

    /// The date of the transaction as YYYY-MM-DD. Defaults to today. Unless --year and --month
    /// are given, the transaction goes into the month-file of this date.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[clap(flatten)]
    pub month: MonthArgs,
}

/// (Not shown): Args for the `budget insert recurring` command.
#[derive(Debug, Parser, Clone)]
pub struct InsertRecurringArgs {
    /// "income" or "expense"
    #[arg(long = "type", value_enum)]
    pub r#type: TxnType,

    /// A positive amount, e.g. 1000
    #[arg(long)]
    pub amount: Amount,

    #[arg(long)]
    pub category: String,

    #[arg(long, default_value = "")]
    pub note: String,

    /// When blank, the applied transactions get the source "Recurring".
    #[arg(long, default_value = "")]
    pub source: String,
}

#[derive(Debug, Parser, Clone)]
pub struct LabelArgs {
    pub name: String,
}

impl LabelArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// (Not shown): Args for the `budget update` command.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    #[command(subcommand)]
    entity: UpdateSubcommand,
}

impl UpdateArgs {
    pub fn new(entity: UpdateSubcommand) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> &UpdateSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum UpdateSubcommand {
    /// Change fields of a transaction. Fields that are not given are left alone.
    Transaction(UpdateTransactionArgs),
}

/// (Not shown): Args for the `budget update transaction` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct UpdateTransactionArgs {
    /// The id of the transaction within its month-file.
    #[arg(long)]
    pub id: u64,

    #[clap(flatten)]
    pub month: MonthArgs,

    #[arg(long)]
    pub amount: Option<Amount>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub note: Option<String>,

    /// The new date as YYYY-MM-DD. The transaction stays in its month-file.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub source: Option<String>,
}

impl UpdateTransactionArgs {
    pub fn has_changes(&self) -> bool {
        self.amount.is_some()
            || self.category.is_some()
            || self.note.is_some()
            || self.date.is_some()
            || self.source.is_some()
    }
}

#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    #[command(subcommand)]
    entity: DeleteSubcommand,
}

impl DeleteArgs {
    pub fn new(entity: DeleteSubcommand) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> &DeleteSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeleteSubcommand {
    /// Remove a transaction from its month-file.
    Transaction(DeleteTransactionArgs),
    /// Remove a category. Transactions that use it are left alone.
    Category(LabelArgs),
    /// Remove a source. Transactions that use it are left alone.
    Source(LabelArgs),
    /// Remove a recurring charge.
    Recurring(DeleteRecurringArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct DeleteTransactionArgs {
    #[arg(long)]
    pub id: u64,

    #[clap(flatten)]
    pub month: MonthArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct DeleteRecurringArgs {
    #[arg(long)]
    pub id: u64,
}

/// (Not shown): Args for the `budget list` command.
#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    #[command(subcommand)]
    entity: ListSubcommand,
}

impl ListArgs {
    pub fn new(entity: ListSubcommand) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> &ListSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ListSubcommand {
    /// Print the transactions of a month.
    Transactions(MonthArgs),
    Categories,
    Sources,
    /// Print the recurring charges.
    Recurring,
}

#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    #[clap(flatten)]
    pub month: MonthArgs,

    /// How many expense categories to show.
    #[arg(long, default_value_t = 3)]
    pub top: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// How many expense categories to show.
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("budget"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or BUDGET_HOME instead of relying on the default \
                budget home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("budget")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_insert_transaction() {
        let args = Args::try_parse_from([
            "budget",
            "--budget-home",
            "/tmp/budget",
            "insert",
            "transaction",
            "--type",
            "expense",
            "--amount",
            "42.50",
            "--category",
            "Food",
            "--source",
            "Card",
            "--year",
            "2024",
            "--month",
            "3",
        ])
        .unwrap();
        assert_eq!(args.common().budget_home().path(), Path::new("/tmp/budget"));
        let Command::Insert(insert) = args.command() else {
            panic!("expected insert");
        };
        let InsertSubcommand::Transaction(txn) = insert.entity() else {
            panic!("expected transaction");
        };
        assert_eq!(txn.r#type, TxnType::Expense);
        assert_eq!(txn.amount, "42.5".parse::<Amount>().unwrap());
        assert_eq!(txn.note, "");
        assert_eq!(txn.month.month_key().unwrap().to_string(), "2024-03");
    }

    #[test]
    fn test_parse_summary_defaults() {
        let args = Args::try_parse_from(["budget", "summary"]).unwrap();
        let Command::Summary(summary) = args.command() else {
            panic!("expected summary");
        };
        assert_eq!(summary.top, 3);
        assert!(summary.month.is_empty());

        let args = Args::try_parse_from(["budget", "report"]).unwrap();
        let Command::Report(report) = args.command() else {
            panic!("expected report");
        };
        assert_eq!(report.top, 5);
    }

    #[test]
    fn test_parse_sync_direction() {
        let args = Args::try_parse_from(["budget", "sync", "up"]).unwrap();
        let Command::Sync(sync) = args.command() else {
            panic!("expected sync");
        };
        assert!(matches!(sync.direction(), UpDown::Up));
        assert!(Args::try_parse_from(["budget", "sync", "sideways"]).is_err());
    }

    #[test]
    fn test_month_args_fill_from_date() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        let month = MonthArgs::new(None, Some(2)).month_key_or(date).unwrap();
        assert_eq!(month.to_string(), "2025-02");
        assert!(MonthArgs::of(2025, 13).month_key_or(date).is_err());
    }
}
