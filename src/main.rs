use clap::Parser;
use std::process::ExitCode;
use budget_sync::args::{
    Args, Command, DeleteSubcommand, InsertSubcommand, ListSubcommand, UpDown, UpdateSubcommand,
};
use budget_sync::model::LabelKind;
use budget_sync::{commands, Config, Mode, Result};
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().budget_home().path();

    // This allows for running the program without a git remote. When BUDGET_SYNC_IN_TEST_MODE is
    // set and non-zero in length, then the mode will be Mode::Test, otherwise it will be Mode::Git.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.remote_url(),
            init_args.token_file(),
            init_args.branch(),
        )
        .await?
        .print(),

        Command::Sync(sync_args) => {
            let config = Config::load(home).await?;
            match sync_args.direction() {
                UpDown::Up => commands::sync_up(config, mode).await?.print(),
                UpDown::Down => commands::sync_down(config, mode).await?.print(),
            }
        }

        Command::Insert(insert_args) => {
            let config = Config::load(home).await?;
            match insert_args.entity() {
                InsertSubcommand::Transaction(args) => {
                    commands::insert_transaction(config, mode, args.clone())
                        .await?
                        .print()
                }
                InsertSubcommand::Category(args) => {
                    commands::insert_label(config, mode, LabelKind::Category, args.clone())
                        .await?
                        .print()
                }
                InsertSubcommand::Source(args) => {
                    commands::insert_label(config, mode, LabelKind::Source, args.clone())
                        .await?
                        .print()
                }
                InsertSubcommand::Recurring(args) => {
                    commands::insert_recurring(config, mode, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::Update(update_args) => {
            let config = Config::load(home).await?;
            match update_args.entity() {
                UpdateSubcommand::Transaction(args) => {
                    commands::update_transaction(config, mode, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::Delete(delete_args) => {
            let config = Config::load(home).await?;
            match delete_args.entity() {
                DeleteSubcommand::Transaction(args) => {
                    commands::delete_transaction(config, mode, args.clone())
                        .await?
                        .print()
                }
                DeleteSubcommand::Category(args) => {
                    commands::delete_label(config, mode, LabelKind::Category, args.clone())
                        .await?
                        .print()
                }
                DeleteSubcommand::Source(args) => {
                    commands::delete_label(config, mode, LabelKind::Source, args.clone())
                        .await?
                        .print()
                }
                DeleteSubcommand::Recurring(args) => {
                    commands::delete_recurring(config, mode, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::List(list_args) => {
            let config = Config::load(home).await?;
            match list_args.entity() {
                ListSubcommand::Transactions(args) => {
                    commands::list_transactions(config, mode, args.clone())
                        .await?
                        .print()
                }
                ListSubcommand::Categories => {
                    commands::list_labels(config, mode, LabelKind::Category)
                        .await?
                        .print()
                }
                ListSubcommand::Sources => commands::list_labels(config, mode, LabelKind::Source)
                    .await?
                    .print(),
                ListSubcommand::Recurring => commands::list_recurring(config, mode).await?.print(),
            }
        }

        Command::ApplyRecurring(month_args) => {
            commands::apply_recurring(Config::load(home).await?, mode, month_args.clone())
                .await?
                .print()
        }

        Command::Summary(summary_args) => {
            commands::summary(Config::load(home).await?, mode, summary_args.clone())
                .await?
                .print()
        }

        Command::Report(report_args) => {
            commands::report(Config::load(home).await?, mode, report_args.clone())
                .await?
                .print()
        }
    };

    Ok(())
}

pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the given level for the library and binary only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
