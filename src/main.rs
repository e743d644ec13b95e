// Money Manager - command line front end

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use money_manager::config::{init_logging, CliArgs, Config};
use money_manager::statements::{parse_statement, RawStatementData, Statement};
use money_manager::{reconcile_statement, xml, Account, MoneyDao};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "money-manager", version, about = "Personal finance ledger")]
struct Cli {
    #[command(flatten)]
    args: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database if it does not exist
    Init,

    /// Replace the ledger with an XML or zip export
    Import { file: PathBuf },

    /// Write the ledger to an XML file, or a zip container with --zip
    Export {
        file: PathBuf,

        #[arg(long)]
        zip: bool,
    },

    /// Reconcile bank statement files against an account
    Statement {
        /// Statement files; overlapping files are merged
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Account uuid, account number or card number
        #[arg(long)]
        account: Option<String>,

        /// Match on the operation date only
        #[arg(long)]
        ignore_execution_date: bool,

        /// Mark matched transactions as checked
        #[arg(long)]
        check: bool,
    },

    /// Recompute every account balance from its transactions
    Recalc,

    /// List accounts with their balances
    Accounts,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.args).context("Failed to load configuration")?;
    init_logging(&config);
    run(cli.command, &config)
}

fn open_dao(config: &Config) -> Result<MoneyDao> {
    MoneyDao::open(&config.database.path)
        .with_context(|| format!("Failed to open database {}", config.database.path.display()))
}

fn read_statements(files: &[PathBuf]) -> Result<Statement> {
    let mut merged: Option<Statement> = None;
    for path in files {
        let data = RawStatementData::from_path(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let statement = parse_statement(&data).with_context(|| format!("Failed to parse {}", path.display()))?;
        match merged.as_mut() {
            Some(existing) => {
                if existing.statement_type != statement.statement_type {
                    bail!(
                        "{} is a {} statement, expected {}",
                        path.display(),
                        statement.statement_type.name(),
                        existing.statement_type.name()
                    );
                }
                existing.merge(statement);
            }
            None => merged = Some(statement),
        }
    }
    merged.context("No statement files given")
}

fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Init => {
            let dao = open_dao(config)?;
            println!(
                "✓ Database ready at {} ({} accounts)",
                config.database.path.display(),
                dao.cache().all::<Account>().len()
            );
        }
        Command::Import { file } => {
            let mut dao = open_dao(config)?;
            let count = xml::import_file(&mut dao, &file)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            println!("✓ Imported {} records from {}", count, file.display());
        }
        Command::Export { file, zip } => {
            let dao = open_dao(config)?;
            let count = xml::export_file(&dao, &file, zip)
                .with_context(|| format!("Failed to export to {}", file.display()))?;
            println!("✓ Exported {} records to {}", count, file.display());
        }
        Command::Statement {
            files,
            account,
            ignore_execution_date,
            check,
        } => {
            let statement = read_statements(&files)?;
            let engine = config
                .reconciliation_engine()
                .with_ignore_execution_date(ignore_execution_date || config.statements.ignore_execution_date);
            let mut dao = open_dao(config)?;
            let report = reconcile_statement(&mut dao, &engine, statement, account.as_deref(), check)?;

            println!("{}", report.summary());
            for record in &report.unmatched {
                println!("  unmatched  {}  {:>12}  {}", record.actual, record.account_amount, record.description);
            }
            for discrepancy in &report.discrepancies {
                println!("  {:?}: {}", discrepancy.category, discrepancy.description);
            }
        }
        Command::Recalc => {
            let mut dao = open_dao(config)?;
            let count = dao.recalculate_balances()?;
            info!("Recalculated {} accounts", count);
            println!("✓ Recalculated {} account balances", count);
        }
        Command::Accounts => {
            let dao = open_dao(config)?;
            println!("{:<36}  {:<24} {:<16} {:>14} {:>14}", "UUID", "NAME", "TYPE", "BALANCE", "WAITING");
            for account in dao.cache().all::<Account>() {
                println!(
                    "{:<36}  {:<24} {:<16} {:>14.2} {:>14.2}",
                    account.uuid,
                    account.name,
                    account.account_type.as_str(),
                    account.balance(),
                    account.total_waiting
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use money_manager::{Category, CategoryType};
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, name: &str) -> Config {
        let mut config = Config::default();
        config.database.path = dir.path().join(name);
        config
    }

    #[test]
    fn test_cli_parses_statement_command() {
        let cli = Cli::try_parse_from([
            "money-manager",
            "--database",
            "ledger.db",
            "statement",
            "a.csv",
            "b.csv",
            "--account",
            "40817810",
            "--check",
        ])
        .unwrap();

        assert_eq!(cli.args.database, Some(PathBuf::from("ledger.db")));
        match cli.command {
            Command::Statement { files, account, check, ignore_execution_date } => {
                assert_eq!(files.len(), 2);
                assert_eq!(account.as_deref(), Some("40817810"));
                assert!(check);
                assert!(!ignore_execution_date);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_export_then_import_into_new_database() {
        let dir = TempDir::new().unwrap();
        let source = config_in(&dir, "source.db");
        {
            let mut dao = open_dao(&source).unwrap();
            dao.insert(Category::new("Food", CategoryType::Expenses)).unwrap();
        }
        let file = dir.path().join("money.zip");
        run(Command::Export { file: file.clone(), zip: true }, &source).unwrap();

        let target = config_in(&dir, "target.db");
        run(Command::Init, &target).unwrap();
        run(Command::Import { file }, &target).unwrap();
        run(Command::Recalc, &target).unwrap();

        let dao = open_dao(&target).unwrap();
        assert_eq!(dao.cache().all::<Category>().len(), 1);
    }

    #[test]
    fn test_statement_requires_known_format() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "not a statement").unwrap();
        assert!(read_statements(&[file]).is_err());
    }
}
