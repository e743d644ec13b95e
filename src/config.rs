// Runtime configuration: money.toml plus command line overrides

use crate::error::{MoneyError, Result};
use crate::reconciliation::ReconciliationEngine;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "money.toml";

/// Options shared by every binary
#[derive(Args, Debug, Clone)]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// SQLite database file (overrides config file)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Log level (overrides config file)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

impl Default for CliArgs {
    fn default() -> Self {
        CliArgs {
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            database: None,
            port: None,
            log_level: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: DatabaseConfig,

    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,

    #[serde(default = "default_statements")]
    pub statements: StatementConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Reconciliation settings
#[derive(Debug, Deserialize, Clone)]
pub struct StatementConfig {
    /// Match on the operation date only
    #[serde(default)]
    pub ignore_execution_date: bool,

    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,

    #[serde(default = "default_major_threshold")]
    pub major_threshold: Decimal,
}

fn default_database() -> DatabaseConfig {
    DatabaseConfig {
        path: default_database_path(),
    }
}

fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
    }
}

fn default_statements() -> StatementConfig {
    StatementConfig {
        ignore_execution_date: false,
        tolerance: default_tolerance(),
        major_threshold: default_major_threshold(),
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("money.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

fn default_major_threshold() -> Decimal {
    Decimal::new(1000, 2)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: default_database(),
            server: default_server(),
            logging: default_logging(),
            statements: default_statements(),
        }
    }
}

impl Config {
    /// Parse a TOML document; missing sections and keys take defaults
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| MoneyError::Config(e.to_string()))
    }

    /// Read `path`, or defaults when the file does not exist
    pub fn from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents)
                .map_err(|e| MoneyError::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load(cli: &CliArgs) -> Result<Self> {
        let mut config = Self::from_file(&cli.config)?;

        // CLI overrides
        if let Some(ref database) = cli.database {
            config.database.path = database.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref level) = cli.log_level {
            config.logging.level = level.clone();
        }

        Ok(config)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| MoneyError::Config(format!("invalid listen address: {}", e)))
    }

    pub fn reconciliation_engine(&self) -> ReconciliationEngine {
        ReconciliationEngine::with_thresholds(self.statements.tolerance, self.statements.major_threshold)
            .with_ignore_execution_date(self.statements.ignore_execution_date)
    }
}

/// Install env_logger; `RUST_LOG` wins over the configured level
pub fn init_logging(config: &Config) {
    let env = env_logger::Env::default().default_filter_or(config.logging.level.as_str());
    // A second init (tests, embedding) is not an error
    let _ = env_logger::Builder::from_env(env).format_timestamp_millis().try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.path, PathBuf::from("money.db"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert!(!config.statements.ignore_execution_date);
        assert_eq!(config.statements.tolerance, dec!(0.01));
        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 9000

            [statements]
            ignore_execution_date = true
            major_threshold = "50.00"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.statements.major_threshold, dec!(50.00));
        assert_eq!(config.statements.tolerance, dec!(0.01));

        let engine = config.reconciliation_engine();
        assert!(engine.ignore_execution_date);
        assert_eq!(engine.major_discrepancy_threshold, dec!(50.00));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let result = Config::from_toml("[server]\nport = \"eighty\"");
        assert!(matches!(result, Err(MoneyError::Config(_))));
    }

    #[test]
    fn test_cli_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[database]\npath = \"from-file.db\"\n[logging]\nlevel = \"warn\"").unwrap();

        let cli = CliArgs {
            config: file.path().to_path_buf(),
            database: Some(PathBuf::from("override.db")),
            port: Some(3001),
            log_level: None,
        };
        let config = Config::load(&cli).unwrap();

        assert_eq!(config.database.path, PathBuf::from("override.db"));
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let cli = CliArgs {
            config: PathBuf::from("/nonexistent/money.toml"),
            ..CliArgs::default()
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
