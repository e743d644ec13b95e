// Money Manager - Web Server
// REST API with Axum over the shared ledger

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use money_manager::api::{router, AppState};
use money_manager::config::{init_logging, CliArgs, Config};
use money_manager::MoneyDao;

#[derive(Parser, Debug)]
#[command(name = "money-server", version, about = "Money Manager REST backend")]
struct ServerCli {
    #[command(flatten)]
    args: CliArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ServerCli::parse();
    let config = Config::load(&cli.args).context("Failed to load configuration")?;
    init_logging(&config);

    let dao = MoneyDao::open(&config.database.path)
        .with_context(|| format!("Failed to open database {}", config.database.path.display()))?;
    info!(
        "Database opened: {} ({} accounts, {} transactions)",
        config.database.path.display(),
        dao.cache().all::<money_manager::Account>().len(),
        dao.cache().all::<money_manager::Transaction>().len()
    );

    let state = AppState::new(dao, config.reconciliation_engine());
    let app = router(state);

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Money Manager v{} listening on http://{}/api", money_manager::VERSION, addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
