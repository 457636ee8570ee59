//! smart-line - ask a task database questions in plain language.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use smart_line::app::Orchestrator;
use smart_line::cli::Cli;
use smart_line::config::Config;
use smart_line::console::Console;
use smart_line::db::{check_connection, Connector, PgConnector};
use smart_line::error::{Result, SmartLineError};
use smart_line::llm::{OpenRouterClient, OpenRouterConfig};
use smart_line::logging;
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is fine; the key may come from the real environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init_stderr_logging("info");
            error!("{}: {}", e.category(), e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.logging);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}: {}", e.category(), e);
            ExitCode::FAILURE
        }
    }
}

/// Builds the effective configuration.
///
/// Precedence: CLI arguments, then the config file, then PG* environment
/// variables, then built-in defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config_path();
    let mut config = Config::load_from_file(&config_path)?;

    if let Some(conn) = cli.to_connection_config()? {
        config.database.merge(&conn);
    }
    if let Some(backend) = cli.backend().map_err(SmartLineError::config)? {
        config.database.backend = backend;
    }
    config.database.apply_env_defaults();

    if let Some(path) = &cli.log_file {
        config.logging.file = Some(path.clone());
    }

    Ok(config)
}

async fn run(config: Config) -> Result<()> {
    info!(
        backend = %config.database.backend,
        "Database: {}",
        config.database.display_string()
    );

    let llm = OpenRouterClient::new(OpenRouterConfig::from_llm_config(&config.llm)?)?;
    info!("Completion endpoint: {}", llm.api_url());

    let connector = PgConnector::new(config.database.clone());
    if !check_connection(connector.client().as_mut()).await {
        warn!("Database is not reachable yet; authentication will report it");
    }

    let orchestrator = Orchestrator::new(
        Box::new(connector),
        Arc::new(llm),
        &config.llm,
    );

    let mut console = Console::new(io::stdin().lock(), io::stdout());
    let outcome = orchestrator.run(&mut console).await?;
    info!(?outcome, "Dialogue finished");

    Ok(())
}
