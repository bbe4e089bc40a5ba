//! SecureCheck - traffic-stop analytics over a MySQL police log.

use std::sync::Arc;

use secure_check::cli::{Cli, Command};
use secure_check::config::{Config, ConnectionConfig};
use secure_check::dashboard::Dashboard;
use secure_check::db;
use secure_check::error::Result;
use secure_check::logging;
use secure_check::output;
use secure_check::query::{QueryExecutor, StatusReporter};
use tracing::{debug, info};

/// Shows connection problems on stderr, next to the (empty) output.
struct StderrReporter;

impl StatusReporter for StderrReporter {
    fn error(&self, message: &str) {
        debug!("Reported error: {}", message);
        eprintln!("Error: {message}");
    }

    fn warning(&self, message: &str) {
        debug!("Reported warning: {}", message);
        eprintln!("Warning: {message}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    if let Err(e) = run(cli).await {
        eprintln!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    debug!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    // Precedence:
    // 1. CLI arguments (highest)
    // 2. Named connection from config
    // 3. Default connection from config
    // 4. Environment variables
    let connection = resolve_connection(&cli, &config)?;
    info!("Connection: {}", connection.display_string());

    let executor = QueryExecutor::new(Arc::from(db::provider(&connection)))
        .with_reporter(Arc::new(StderrReporter));
    let dashboard = Dashboard::new(executor);
    let format = cli.format;

    let rendered = match &cli.command {
        Command::Overview => output::render_result(&dashboard.overview().await?, format)?,
        Command::Questions => output::render_questions(dashboard.questions(), format)?,
        Command::Run { selection } => {
            output::render_insight(&dashboard.insight(selection).await?, format)?
        }
        Command::Options => output::render_options(&dashboard.form_options().await?, format)?,
        Command::Predict(args) => {
            let log = args.to_log(chrono::Local::now().naive_local());
            output::render_summary(&dashboard.predict(log).await?, format)?
        }
    };

    println!("{rendered}");
    Ok(())
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<ConnectionConfig> {
    let mut connection =
        config.resolve_connection(cli.to_connection_config()?, cli.connection_name())?;

    // Anything still unset falls back to MYSQL_* variables, then built-in defaults
    connection.apply_env_defaults();

    Ok(connection)
}
