use clap::{Parser, Subcommand};
use configuration::{ReadinessPolicy, Settings, load_settings};
use std::process::ExitCode;
use std::sync::Arc;
use telemetry::{Metrics, init_tracing};

/// Accounts and transactions over HTTP, backed by PostgreSQL and measured
/// with Prometheus metrics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service (the default).
    Serve(ServeArgs),
    /// Check that the database answers, then exit.
    Probe,
}

#[derive(Parser, Default)]
struct ServeArgs {
    /// Address to listen on, overriding `server.listen_addr`.
    #[arg(long)]
    listen: Option<String>,

    /// What to do if the database never answers the startup probe.
    #[arg(long, value_enum)]
    on_failure: Option<ReadinessPolicy>,
}

/// The main entry point for the tally service.
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal outside local development.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_tracing(&settings.logging) {
        eprintln!("Error initializing logging: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => {
            if let Some(listen) = args.listen {
                settings.server.listen_addr = listen;
            }
            if let Some(policy) = args.on_failure {
                settings.readiness.on_failure = policy;
            }
            web_server::run_server(settings, Arc::new(Metrics::new())).await
        }
        Commands::Probe => handle_probe(&settings).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Exiting.");
            ExitCode::FAILURE
        }
    }
}

/// Handles the `probe` command: one bounded readiness check, no listener.
async fn handle_probe(settings: &Settings) -> anyhow::Result<()> {
    let pool = database::connect(&settings.database)?;
    let timeout = settings.readiness.attempt_timeout();
    let readiness = {
        let pool = &pool;
        database::wait_until_ready(&settings.readiness, move || database::ping(pool, timeout)).await
    };

    match readiness {
        database::Readiness::Ready { attempts } => {
            println!("database ready after {attempts} attempt(s)");
            Ok(())
        }
        database::Readiness::Unreachable { attempts, last_error } => {
            anyhow::bail!("database unreachable after {attempts} attempts: {last_error}")
        }
    }
}
