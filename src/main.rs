use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mindful_tracking::{
    cli::{self, Cli, Commands},
    config::{Config, LogFormat},
    transport::TransportClient,
    UserContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = ?cli.command,
        "Mindful tracking starting..."
    );

    let result = match cli.command {
        // The health check only needs the transport, not a database.
        Commands::Health => {
            let transport = TransportClient::new(&config.api, config.request.clone())?;
            cli::execute_health(&transport).await
        }
        command => {
            let identity = cli::identity_for(&command);
            let ctx = match UserContext::from_config(&config, identity).await {
                Ok(ctx) => ctx,
                Err(e) => {
                    error!(error = %e, "Failed to initialize user context");
                    return Err(e.into());
                }
            };
            let result = cli::execute_command(command, &ctx).await;
            ctx.shutdown().await;
            result
        }
    };

    if result.exit_code == 0 {
        println!("{}", result.message);
    } else {
        eprintln!("{}", result.message);
    }

    std::process::exit(result.exit_code);
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
