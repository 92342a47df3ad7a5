use clap::Parser;
use rootcause::prelude::ResultExt;
use smile_portal::cli::Cli;
use smile_portal::commands::App;
use smile_portal::config::PortalConfig;
use smile_portal::error::CliError;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{report}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> smile_portal_core::Result<(), CliError> {
    let config = PortalConfig::load(cli.config.as_deref()).context(CliError::Config)?;
    tracing::info!("Loaded configuration");

    let app = App::connect(&config)?;
    let output = app.run(cli.command).await?;

    let rendered = serde_json::to_string_pretty(&output).context(CliError::Output)?;
    println!("{rendered}");
    Ok(())
}
