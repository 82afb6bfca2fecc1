//! Binary entry point.

use anyhow::Context;
use clap::Parser;
use hapflow::cli::Cli;
use hapflow::pipeline::Driver;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli, command_line: String) -> anyhow::Result<()> {
    let config = cli.into_config();
    config.validate().context("invalid configuration")?;

    let driver = Driver::new(config, command_line);
    let outcome = driver.run().await?;
    tracing::info!(
        final_vcf = %outcome.final_vcf.display(),
        summary = %outcome.to_json(),
        "pipeline complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap renders the problem together with the usage text.
            let _ = err.print();
            let code = match err.kind() {
                clap::error::ErrorKind::DisplayHelp
                | clap::error::ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    };
    let command_line = std::env::args().collect::<Vec<_>>().join(" ");

    if let Err(err) = run(cli, command_line).await {
        tracing::error!(error = %format!("{err:#}"), "pipeline aborted");
        std::process::exit(1);
    }
}
