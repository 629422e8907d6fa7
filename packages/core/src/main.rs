use std::io::Write;

use chrono::Local;
use clap::Parser;
use dotenvy::dotenv;

use cert_tracker::cli::Cli;
use cert_tracker::commands::{self, Context};
use cert_tracker::config::Config;
use cert_tracker::error::AppResult;
use cert_tracker::logging::init_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        tracing::debug!("Command failed: {:?}", err);
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = Config::from_env()?.with_overrides(&cli);
    tracing::debug!("Loaded config: {:?}", config);

    let today = Local::now().date_naive();
    let ctx = Context::open(config, cli.format, today).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = commands::run(&cli.command, &ctx, &mut out).await;
    out.flush()?;

    ctx.close().await;
    result
}
