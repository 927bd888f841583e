use anyhow::Context;
use clap::Parser;
use station_regrid::cli::{run, Cli};
use station_regrid::utils::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.as_deref()).context("initialising logging")?;
    run(cli).await.context("station-regrid failed")
}
