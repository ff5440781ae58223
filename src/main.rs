mod cli;

use clap::Parser;
use color_eyre::Result;

use pop_planner::config::AppConfig;
use pop_planner::telemetry;

fn main() -> Result<()> {
    color_eyre::install()?;
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let args = cli::Cli::parse();
    cli::run(args, &config)
}
