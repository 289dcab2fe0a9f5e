//! Command-line front end for portable rich-text payloads.

mod args;
mod commands;

use anyhow::Result;
use clap::Parser;

use crate::args::CliArguments;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArguments::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.try_init()?;

    commands::run(args).await
}
