use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

mod cli;
mod error;
mod kiss;
mod logging;
mod setmode;
mod transport;

fn main() -> Result<()> {
    if std::env::args_os().len() == 1 {
        cli::Cli::command().print_long_help()?;
        return Ok(());
    }
    let args = cli::Cli::parse();
    logging::init();

    let cfg = args.into_config()?;
    setmode::run(&cfg).with_context(|| format!("setting mode over {}", cfg.target))
}
