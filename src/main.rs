use anyhow::Result;
use clap::Parser;
use md2html::cli::Cli;
use md2html::commands::convert::{self, ConvertArgs};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    convert::execute(ConvertArgs {
        input: cli.input,
        output: cli.output,
        working_dir: None,
    })?;

    Ok(())
}
