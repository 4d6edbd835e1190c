//! Implementation of the file-to-file conversion command.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::config;

/// Arguments for the convert command.
pub struct ConvertArgs {
    /// Markdown file to read.
    pub input: PathBuf,
    /// HTML file to write.
    pub output: PathBuf,
    /// Directory to start config discovery from (uses current dir if None).
    pub working_dir: Option<PathBuf>,
}

/// Execute the convert command.
pub fn execute(args: ConvertArgs) -> Result<()> {
    let start = match args.working_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to get current directory")?,
    };
    let (config, base_dir) = config::load_from(&start)?;
    let options = config.render_options(&base_dir)?;

    let markdown = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read input file: {}", args.input.display()))?;
    tracing::info!(path = %args.input.display(), bytes = markdown.len(), "read markdown");

    let html = crate::convert_with(&markdown, &options);

    fs::write(&args.output, &html)
        .with_context(|| format!("failed to write output file: {}", args.output.display()))?;
    tracing::info!(path = %args.output.display(), bytes = html.len(), "wrote html");

    println!(
        "Converted {} -> {}",
        args.input.display(),
        args.output.display()
    );

    Ok(())
}
