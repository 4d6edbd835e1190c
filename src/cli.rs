use clap::Parser;
use std::path::PathBuf;

/// Convert a Markdown file into a self-contained HTML document
#[derive(Debug, Parser)]
#[command(name = "md2html")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Markdown file to read
    #[arg(short, long, default_value = "input.md")]
    pub input: PathBuf,

    /// HTML file to write
    #[arg(short, long, default_value = "output.html")]
    pub output: PathBuf,
}
