use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pagebook")]
#[command(about = "A book-style paginated content engine with a terminal reader")]
pub struct Cli {
    /// Book manifest to load
    #[arg(long, global = true, default_value = "book.toml")]
    pub manifest: PathBuf,

    /// Log file (truncated on each run so the TUI stays clean)
    #[arg(long, global = true, default_value = "pagebook.log")]
    pub log_file: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the book and read it interactively (default)
    Read,
    /// Load all components headlessly and print a summary
    Load,
    /// List the configured tracks and sections
    Sections,
}
