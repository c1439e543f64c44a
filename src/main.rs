use anyhow::Result;
use clap::Parser;
use log::info;

use pagebook::cli::{Cli, Commands, commands};
use pagebook::config::Manifest;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to a file, truncated on each run; stdout belongs to the TUI.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&cli.log_file)?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    info!("starting pagebook");
    let manifest = Manifest::load(&cli.manifest)?;

    match cli.command.unwrap_or(Commands::Read) {
        Commands::Read => commands::read::read_command(manifest).await,
        Commands::Load => {
            let ok = commands::load::load_command(manifest).await?;
            if !ok {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Sections => commands::sections::sections_command(&manifest),
    }
}
