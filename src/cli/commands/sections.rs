//! Print the configured tracks and their sections.

use anyhow::Result;
use colored::Colorize;
use is_terminal::IsTerminal;

use crate::config::Manifest;

pub fn sections_command(manifest: &Manifest) -> Result<()> {
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let table = manifest.section_table()?;
    println!("{} ({} pages)", manifest.title.bold(), table.len());
    for track in table.tracks() {
        println!("  {}", track.name.blue());
        for (index, section) in track.sections.iter().enumerate() {
            println!("    {} {}", format!("{}.", index + 1).dimmed(), section);
        }
    }
    Ok(())
}
