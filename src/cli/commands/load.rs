//! Headless batch load with a per-component summary.

use anyhow::Result;
use colored::Colorize;
use is_terminal::IsTerminal;
use log::info;

use crate::config::Manifest;
use crate::page::MountContent;
use crate::tui::AppContext;

/// Run the full batch and print one line per component. Returns the
/// aggregate outcome so the caller can set the exit code.
pub async fn load_command(manifest: Manifest) -> Result<bool> {
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let ctx = AppContext::from_manifest(manifest)?;
    info!("starting headless batch load");

    let ok = ctx.loader.load_all(&ctx.manifest.components).await;

    println!("{}", ctx.manifest.title.bold());
    for component in &ctx.manifest.components {
        let line = match ctx.document.content(&component.mount) {
            Some(MountContent::Html(html)) => format!(
                "{} {} ({} bytes)",
                "✓".green(),
                component.source_path,
                html.len()
            ),
            Some(MountContent::Error { message, .. }) => {
                format!("{} {}: {}", "✗".red(), component.source_path, message)
            }
            Some(MountContent::Empty) | None => {
                format!("{} {}: not loaded", "✗".red(), component.source_path)
            }
        };
        println!("  {line}");
    }

    if ok {
        println!("{}", "all components loaded".green());
    } else {
        println!("{}", "some components failed to load".red());
    }
    Ok(ok)
}
