//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up bl4save defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::Path;

/// Handle the configure command against the user's config file
pub fn handle(steam_id: Option<String>, strict_footer: Option<bool>, show: bool) -> Result<()> {
    handle_at(&Config::config_path()?, steam_id, strict_footer, show)
}

fn handle_at(
    path: &Path,
    steam_id: Option<String>,
    strict_footer: Option<bool>,
    show: bool,
) -> Result<()> {
    let mut config = Config::load_from(path)?;

    if show {
        print!("{}", describe(&config, path));
        return Ok(());
    }

    if steam_id.is_none() && strict_footer.is_none() {
        show_usage();
        return Ok(());
    }

    if let Some(id) = steam_id {
        println!("Steam ID configured: {}", id);
        config.steam_id = Some(id);
    }
    if let Some(strict) = strict_footer {
        println!("Strict footer checks: {}", strict);
        config.strict_footer = strict;
    }

    config.save_to(path)?;
    println!("Config saved to: {}", path.display());

    Ok(())
}

fn describe(config: &Config, path: &Path) -> String {
    let steam_id = match config.get_steam_id() {
        Some(id) => format!("Steam ID: {}\n", id),
        None => "No Steam ID configured\n".to_string(),
    };
    format!(
        "{}Strict footer checks: {}\nConfig file: {}\n",
        steam_id,
        config.strict_footer,
        path.display()
    )
}

fn show_usage() {
    println!("Usage: bl4save configure --steam-id YOUR_STEAM_ID");
    println!("   or: bl4save configure --strict-footer true");
    println!("   or: bl4save configure --show");
    println!();
    println!("Note: Borderlands 4 uses your Steam ID to encrypt saves.");
    println!("      Find it in the top left of your Steam account page.");
}
