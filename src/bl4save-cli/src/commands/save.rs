//! Save file command handlers

use anyhow::{Context, Result};
use bl4save::{ContainerOptions, DecodedItem, SaveFile, DECODED_ITEMS_KEY};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

use crate::cli::ContainerArgs;
use crate::config::Config;
use crate::file_io::{read_input, write_output};

/// Get Steam ID from argument or config
pub fn get_steam_id(provided: Option<String>, config: &Config) -> Result<String> {
    if let Some(id) = provided {
        return Ok(id);
    }

    config.get_steam_id().map(String::from).context(
        "Steam ID not provided. Run 'bl4save configure --steam-id YOUR_STEAM_ID' to set a default.",
    )
}

fn open_save(
    encrypted: &[u8],
    steam_id: &str,
    options: &ContainerOptions,
) -> Result<(Vec<u8>, SaveFile)> {
    debug!(?options, bytes = encrypted.len(), "decrypting save");
    let yaml = bl4save::decrypt_sav_with(encrypted, steam_id, options)
        .context("Failed to decrypt save file")?;
    let save = SaveFile::from_yaml(&yaml).context("Failed to parse save file")?;
    Ok((yaml, save))
}

/// Decrypted document, with the decoded-items section added when asked for.
/// Without it the bytes are returned exactly as stored.
fn decrypt_to_yaml(
    encrypted: &[u8],
    steam_id: &str,
    options: &ContainerOptions,
    decode_items: bool,
) -> Result<Vec<u8>> {
    let (yaml, mut save) = open_save(encrypted, steam_id, options)?;
    if !decode_items {
        return Ok(yaml);
    }

    let count = save
        .with_decoded_items()
        .context("Failed to add decoded items")?;
    eprintln!("Decoded {} item serial(s) into {}", count, DECODED_ITEMS_KEY);
    save.to_yaml().context("Failed to serialize YAML")
}

fn encrypt_from_yaml(yaml: &[u8], steam_id: &str) -> Result<Vec<u8>> {
    let mut save = SaveFile::from_yaml(yaml).context("Failed to parse YAML")?;

    let yaml = if save.value().get(DECODED_ITEMS_KEY).is_some() {
        let rewritten = save
            .apply_decoded_items()
            .with_context(|| format!("Failed to apply {} section", DECODED_ITEMS_KEY))?;
        eprintln!("Re-encoded {} edited item serial(s)", rewritten);
        save.to_yaml().context("Failed to serialize YAML")?
    } else {
        yaml.to_vec()
    };

    bl4save::encrypt_sav(&yaml, steam_id).context("Failed to encrypt save file")
}

/// Handle `save decrypt` command
pub fn decrypt(
    input: Option<&Path>,
    output: Option<&Path>,
    decode_items: bool,
    container: &ContainerArgs,
    config: &Config,
) -> Result<()> {
    let steam_id = get_steam_id(container.steam_id.clone(), config)?;
    let options = config.container_options(container.strict);

    let encrypted = read_input(input)?;
    let yaml = decrypt_to_yaml(&encrypted, &steam_id, &options, decode_items)?;
    write_output(output, &yaml)?;

    if let (Some(i), Some(o)) = (input, output) {
        eprintln!("Decrypted {} -> {}", i.display(), o.display());
    }

    Ok(())
}

/// Handle `save encrypt` command
pub fn encrypt(
    input: Option<&Path>,
    output: Option<&Path>,
    steam_id: Option<String>,
    config: &Config,
) -> Result<()> {
    let steam_id = get_steam_id(steam_id, config)?;

    let yaml = read_input(input)?;
    let encrypted = encrypt_from_yaml(&yaml, &steam_id)?;
    write_output(output, &encrypted)?;

    if let (Some(i), Some(o)) = (input, output) {
        eprintln!("Encrypted {} -> {}", i.display(), o.display());
    }

    Ok(())
}

/// Handle `save items` command
pub fn items(
    input: Option<&Path>,
    json: bool,
    container: &ContainerArgs,
    config: &Config,
) -> Result<()> {
    let steam_id = get_steam_id(container.steam_id.clone(), config)?;
    let options = config.container_options(container.strict);

    let encrypted = read_input(input)?;
    let (_, save) = open_save(&encrypted, &steam_id, &options)?;
    let found = save.find_serials();

    if json {
        let text = serde_json::to_string_pretty(&found).context("Failed to serialize items")?;
        println!("{}", text);
    } else {
        print!("{}", format_items(&found));
    }

    Ok(())
}

fn format_items(found: &BTreeMap<String, DecodedItem>) -> String {
    if found.is_empty() {
        return "No item serials found\n".to_string();
    }

    let mut out = String::new();
    for (path, item) in found {
        let _ = writeln!(out, "{}", path);
        let _ = writeln!(
            out,
            "  type: {}  category: {}  confidence: {}",
            item.item_type, item.category, item.confidence
        );
        let stats: Vec<String> = item
            .stats
            .iter()
            .map(|(field, value)| format!("{}={}", field, value))
            .collect();
        if !stats.is_empty() {
            let _ = writeln!(out, "  {}", stats.join(" "));
        }
    }
    let _ = writeln!(out, "\n{} item serial(s)", found.len());
    out
}
