//! Item serial command handlers

use anyhow::{bail, Context, Result};
use bl4save::{DecodedItem, ItemStats};
use std::fmt::Write as _;

/// Handle `serial decode` command
pub fn decode(serial: &str, verbose: bool) -> Result<()> {
    print!("{}", describe(&DecodedItem::decode(serial), verbose));
    Ok(())
}

/// Handle `serial encode` command
pub fn encode(serial: &str, overrides: &ItemStats) -> Result<()> {
    println!("{}", reencode(serial, overrides)?);
    Ok(())
}

fn reencode(serial: &str, overrides: &ItemStats) -> Result<String> {
    let item = DecodedItem::try_decode(serial)
        .with_context(|| format!("Failed to decode serial {}", serial))?;
    if !item.is_recognized() {
        bail!("{} is not a recognized item serial", serial);
    }

    item.with_stats(overrides)
        .try_encode()
        .context("Failed to re-encode serial")
}

fn describe(item: &DecodedItem, verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Serial:     {}", item.serial);
    let _ = writeln!(out, "Type:       {} ({})", item.item_type, item.category);
    let _ = writeln!(out, "Length:     {} bytes", item.length);
    let _ = writeln!(out, "Confidence: {}", item.confidence);

    if let Some(error) = &item.raw_fields.error {
        let _ = writeln!(out, "Error:      {}", error);
    }

    if !item.stats.is_empty() {
        let _ = writeln!(out, "\nStats:");
        for (field, value) in item.stats.iter() {
            let _ = writeln!(out, "  {:<15} {:>6}  (0x{:04x})", field.as_str(), value, value);
        }
    }

    if verbose && item.length > 0 {
        let _ = writeln!(out, "\nBytes: {}", item.hex_dump());
        describe_raw_fields(item, &mut out);
    }

    out
}

fn describe_raw_fields(item: &DecodedItem, out: &mut String) {
    let raw = &item.raw_fields;
    let headers = [
        ("header_le", raw.header_le),
        ("header_be", raw.header_be),
        ("field2_le", raw.field2_le),
        ("field3_le", raw.field3_le),
    ];

    let _ = writeln!(out, "\nRaw fields:");
    for (name, value) in headers {
        if let Some(v) = value {
            let _ = writeln!(out, "  {:<10} 0x{:08x}", name, v);
        }
    }

    let _ = writeln!(out, "\n  offset  byte  u16le");
    for &(offset, byte) in &raw.bytes {
        let word = raw
            .words
            .iter()
            .find(|(o, _)| *o == offset)
            .map(|(_, w)| format!("{:>6}", w))
            .unwrap_or_default();
        let _ = writeln!(out, "  {:>6}  {:02x}    {}", offset, byte, word);
    }

    if !raw.potential_stats.is_empty() {
        let stats: Vec<String> = raw
            .potential_stats
            .iter()
            .map(|(offset, value)| format!("@{}={}", offset, value))
            .collect();
        let _ = writeln!(out, "\nPotential stats: {}", stats.join(" "));
    }
    if !raw.potential_flags.is_empty() {
        let flags: Vec<String> = raw
            .potential_flags
            .iter()
            .map(|(offset, value)| format!("@{}={}", offset, value))
            .collect();
        let _ = writeln!(out, "Potential flags: {}", flags.join(" "));
    }
}
