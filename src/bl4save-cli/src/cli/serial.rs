//! Serial command CLI definitions

use bl4save::ItemStats;
use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum SerialCommand {
    /// Decode an item serial
    Decode {
        /// Item serial to decode (e.g. @UgrhQAAAcAAAADAAAAWicAAAAAAAAAAAAA)
        serial: String,

        /// Show decoded bytes and the raw field dump
        #[arg(short, long)]
        verbose: bool,
    },

    /// Re-encode a serial, optionally overriding stats
    Encode {
        /// Item serial to decode and re-encode
        serial: String,

        #[command(flatten)]
        overrides: StatOverrides,
    },
}

/// Stat values to write into a serial; unset ones keep their decoded value
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct StatOverrides {
    #[arg(long)]
    pub primary: Option<u32>,

    #[arg(long)]
    pub secondary: Option<u32>,

    #[arg(long)]
    pub level: Option<u32>,

    #[arg(long)]
    pub rarity: Option<u32>,

    #[arg(long)]
    pub manufacturer: Option<u32>,

    #[arg(long)]
    pub item_class: Option<u32>,
}

impl From<&StatOverrides> for ItemStats {
    fn from(overrides: &StatOverrides) -> Self {
        ItemStats {
            primary_stat: overrides.primary,
            secondary_stat: overrides.secondary,
            level: overrides.level,
            rarity: overrides.rarity,
            manufacturer: overrides.manufacturer,
            item_class: overrides.item_class,
        }
    }
}
