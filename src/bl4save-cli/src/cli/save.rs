//! Save command CLI definitions

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Options shared by every command that opens a `.sav` container
#[derive(Args, Debug, Clone, Default)]
pub struct ContainerArgs {
    /// Steam ID for decryption (uses configured default if not provided)
    #[arg(short, long, env = "BL4SAVE_STEAM_ID")]
    pub steam_id: Option<String>,

    /// Reject saves whose checksum footer doesn't match the document
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand)]
pub enum SaveCommand {
    /// Decrypt .sav to YAML
    Decrypt {
        /// Path to .sav file (reads stdin if omitted)
        input: Option<PathBuf>,

        /// Output YAML file (writes stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Add a _DECODED_ITEMS section listing every item serial for editing
        #[arg(short, long)]
        decode_items: bool,

        #[command(flatten)]
        container: ContainerArgs,
    },

    /// Encrypt YAML to .sav, folding in an edited _DECODED_ITEMS section
    Encrypt {
        /// Path to YAML file (reads stdin if omitted)
        input: Option<PathBuf>,

        /// Output .sav file (writes stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Steam ID for encryption (uses configured default if not provided)
        #[arg(short, long, env = "BL4SAVE_STEAM_ID")]
        steam_id: Option<String>,
    },

    /// List the item serials found in a save
    Items {
        /// Path to .sav file (reads stdin if omitted)
        input: Option<PathBuf>,

        /// Print as JSON instead of text
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        container: ContainerArgs,
    },
}
