//! Core CLI definitions

use clap::{Parser, Subcommand};

use super::save::SaveCommand;
use super::serial::SerialCommand;

#[derive(Parser)]
#[command(name = "bl4save")]
#[command(about = "Borderlands 4 save transcoder and item serial editor", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence otherwise)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save file operations (decrypt, encrypt, items)
    #[command(visible_alias = "s")]
    Save {
        #[command(subcommand)]
        command: SaveCommand,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default Steam ID
        #[arg(long)]
        steam_id: Option<String>,

        /// Verify the checksum footer of every save by default (true/false)
        #[arg(long)]
        strict_footer: Option<bool>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },

    /// Item serial operations (decode, encode)
    #[command(visible_alias = "r")]
    Serial {
        #[command(subcommand)]
        command: SerialCommand,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StatOverrides;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_save_decrypt() {
        let cli = Cli::try_parse_from([
            "bl4save",
            "save",
            "decrypt",
            "1.sav",
            "-o",
            "1.yaml",
            "--steam-id",
            "76561197960521364",
            "--decode-items",
        ])
        .unwrap();

        match cli.command {
            Commands::Save {
                command:
                    SaveCommand::Decrypt {
                        input,
                        output,
                        decode_items,
                        container,
                    },
            } => {
                assert_eq!(input.unwrap().to_str(), Some("1.sav"));
                assert_eq!(output.unwrap().to_str(), Some("1.yaml"));
                assert!(decode_items);
                assert_eq!(container.steam_id.as_deref(), Some("76561197960521364"));
                assert!(!container.strict);
            }
            _ => panic!("expected save decrypt"),
        }
    }

    #[test]
    fn test_parse_aliases_and_verbose() {
        let cli = Cli::try_parse_from(["bl4save", "-v", "r", "decode", "@Ug", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Serial {
                command: SerialCommand::Decode { verbose: true, .. }
            }
        ));
    }

    #[test]
    fn test_parse_serial_encode_overrides() {
        let cli = Cli::try_parse_from([
            "bl4save",
            "serial",
            "encode",
            "@UgrhQAAAcAAAADAAAAWicAAAAAAAAAAAAA",
            "--secondary",
            "1234",
            "--item-class",
            "5",
        ])
        .unwrap();

        let Commands::Serial {
            command: SerialCommand::Encode { overrides, .. },
        } = cli.command
        else {
            panic!("expected serial encode");
        };
        assert_eq!(
            overrides,
            StatOverrides {
                secondary: Some(1234),
                item_class: Some(5),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_parse_configure_strict_footer() {
        let cli = Cli::try_parse_from(["bl4save", "configure", "--strict-footer", "true"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Configure {
                strict_footer: Some(true),
                show: false,
                ..
            }
        ));
    }
}
