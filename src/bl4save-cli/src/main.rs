mod cli;
mod commands;
mod config;
mod file_io;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::*;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Configure {
            steam_id,
            strict_footer,
            show,
        } => {
            commands::configure::handle(steam_id, strict_footer, show)?;
        }

        Commands::Save { command } => {
            let config = Config::load()?;
            match command {
                SaveCommand::Decrypt {
                    input,
                    output,
                    decode_items,
                    container,
                } => {
                    commands::save::decrypt(
                        input.as_deref(),
                        output.as_deref(),
                        decode_items,
                        &container,
                        &config,
                    )?;
                }

                SaveCommand::Encrypt {
                    input,
                    output,
                    steam_id,
                } => {
                    commands::save::encrypt(input.as_deref(), output.as_deref(), steam_id, &config)?;
                }

                SaveCommand::Items {
                    input,
                    json,
                    container,
                } => {
                    commands::save::items(input.as_deref(), json, &container, &config)?;
                }
            }
        }

        Commands::Serial { command } => match command {
            SerialCommand::Decode { serial, verbose } => {
                commands::serial::decode(&serial, verbose)?;
            }

            SerialCommand::Encode { serial, overrides } => {
                commands::serial::encode(&serial, &(&overrides).into())?;
            }
        },
    }

    Ok(())
}
