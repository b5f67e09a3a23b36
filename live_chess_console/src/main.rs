// Legend for various fix-this comments:
//   * "TODO" - bug or missing crucial feature.
//   * "Improvement potential" - missing nice-to-have feature or an opportunity
//       to make code better or faster.

#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod network;
pub mod tui;

mod client_main;
mod replay;

use anyhow::Context;
use clap::{Command, arg};
use live_chess::config::ClientConfig;
use live_chess::event::GameId;


fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let matches = Command::new("Live chess")
        .version(clap::crate_version!())
        .about("Console front-end for the live chess synchronization core")
        .subcommand_required(true)
        .subcommand(
            Command::new("client")
                .about("Connect to a server and play or watch a game")
                .arg(arg!(<config_file> "Path to the configuration file: yaml ClientConfig"))
                .arg(arg!(<game_id> "Game ID")),
        )
        .subcommand(
            Command::new("replay")
                .about("Feed a recorded transcript of server messages into a game, offline")
                .arg(arg!(<details_file> "JSON file with the game details"))
                .arg(arg!(<transcript_file> "JSON lines: {\"topic\", \"payload\", \"at_ms\"}")),
        )
        .subcommand(
            Command::new("check-config")
                .about("Parse a configuration file and print the effective config")
                .arg(arg!(<config_file> "Path to the configuration file")),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("client", sub_matches)) => {
            let config = read_config_file(sub_matches.get_one::<String>("config_file").unwrap())?;
            let game_id = GameId::new(sub_matches.get_one::<String>("game_id").unwrap().clone());
            client_main::run(config, game_id)
        }
        Some(("replay", sub_matches)) => replay::run(replay::ReplayConfig {
            details_file: sub_matches.get_one::<String>("details_file").unwrap().clone(),
            transcript_file: sub_matches.get_one::<String>("transcript_file").unwrap().clone(),
        }),
        Some(("check-config", sub_matches)) => {
            let config = read_config_file(sub_matches.get_one::<String>("config_file").unwrap())?;
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
        _ => unreachable!("Exhausted list of subcommands and subcommand_required prevents `None`"),
    }
}

fn read_config_file(filename: &str) -> anyhow::Result<ClientConfig> {
    let contents = std::fs::read_to_string(filename)
        .with_context(|| format!("Failed to read config file '{filename}'."))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file '{filename}'."))
}
