//! Match harness entry point.
//!
//! Plays a series of games between two UCI engine binaries, alternating
//! colors, over an optional list of opening positions. Engines are named
//! in `arena.toml` or given as executable paths.

mod config;
mod game_runner;
mod uci_client;

use clap::Parser;
use config::ArenaConfig;
use game_runner::{play_game, GameRecord, MatchResult, MatchScore};
use std::io::BufRead;
use std::path::PathBuf;
use uci_client::UciClient;

#[derive(Parser)]
#[command(name = "sable-arena")]
#[command(about = "Pit two UCI chess engines against each other")]
struct Cli {
    /// First engine: a bot name from arena.toml or an executable path.
    engine_a: String,
    /// Second engine: a bot name from arena.toml or an executable path.
    engine_b: String,
    /// Number of games to play (colors alternate each game).
    #[arg(short, long, default_value = "2")]
    games: u32,
    /// File of opening FENs, one per line, cycled across games.
    #[arg(long)]
    openings: Option<PathBuf>,
    /// Write the full game records as JSON to this file.
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let config = match ArenaConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    let bot_a = config.resolve(&cli.engine_a);
    let bot_b = config.resolve(&cli.engine_b);

    let openings = match &cli.openings {
        Some(path) => match load_openings(path) {
            Ok(list) => list,
            Err(err) => {
                eprintln!("cannot read openings: {}", err);
                std::process::exit(1);
            }
        },
        None => Vec::new(),
    };

    let mut client_a = match connect(&bot_a.path) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{}: {}", cli.engine_a, err);
            std::process::exit(1);
        }
    };
    let mut client_b = match connect(&bot_b.path) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{}: {}", cli.engine_b, err);
            std::process::exit(1);
        }
    };

    // Score from engine A's point of view.
    let mut a_wins = 0u32;
    let mut b_wins = 0u32;
    let mut score = MatchScore::default();
    let mut records: Vec<GameRecord> = Vec::new();

    for game in 0..cli.games {
        let a_is_white = game % 2 == 0;
        let opening = if openings.is_empty() {
            None
        } else {
            Some(openings[(game / 2) as usize % openings.len()].as_str())
        };

        let outcome = if a_is_white {
            play_game(
                &mut client_a,
                &mut client_b,
                opening,
                &bot_a.time_control,
                &bot_b.time_control,
            )
        } else {
            play_game(
                &mut client_b,
                &mut client_a,
                opening,
                &bot_b.time_control,
                &bot_a.time_control,
            )
        };

        let record = match outcome {
            Ok(record) => record,
            Err(err) => {
                eprintln!("game {} aborted: {}", game + 1, err);
                break;
            }
        };

        score.add(record.result);
        match (record.result, a_is_white) {
            (MatchResult::WhiteWins, true) | (MatchResult::BlackWins, false) => a_wins += 1,
            (MatchResult::WhiteWins, false) | (MatchResult::BlackWins, true) => b_wins += 1,
            (MatchResult::Draw, _) => {}
        }

        println!(
            "game {:>3}: {} vs {} -> {:?} ({}, {} moves)",
            game + 1,
            record.white,
            record.black,
            record.result,
            record.reason,
            record.moves.len()
        );
        records.push(record);
    }

    println!();
    println!(
        "{}: {}  {}: {}  draws: {}  ({} games)",
        cli.engine_a,
        a_wins,
        cli.engine_b,
        b_wins,
        score.draws,
        score.games()
    );

    if let Some(path) = &cli.json {
        match serde_json::to_string_pretty(&records) {
            Ok(json) => {
                if let Err(err) = std::fs::write(path, json) {
                    eprintln!("cannot write report: {}", err);
                }
            }
            Err(err) => eprintln!("cannot serialize report: {}", err),
        }
    }

    client_a.quit().ok();
    client_b.quit().ok();
}

fn connect(path: &std::path::Path) -> Result<UciClient, uci_client::ClientError> {
    let mut client = UciClient::spawn(path)?;
    client.init()?;
    Ok(client)
}

fn load_openings(path: &std::path::Path) -> std::io::Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    let mut openings = Vec::new();
    for line in std::io::BufReader::new(file).lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            openings.push(trimmed.to_string());
        }
    }
    Ok(openings)
}
