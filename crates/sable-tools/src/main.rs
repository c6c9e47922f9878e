//! Offline development tools for the engine.
//!
//! - `magics gen` / `magics improve` discover magic multipliers by trying
//!   random candidates against every blocker pattern, growing the shift
//!   where possible to shrink the per-square tables, and persist them in
//!   the binary parameter format the engine loads at startup.
//! - `book build` turns a plain-text games file into an opening book.
//! - `perft` counts leaf nodes for move generator validation.

mod magic_search;

use clap::{Parser, Subcommand};
use magic_search::refine_params;
use sable_book::OpeningBook;
use sable_engine::movegen::{perft, MagicParams, SliderKind};
use sable_engine::Board;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sable-tools")]
#[command(about = "Offline tooling for the Sable chess engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover or refine magic multipliers.
    Magics {
        #[command(subcommand)]
        command: MagicsCommand,
    },
    /// Build an opening book from a games file.
    Book {
        #[command(subcommand)]
        command: BookCommand,
    },
    /// Count leaf nodes of the legal-move tree.
    Perft {
        /// Position to expand; defaults to the starting position.
        #[arg(long)]
        fen: Option<String>,
        /// Expansion depth in plies.
        #[arg(long, default_value = "5")]
        depth: u32,
        /// Print per-root-move node counts.
        #[arg(long)]
        divide: bool,
    },
}

#[derive(Subcommand)]
enum MagicsCommand {
    /// Search from the built-in parameters and write both files.
    Gen {
        /// Output directory for magic_rook.bin and magic_bishop.bin.
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// PRNG seed.
        #[arg(long, default_value = "2361912")]
        seed: u64,
        /// Search budget per piece kind, in seconds.
        #[arg(long, default_value = "5")]
        seconds: u64,
    },
    /// Continue the search from existing parameter files in place.
    Improve {
        /// Directory holding magic_rook.bin and magic_bishop.bin.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// PRNG seed.
        #[arg(long, default_value = "2361912")]
        seed: u64,
        /// Search budget per piece kind, in seconds.
        #[arg(long, default_value = "5")]
        seconds: u64,
    },
}

#[derive(Subcommand)]
enum BookCommand {
    /// Replay a games file and write the book.
    Build {
        /// Games file: one game per line, long-algebraic moves.
        #[arg(long)]
        games: PathBuf,
        /// Output book file.
        #[arg(long, default_value = "book.txt")]
        out: PathBuf,
        /// Plies recorded per game.
        #[arg(long, default_value = "16")]
        max_depth: usize,
    },
}

fn file_name(kind: SliderKind) -> &'static str {
    match kind {
        SliderKind::Rook => "magic_rook.bin",
        SliderKind::Bishop => "magic_bishop.bin",
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Magics {
            command: MagicsCommand::Gen { out, seed, seconds },
        } => {
            for kind in [SliderKind::Rook, SliderKind::Bishop] {
                let params = refine_params(
                    kind,
                    MagicParams::builtin(kind),
                    seed,
                    Duration::from_secs(seconds),
                );
                let path = out.join(file_name(kind));
                match params.write_to(&path) {
                    Ok(()) => println!("{:?}: wrote {}", kind, path.display()),
                    Err(err) => {
                        eprintln!("{:?}: {}", kind, err);
                        std::process::exit(1);
                    }
                }
            }
        }

        Commands::Magics {
            command: MagicsCommand::Improve { dir, seed, seconds },
        } => {
            for kind in [SliderKind::Rook, SliderKind::Bishop] {
                let path = dir.join(file_name(kind));
                let current = match MagicParams::read_from(&path) {
                    Ok(params) => params,
                    Err(err) => {
                        eprintln!("{}: {}", path.display(), err);
                        std::process::exit(1);
                    }
                };
                let before: u64 = current.sizes.iter().sum();
                let params = refine_params(kind, current, seed, Duration::from_secs(seconds));
                let after: u64 = params.sizes.iter().sum();
                match params.write_to(&path) {
                    Ok(()) => println!(
                        "{:?}: table entries {} -> {} ({})",
                        kind,
                        before,
                        after,
                        path.display()
                    ),
                    Err(err) => {
                        eprintln!("{:?}: {}", kind, err);
                        std::process::exit(1);
                    }
                }
            }
        }

        Commands::Book {
            command:
                BookCommand::Build {
                    games,
                    out,
                    max_depth,
                },
        } => {
            let book = match OpeningBook::build_from_games(&games, max_depth) {
                Ok(book) => book,
                Err(err) => {
                    eprintln!("{}", err);
                    std::process::exit(1);
                }
            };
            if let Err(err) = book.save(&out) {
                eprintln!("{}", err);
                std::process::exit(1);
            }
            println!("wrote {} positions to {}", book.len(), out.display());
        }

        Commands::Perft { fen, depth, divide } => {
            let mut board = match fen {
                Some(fen) => match Board::from_fen(&fen) {
                    Ok(board) => board,
                    Err(err) => {
                        eprintln!("{}", err);
                        std::process::exit(1);
                    }
                },
                None => Board::startpos(),
            };

            if divide {
                let mut total = 0u64;
                for (uci, nodes) in perft::perft_divide(&mut board, depth) {
                    println!("{}: {}", uci, nodes);
                    total += nodes;
                }
                println!("total: {}", total);
            } else {
                println!("{}", perft::perft(&mut board, depth));
            }
        }
    }
}
