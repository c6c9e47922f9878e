//! The Sable UCI front-end.
//!
//! One thread reads protocol lines; `go` hands a clone of the board to a
//! search thread and, for timed searches, arms a deadline timer that
//! fires the cancel token. `stop` fires the token directly. The
//! transposition table lives behind a mutex the search holds for its
//! duration, so `isready` answers exactly when the engine is idle again.
//!
//! Optional flags: `--magics <dir>` loads magic parameter files from the
//! given directory instead of the compiled-in constants (a missing or
//! corrupt file is fatal), `--book <path>` overrides the opening book
//! location.

use sable_book::OpeningBook;
use sable_engine::eval;
use sable_engine::movegen::AttackTables;
use sable_engine::search::{self, CancelToken, SearchLimits};
use sable_engine::{Board, TranspositionTable};
use sable_uci::{stdio_engine, GoOptions, GuiCommand, InfoBuilder, OptionDecl, Score};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const ENGINE_NAME: &str = concat!("Sable ", env!("CARGO_PKG_VERSION"));
const ENGINE_AUTHOR: &str = "Sable contributors";
const DEFAULT_BOOK_PATH: &str = "book.txt";

struct Options {
    own_book: bool,
}

struct Engine {
    board: Board,
    tt: Arc<Mutex<TranspositionTable>>,
    options: Options,
    book_path: PathBuf,
    book: Option<Arc<OpeningBook>>,
    /// Cleared for the rest of the game after the first probe miss.
    book_active: bool,
    search: Option<(CancelToken, thread::JoinHandle<()>)>,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if let Some(dir) = flag_value(&args, "--magics") {
        let dir = Path::new(&dir);
        let tables =
            AttackTables::from_files(&dir.join("magic_rook.bin"), &dir.join("magic_bishop.bin"));
        match tables {
            Ok(tables) => {
                if sable_engine::movegen::install_attack_tables(tables).is_err() {
                    eprintln!("attack tables were already initialized");
                }
            }
            Err(err) => {
                eprintln!("fatal: cannot load magic parameters: {}", err);
                std::process::exit(1);
            }
        }
    }

    let book_path = flag_value(&args, "--book")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BOOK_PATH));

    let mut engine = Engine {
        board: Board::startpos(),
        tt: Arc::new(Mutex::new(TranspositionTable::new())),
        options: Options { own_book: false },
        book_path,
        book: None,
        book_active: true,
        search: None,
    };

    let mut uci = stdio_engine();
    loop {
        let command = match uci.read_command() {
            Ok(command) => command,
            Err(err) => {
                eprintln!("error reading command: {}", err);
                continue;
            }
        };

        match command {
            GuiCommand::Uci => {
                uci.send_id(ENGINE_NAME, ENGINE_AUTHOR).ok();
                uci.send_option(OptionDecl::Spin {
                    name: "Hash".into(),
                    default: sable_engine::tt::DEFAULT_SIZE_MB as i64,
                    min: 1,
                    max: 1024,
                })
                .ok();
                uci.send_option(OptionDecl::Button {
                    name: "Clear Hash".into(),
                })
                .ok();
                uci.send_option(OptionDecl::Check {
                    name: "OwnBook".into(),
                    default: false,
                })
                .ok();
                uci.send_uciok().ok();
            }

            GuiCommand::IsReady => {
                // Answer the moment the search releases the table.
                let tt = engine.tt.clone();
                thread::spawn(move || {
                    drop(tt.lock());
                    println!("readyok");
                });
            }

            GuiCommand::SetOption { name, value } => set_option(&mut engine, &name, value),

            GuiCommand::UciNewGame => {
                reap_search(&mut engine);
                engine.board = Board::startpos();
                engine.book_active = true;
                if let Ok(mut tt) = engine.tt.lock() {
                    tt.clear();
                }
            }

            GuiCommand::Position { fen, moves } => set_position(&mut engine, fen, moves),

            GuiCommand::Go(opts) => start_search(&mut engine, opts),

            GuiCommand::Stop => {
                if let Some((cancel, _)) = &engine.search {
                    cancel.cancel();
                }
            }

            GuiCommand::Quit => {
                if let Some((cancel, handle)) = engine.search.take() {
                    cancel.cancel();
                    handle.join().ok();
                }
                break;
            }

            // Debug convenience outside the UCI surface.
            GuiCommand::Unknown(line) if line == "eval" => {
                let eval = eval::evaluate(&engine.board);
                println!(
                    "evaluation: {}{:.2}",
                    if eval.score >= 0 { "+" } else { "" },
                    eval.score as f32 / 100.0
                );
            }

            GuiCommand::Unknown(line) => {
                if !line.is_empty() {
                    eprintln!("unknown command: {}", line);
                }
            }
        }
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// Joins a finished or cancelled search before mutating shared state.
fn reap_search(engine: &mut Engine) {
    if let Some((cancel, handle)) = engine.search.take() {
        cancel.cancel();
        handle.join().ok();
    }
}

fn set_option(engine: &mut Engine, name: &str, value: Option<String>) {
    match name {
        "Hash" => {
            let Some(value) = value.as_deref().and_then(|v| v.parse::<u64>().ok()) else {
                eprintln!("invalid Hash value");
                return;
            };
            if let Ok(mut tt) = engine.tt.lock() {
                if let Err(err) = tt.resize(value) {
                    eprintln!("{}", err);
                }
            }
        }
        "Clear Hash" => {
            if let Ok(mut tt) = engine.tt.lock() {
                tt.clear();
            }
        }
        "OwnBook" => match value.as_deref() {
            Some("true") => engine.options.own_book = true,
            Some("false") => engine.options.own_book = false,
            other => eprintln!("invalid OwnBook value: {:?}", other),
        },
        other => eprintln!("unknown option: {}", other),
    }
}

/// Applies a `position` command; the board is untouched when any part of
/// the command is invalid.
fn set_position(engine: &mut Engine, fen: Option<String>, moves: Vec<String>) {
    let mut board = match fen {
        None => Board::startpos(),
        Some(fen) => match Board::from_fen(&fen) {
            Ok(board) => board,
            Err(err) => {
                eprintln!("invalid position: {}", err);
                return;
            }
        },
    };

    for uci in &moves {
        match board.find_legal(uci) {
            Some(m) => board.make_move(m),
            None => {
                eprintln!("invalid move: {}", uci);
                return;
            }
        }
    }

    engine.board = board;
    engine.book_active = true;
}

/// Derives the time budget in milliseconds, or `None` for an untimed
/// search. The clock budget spreads the remaining time over the expected
/// rest of the game, scaled by the game phase.
fn time_budget(board: &Board, opts: &GoOptions) -> Option<u64> {
    if opts.infinite {
        return None;
    }
    if let Some(movetime) = opts.movetime {
        return Some(movetime);
    }

    let clock = match board.side_to_move() {
        sable_core::Color::White => opts.wtime,
        sable_core::Color::Black => opts.btime,
    }?;

    let remaining_moves = match opts.movestogo {
        Some(movestogo) => movestogo as u64 + 1,
        None => (30 + 30 * eval::game_phase(board) as u64 / 24).max(1),
    };
    Some((clock / remaining_moves).max(1))
}

fn start_search(engine: &mut Engine, opts: GoOptions) {
    reap_search(engine);

    if engine.board.legal_moves().is_empty() {
        println!("bestmove 0000");
        return;
    }

    if engine.options.own_book && engine.book_active {
        if let Some(m) = probe_book(engine) {
            println!("bestmove {}", m);
            return;
        }
        engine.book_active = false;
    }

    let cancel = CancelToken::new();

    if let Some(budget) = time_budget(&engine.board, &opts) {
        let timer_cancel = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(budget.saturating_sub(1)));
            timer_cancel.cancel();
        });
    }

    let mut board = engine.board.clone();
    let tt = engine.tt.clone();
    let search_cancel = cancel.clone();
    let limits = SearchLimits {
        depth: opts.depth.map(|d| d.min(u8::MAX as u32) as u8),
    };

    let handle = thread::spawn(move || {
        let mut tt = match tt.lock() {
            Ok(tt) => tt,
            Err(poisoned) => poisoned.into_inner(),
        };
        let outcome = search::search(&mut board, &mut tt, &search_cancel, limits, |report| {
            let score = match search::mate_in(report.score) {
                Some(moves) => Score::Mate(moves),
                None => Score::Cp(report.score),
            };
            let info = InfoBuilder::new()
                .depth(report.depth as u32)
                .seldepth(report.seldepth as u32)
                .multipv(1)
                .score(score)
                .nodes(report.nodes)
                .nps(report.nps)
                .hashfull(report.hashfull)
                .time(report.time_ms)
                .pv(report.pv.iter().map(|m| m.to_uci()).collect())
                .build();
            println!("{}", sable_uci::EngineMessage::Info(info).to_uci());
        });

        if outcome.best.is_null() {
            println!("bestmove 0000");
        } else {
            println!("bestmove {}", outcome.best);
        }
    });

    engine.search = Some((cancel, handle));
}

fn probe_book(engine: &mut Engine) -> Option<sable_core::Move> {
    if engine.book.is_none() {
        match OpeningBook::load(&engine.book_path) {
            Ok(book) => engine.book = Some(Arc::new(book)),
            Err(err) => {
                eprintln!("opening book unavailable: {}", err);
                engine.book_active = false;
                return None;
            }
        }
    }

    let book = engine.book.as_ref()?;
    let mut rng = rand::thread_rng();
    let m = book.probe(engine.board.hash(), &mut rng)?;
    // The book stores raw encodings; only play a move that is actually
    // legal here.
    engine.board.find_legal(&m.to_uci())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn go(parts: &str) -> GoOptions {
        match GuiCommand::parse(parts).unwrap() {
            GuiCommand::Go(opts) => opts,
            other => panic!("expected go, got {:?}", other),
        }
    }

    #[test]
    fn budget_movetime_is_exact() {
        let board = Board::startpos();
        assert_eq!(time_budget(&board, &go("go movetime 250")), Some(250));
    }

    #[test]
    fn budget_infinite_is_untimed() {
        let board = Board::startpos();
        assert_eq!(time_budget(&board, &go("go infinite")), None);
        assert_eq!(time_budget(&board, &go("go depth 6")), None);
    }

    #[test]
    fn budget_uses_movers_clock() {
        let board = Board::startpos();
        // Full middlegame: 60 expected moves remain.
        assert_eq!(
            time_budget(&board, &go("go wtime 60000 btime 1")),
            Some(1000)
        );

        let mut board = Board::startpos();
        board.make_move(board.find_legal("e2e4").unwrap());
        assert_eq!(
            time_budget(&board, &go("go wtime 1 btime 60000")),
            Some(1000)
        );
    }

    #[test]
    fn budget_respects_movestogo() {
        let board = Board::startpos();
        assert_eq!(
            time_budget(&board, &go("go wtime 44000 movestogo 10")),
            Some(4000)
        );
    }

    #[test]
    fn budget_shrinks_toward_endgame() {
        let endgame = Board::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        // Phase 0: 30 expected moves instead of 60.
        assert_eq!(
            time_budget(&endgame, &go("go wtime 60000")),
            Some(2000)
        );
    }

    #[test]
    fn position_command_is_atomic() {
        let mut engine = test_engine();
        let before = engine.board.to_fen();
        // Second move is illegal: the board must stay untouched.
        set_position(&mut engine, None, vec!["e2e4".into(), "e2e4".into()]);
        assert_eq!(engine.board.to_fen(), before);

        set_position(&mut engine, None, vec!["e2e4".into(), "e7e5".into()]);
        assert!(engine.board.to_fen().contains(" w "));
    }

    #[test]
    fn bad_fen_is_rejected() {
        let mut engine = test_engine();
        let before = engine.board.to_fen();
        set_position(&mut engine, Some("garbage".into()), vec![]);
        assert_eq!(engine.board.to_fen(), before);
    }

    #[test]
    fn hash_option_resizes() {
        let mut engine = test_engine();
        set_option(&mut engine, "Hash", Some("64".into()));
        assert_eq!(engine.tt.lock().unwrap().size_mb(), 64);

        // Out-of-range sizes are reported and ignored.
        set_option(&mut engine, "Hash", Some("4096".into()));
        assert_eq!(engine.tt.lock().unwrap().size_mb(), 64);
    }

    #[test]
    fn own_book_option_toggles() {
        let mut engine = test_engine();
        assert!(!engine.options.own_book);
        set_option(&mut engine, "OwnBook", Some("true".into()));
        assert!(engine.options.own_book);
        set_option(&mut engine, "OwnBook", Some("false".into()));
        assert!(!engine.options.own_book);
    }

    fn test_engine() -> Engine {
        Engine {
            board: Board::startpos(),
            tt: Arc::new(Mutex::new(TranspositionTable::with_size(1).unwrap())),
            options: Options { own_book: false },
            book_path: PathBuf::from(DEFAULT_BOOK_PATH),
            book: None,
            book_active: true,
            search: None,
        }
    }
}
