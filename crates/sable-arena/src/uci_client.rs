//! UCI client over a child process.
//!
//! Spawns an engine binary, runs the protocol handshake, and exchanges
//! position/go/bestmove rounds. Engine `info` lines are parsed so match
//! reports can carry depth and score per move.

use sable_uci::EngineInfo;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use thiserror::Error;

/// Errors raised while talking to an engine process.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to spawn engine: {0}")]
    Spawn(std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine closed its output stream")]
    Eof,

    #[error("engine sent no bestmove")]
    NoBestMove,
}

/// A running UCI engine process.
pub struct UciClient {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    /// Name reported by `id name`, or the executable path.
    name: String,
}

impl UciClient {
    /// Spawns the engine binary with its stdio piped.
    pub fn spawn(path: &Path) -> Result<Self, ClientError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(ClientError::Spawn)?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = BufReader::new(child.stdout.take().expect("stdout was piped"));

        Ok(UciClient {
            child,
            stdin,
            stdout,
            name: path.display().to_string(),
        })
    }

    /// Returns the engine's reported name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, line: &str) -> Result<(), ClientError> {
        writeln!(self.stdin, "{}", line)?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, ClientError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(ClientError::Eof);
        }
        Ok(line.trim().to_string())
    }

    /// Runs the `uci` handshake and captures the engine name.
    pub fn init(&mut self) -> Result<(), ClientError> {
        self.send("uci")?;
        loop {
            let line = self.read_line()?;
            if let Some(name) = line.strip_prefix("id name ") {
                self.name = name.to_string();
            }
            if line == "uciok" {
                break;
            }
        }
        self.ready()
    }

    /// `isready`/`readyok` synchronization.
    pub fn ready(&mut self) -> Result<(), ClientError> {
        self.send("isready")?;
        loop {
            if self.read_line()? == "readyok" {
                return Ok(());
            }
        }
    }

    /// Starts a new game on the engine side.
    pub fn new_game(&mut self) -> Result<(), ClientError> {
        self.send("ucinewgame")?;
        self.ready()
    }

    /// Sets the position from an optional FEN and a move list.
    pub fn set_position(
        &mut self,
        fen: Option<&str>,
        moves: &[String],
    ) -> Result<(), ClientError> {
        let mut line = match fen {
            Some(fen) => format!("position fen {}", fen),
            None => "position startpos".to_string(),
        };
        if !moves.is_empty() {
            line.push_str(" moves ");
            line.push_str(&moves.join(" "));
        }
        self.send(&line)
    }

    /// Searches with the given `go` arguments; returns the best move and
    /// the last info line seen before it.
    pub fn go(&mut self, time_control: &str) -> Result<(String, Option<EngineInfo>), ClientError> {
        self.send(&format!("go {}", time_control))?;

        let mut last_info = None;
        loop {
            let line = self.read_line()?;
            if let Some(info) = EngineInfo::parse(&line) {
                last_info = Some(info);
                continue;
            }
            if let Some(rest) = line.strip_prefix("bestmove") {
                let best = rest
                    .split_whitespace()
                    .next()
                    .ok_or(ClientError::NoBestMove)?;
                return Ok((best.to_string(), last_info));
            }
        }
    }

    /// Asks the engine to exit and reaps the process.
    pub fn quit(mut self) -> Result<(), ClientError> {
        self.send("quit").ok();
        self.child.wait()?;
        Ok(())
    }
}

impl Drop for UciClient {
    fn drop(&mut self) {
        // Make sure a crashed match does not leave engines running.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
