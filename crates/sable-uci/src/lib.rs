//! UCI (Universal Chess Interface) protocol library.
//!
//! This crate provides types and parsing for the line-based protocol
//! between a chess GUI and an engine.
//!
//! # Commands handled
//!
//! - `uci` - initialize, get id and options
//! - `isready` / `readyok` - synchronization
//! - `setoption name <X> [value <Y>]` - engine options
//! - `ucinewgame` - reset for a new game
//! - `position [startpos | fen <fen>] [moves <move>...]` - set position
//! - `go [movetime <ms>] [depth <d>] [wtime ...]` - start search
//! - `stop` - stop search
//! - `quit` - exit engine

mod command;
mod info;

pub use command::{GoOptions, GuiCommand};
pub use info::{EngineInfo, InfoBuilder, Score};

use std::io::{BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// An option declaration printed in response to `uci`.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionDecl {
    /// An integer option with default and bounds.
    Spin { name: String, default: i64, min: i64, max: i64 },
    /// A boolean option.
    Check { name: String, default: bool },
    /// A stateless button.
    Button { name: String },
}

impl OptionDecl {
    fn to_uci(&self) -> String {
        match self {
            OptionDecl::Spin {
                name,
                default,
                min,
                max,
            } => format!(
                "option name {} type spin default {} min {} max {}",
                name, default, min, max
            ),
            OptionDecl::Check { name, default } => {
                format!("option name {} type check default {}", name, default)
            }
            OptionDecl::Button { name } => format!("option name {} type button", name),
        }
    }
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification.
    Id {
        name: Option<String>,
        author: Option<String>,
    },
    /// An option declaration.
    Option(OptionDecl),
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found.
    BestMove { mv: String },
}

impl EngineMessage {
    /// Formats the message for output.
    pub fn to_uci(&self) -> String {
        match self {
            EngineMessage::Id { name, author } => {
                let mut parts = Vec::new();
                if let Some(n) = name {
                    parts.push(format!("id name {}", n));
                }
                if let Some(a) = author {
                    parts.push(format!("id author {}", a));
                }
                parts.join("\n")
            }
            EngineMessage::Option(decl) => decl.to_uci(),
            EngineMessage::UciOk => "uciok".to_string(),
            EngineMessage::ReadyOk => "readyok".to_string(),
            EngineMessage::Info(info) => info.to_uci(),
            EngineMessage::BestMove { mv } => format!("bestmove {}", mv),
        }
    }
}

/// Engine-side protocol endpoint over a reader/writer pair.
pub struct UciEngine<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> UciEngine<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Reads and parses the next GUI command. Returns `quit` at EOF so a
    /// closed pipe shuts the engine down.
    pub fn read_command(&mut self) -> Result<GuiCommand, UciError> {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line)?;
        if bytes == 0 {
            return Ok(GuiCommand::Quit);
        }
        GuiCommand::parse(&line)
    }

    /// Sends a message to the GUI.
    pub fn send(&mut self, msg: &EngineMessage) -> Result<(), UciError> {
        writeln!(self.writer, "{}", msg.to_uci())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Sends engine identification.
    pub fn send_id(&mut self, name: &str, author: &str) -> Result<(), UciError> {
        self.send(&EngineMessage::Id {
            name: Some(name.to_string()),
            author: Some(author.to_string()),
        })
    }

    /// Sends an option declaration.
    pub fn send_option(&mut self, decl: OptionDecl) -> Result<(), UciError> {
        self.send(&EngineMessage::Option(decl))
    }

    /// Sends uciok.
    pub fn send_uciok(&mut self) -> Result<(), UciError> {
        self.send(&EngineMessage::UciOk)
    }

    /// Sends readyok.
    pub fn send_readyok(&mut self) -> Result<(), UciError> {
        self.send(&EngineMessage::ReadyOk)
    }

    /// Sends the final best move of a search.
    pub fn send_bestmove(&mut self, mv: &str) -> Result<(), UciError> {
        self.send(&EngineMessage::BestMove { mv: mv.to_string() })
    }

    /// Sends a search info line.
    pub fn send_info(&mut self, info: EngineInfo) -> Result<(), UciError> {
        self.send(&EngineMessage::Info(info))
    }
}

/// Creates a UCI engine endpoint on stdin/stdout.
pub fn stdio_engine() -> UciEngine<std::io::BufReader<std::io::Stdin>, std::io::Stdout> {
    UciEngine::new(std::io::BufReader::new(std::io::stdin()), std::io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_formatting() {
        let id = EngineMessage::Id {
            name: Some("Sable".into()),
            author: Some("Sable contributors".into()),
        };
        assert_eq!(id.to_uci(), "id name Sable\nid author Sable contributors");
        assert_eq!(EngineMessage::UciOk.to_uci(), "uciok");
        assert_eq!(EngineMessage::ReadyOk.to_uci(), "readyok");
        assert_eq!(
            EngineMessage::BestMove { mv: "e2e4".into() }.to_uci(),
            "bestmove e2e4"
        );
    }

    #[test]
    fn option_formatting() {
        assert_eq!(
            OptionDecl::Spin {
                name: "Hash".into(),
                default: 16,
                min: 1,
                max: 1024
            }
            .to_uci(),
            "option name Hash type spin default 16 min 1 max 1024"
        );
        assert_eq!(
            OptionDecl::Check {
                name: "OwnBook".into(),
                default: false
            }
            .to_uci(),
            "option name OwnBook type check default false"
        );
        assert_eq!(
            OptionDecl::Button {
                name: "Clear Hash".into()
            }
            .to_uci(),
            "option name Clear Hash type button"
        );
    }

    #[test]
    fn engine_roundtrip_over_buffers() {
        let input = b"uci\nisready\nquit\n" as &[u8];
        let mut output = Vec::new();
        let mut engine = UciEngine::new(input, &mut output);

        assert_eq!(engine.read_command().unwrap(), GuiCommand::Uci);
        engine.send_id("Sable", "Sable contributors").unwrap();
        engine.send_uciok().unwrap();

        assert_eq!(engine.read_command().unwrap(), GuiCommand::IsReady);
        engine.send_readyok().unwrap();

        assert_eq!(engine.read_command().unwrap(), GuiCommand::Quit);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("id name Sable"));
        assert!(text.contains("uciok"));
        assert!(text.contains("readyok"));
    }

    #[test]
    fn eof_reads_as_quit() {
        let input = b"" as &[u8];
        let mut output = Vec::new();
        let mut engine = UciEngine::new(input, &mut output);
        assert_eq!(engine.read_command().unwrap(), GuiCommand::Quit);
    }
}
