//! GUI-to-engine command parsing.

use crate::UciError;

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if the engine is ready.
    IsReady,
    /// Set an engine option; buttons carry no value.
    SetOption { name: String, value: Option<String> },
    /// Reset for a new game.
    UciNewGame,
    /// Set up a position.
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    /// Start calculating.
    Go(GoOptions),
    /// Stop calculating.
    Stop,
    /// Quit the engine.
    Quit,
    /// Unknown command (kept for forward compatibility).
    Unknown(String),
}

/// Options for the `go` command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoOptions {
    /// Search for exactly this time in milliseconds.
    pub movetime: Option<u64>,
    /// Search to this depth.
    pub depth: Option<u32>,
    /// White time remaining in milliseconds.
    pub wtime: Option<u64>,
    /// Black time remaining in milliseconds.
    pub btime: Option<u64>,
    /// White increment per move in milliseconds.
    pub winc: Option<u64>,
    /// Black increment per move in milliseconds.
    pub binc: Option<u64>,
    /// Moves to go until the next time control.
    pub movestogo: Option<u32>,
    /// Search until `stop`.
    pub infinite: bool,
}

impl GuiCommand {
    /// Parses one protocol line.
    pub fn parse(input: &str) -> Result<Self, UciError> {
        let input = input.trim();
        let mut parts = input.split_whitespace();

        match parts.next().unwrap_or("") {
            "uci" => Ok(GuiCommand::Uci),
            "isready" => Ok(GuiCommand::IsReady),
            "ucinewgame" => Ok(GuiCommand::UciNewGame),
            "setoption" => Self::parse_setoption(parts),
            "position" => Self::parse_position(parts),
            "go" => Self::parse_go(parts),
            "stop" => Ok(GuiCommand::Stop),
            "quit" => Ok(GuiCommand::Quit),
            "" => Ok(GuiCommand::Unknown(String::new())),
            _ => Ok(GuiCommand::Unknown(input.to_string())),
        }
    }

    /// `setoption name <name tokens> [value <value tokens>]`; option names
    /// may contain spaces ("Clear Hash").
    fn parse_setoption<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        let tokens: Vec<&str> = parts.collect();
        if tokens.first() != Some(&"name") {
            return Err(UciError::ParseError(
                "setoption: expected 'name'".to_string(),
            ));
        }

        let value_at = tokens.iter().position(|&t| t == "value");
        let name_tokens = match value_at {
            Some(index) => &tokens[1..index],
            None => &tokens[1..],
        };
        if name_tokens.is_empty() {
            return Err(UciError::ParseError(
                "setoption: empty option name".to_string(),
            ));
        }

        let value = value_at.map(|index| tokens[index + 1..].join(" "));
        Ok(GuiCommand::SetOption {
            name: name_tokens.join(" "),
            value,
        })
    }

    fn parse_position<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        let fen = match parts.next() {
            Some("startpos") => None,
            Some("fen") => {
                let mut fen_parts = Vec::new();
                for part in parts.by_ref() {
                    if part == "moves" {
                        break;
                    }
                    fen_parts.push(part);
                }
                if fen_parts.is_empty() {
                    return Err(UciError::ParseError("position: empty FEN".to_string()));
                }
                Some(fen_parts.join(" "))
            }
            Some(other) => {
                return Err(UciError::ParseError(format!(
                    "position: expected 'startpos' or 'fen', got '{}'",
                    other
                )));
            }
            None => {
                return Err(UciError::ParseError(
                    "position: expected 'startpos' or 'fen'".to_string(),
                ));
            }
        };

        // For the startpos form the "moves" keyword is still ahead of us;
        // for the fen form the loop above consumed it.
        let remaining: Vec<&str> = parts.collect();
        let moves = match remaining.iter().position(|&s| s == "moves") {
            Some(index) => remaining[index + 1..].iter().map(|s| s.to_string()).collect(),
            None if fen.is_some() => remaining.iter().map(|s| s.to_string()).collect(),
            None => Vec::new(),
        };

        Ok(GuiCommand::Position { fen, moves })
    }

    fn parse_go<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Self, UciError> {
        let mut opts = GoOptions::default();
        let tokens: Vec<&str> = parts.collect();
        let mut i = 0;

        while i < tokens.len() {
            match tokens[i] {
                "movetime" => {
                    i += 1;
                    opts.movetime = tokens.get(i).and_then(|t| t.parse().ok());
                }
                "depth" => {
                    i += 1;
                    opts.depth = tokens.get(i).and_then(|t| t.parse().ok());
                }
                "wtime" => {
                    i += 1;
                    opts.wtime = tokens.get(i).and_then(|t| t.parse().ok());
                }
                "btime" => {
                    i += 1;
                    opts.btime = tokens.get(i).and_then(|t| t.parse().ok());
                }
                "winc" => {
                    i += 1;
                    opts.winc = tokens.get(i).and_then(|t| t.parse().ok());
                }
                "binc" => {
                    i += 1;
                    opts.binc = tokens.get(i).and_then(|t| t.parse().ok());
                }
                "movestogo" => {
                    i += 1;
                    opts.movestogo = tokens.get(i).and_then(|t| t.parse().ok());
                }
                "infinite" => {
                    opts.infinite = true;
                }
                _ => {}
            }
            i += 1;
        }

        Ok(GuiCommand::Go(opts))
    }
}
