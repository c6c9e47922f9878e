//! UCI `info` line types.

use serde::{Deserialize, Serialize};

/// Score in centipawns or mate distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    /// Centipawn score (100 = one pawn).
    Cp(i32),
    /// Mate in N moves (negative: the engine is getting mated).
    Mate(i32),
}

/// Search information reported by the engine while thinking.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineInfo {
    /// Search depth in plies.
    pub depth: Option<u32>,
    /// Selective search depth.
    pub seldepth: Option<u32>,
    /// Variation index; this engine always reports 1.
    pub multipv: Option<u32>,
    /// Score evaluation.
    pub score: Option<Score>,
    /// Nodes searched.
    pub nodes: Option<u64>,
    /// Nodes per second.
    pub nps: Option<u64>,
    /// Hash table occupancy in per-mille.
    pub hashfull: Option<u32>,
    /// Time spent in milliseconds.
    pub time: Option<u64>,
    /// Principal variation (best line found).
    pub pv: Vec<String>,
    /// Arbitrary string info.
    pub string: Option<String>,
}

impl EngineInfo {
    /// Creates an empty info.
    pub fn new() -> Self {
        Self::default()
    }

    /// Formats as one `info ...` line.
    pub fn to_uci(&self) -> String {
        let mut parts = vec!["info".to_string()];

        if let Some(d) = self.depth {
            parts.push(format!("depth {}", d));
        }
        if let Some(d) = self.seldepth {
            parts.push(format!("seldepth {}", d));
        }
        if let Some(m) = self.multipv {
            parts.push(format!("multipv {}", m));
        }
        match self.score {
            Some(Score::Cp(cp)) => parts.push(format!("score cp {}", cp)),
            Some(Score::Mate(m)) => parts.push(format!("score mate {}", m)),
            None => {}
        }
        if let Some(n) = self.nodes {
            parts.push(format!("nodes {}", n));
        }
        if let Some(n) = self.nps {
            parts.push(format!("nps {}", n));
        }
        if let Some(h) = self.hashfull {
            parts.push(format!("hashfull {}", h));
        }
        if let Some(t) = self.time {
            parts.push(format!("time {}", t));
        }
        if !self.pv.is_empty() {
            parts.push(format!("pv {}", self.pv.join(" ")));
        }
        if let Some(ref s) = self.string {
            parts.push(format!("string {}", s));
        }

        parts.join(" ")
    }

    /// Parses an `info` line (used by harnesses reading engine output).
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let rest = line.strip_prefix("info")?;

        let mut info = EngineInfo::new();
        let parts: Vec<&str> = rest.split_whitespace().collect();
        let mut i = 0;

        while i < parts.len() {
            match parts[i] {
                "depth" => {
                    i += 1;
                    info.depth = parts.get(i).and_then(|t| t.parse().ok());
                }
                "seldepth" => {
                    i += 1;
                    info.seldepth = parts.get(i).and_then(|t| t.parse().ok());
                }
                "multipv" => {
                    i += 1;
                    info.multipv = parts.get(i).and_then(|t| t.parse().ok());
                }
                "score" => {
                    i += 1;
                    match parts.get(i) {
                        Some(&"cp") => {
                            i += 1;
                            if let Some(cp) = parts.get(i).and_then(|t| t.parse().ok()) {
                                info.score = Some(Score::Cp(cp));
                            }
                        }
                        Some(&"mate") => {
                            i += 1;
                            if let Some(m) = parts.get(i).and_then(|t| t.parse().ok()) {
                                info.score = Some(Score::Mate(m));
                            }
                        }
                        _ => {}
                    }
                }
                "nodes" => {
                    i += 1;
                    info.nodes = parts.get(i).and_then(|t| t.parse().ok());
                }
                "nps" => {
                    i += 1;
                    info.nps = parts.get(i).and_then(|t| t.parse().ok());
                }
                "hashfull" => {
                    i += 1;
                    info.hashfull = parts.get(i).and_then(|t| t.parse().ok());
                }
                "time" => {
                    i += 1;
                    info.time = parts.get(i).and_then(|t| t.parse().ok());
                }
                "pv" => {
                    i += 1;
                    while i < parts.len() && !is_info_keyword(parts[i]) {
                        info.pv.push(parts[i].to_string());
                        i += 1;
                    }
                    continue;
                }
                "string" => {
                    i += 1;
                    info.string = Some(parts[i..].join(" "));
                    break;
                }
                _ => {}
            }
            i += 1;
        }

        Some(info)
    }
}

fn is_info_keyword(s: &str) -> bool {
    matches!(
        s,
        "depth"
            | "seldepth"
            | "multipv"
            | "score"
            | "nodes"
            | "nps"
            | "hashfull"
            | "time"
            | "pv"
            | "string"
    )
}

/// Builder for [`EngineInfo`].
#[derive(Default)]
pub struct InfoBuilder {
    info: EngineInfo,
}

impl InfoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(mut self, d: u32) -> Self {
        self.info.depth = Some(d);
        self
    }

    pub fn seldepth(mut self, d: u32) -> Self {
        self.info.seldepth = Some(d);
        self
    }

    pub fn multipv(mut self, m: u32) -> Self {
        self.info.multipv = Some(m);
        self
    }

    pub fn score(mut self, score: Score) -> Self {
        self.info.score = Some(score);
        self
    }

    pub fn score_cp(mut self, cp: i32) -> Self {
        self.info.score = Some(Score::Cp(cp));
        self
    }

    pub fn score_mate(mut self, moves: i32) -> Self {
        self.info.score = Some(Score::Mate(moves));
        self
    }

    pub fn nodes(mut self, n: u64) -> Self {
        self.info.nodes = Some(n);
        self
    }

    pub fn nps(mut self, n: u64) -> Self {
        self.info.nps = Some(n);
        self
    }

    pub fn hashfull(mut self, h: u32) -> Self {
        self.info.hashfull = Some(h);
        self
    }

    pub fn time(mut self, ms: u64) -> Self {
        self.info.time = Some(ms);
        self
    }

    pub fn pv(mut self, moves: Vec<String>) -> Self {
        self.info.pv = moves;
        self
    }

    pub fn string(mut self, s: &str) -> Self {
        self.info.string = Some(s.to_string());
        self
    }

    pub fn build(self) -> EngineInfo {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_to_uci_field_order() {
        let info = InfoBuilder::new()
            .depth(10)
            .seldepth(14)
            .multipv(1)
            .score_cp(35)
            .nodes(50_000)
            .nps(1_000_000)
            .hashfull(12)
            .time(50)
            .pv(vec!["e2e4".to_string(), "e7e5".to_string()])
            .build();

        assert_eq!(
            info.to_uci(),
            "info depth 10 seldepth 14 multipv 1 score cp 35 nodes 50000 \
             nps 1000000 hashfull 12 time 50 pv e2e4 e7e5"
        );
    }

    #[test]
    fn parse_roundtrip() {
        let line = "info depth 12 seldepth 20 multipv 1 score cp 30 nodes 125000 \
                    nps 500000 hashfull 3 time 250 pv e2e4 e7e5 g1f3";
        let info = EngineInfo::parse(line).unwrap();

        assert_eq!(info.depth, Some(12));
        assert_eq!(info.seldepth, Some(20));
        assert_eq!(info.multipv, Some(1));
        assert_eq!(info.score, Some(Score::Cp(30)));
        assert_eq!(info.nodes, Some(125_000));
        assert_eq!(info.nps, Some(500_000));
        assert_eq!(info.hashfull, Some(3));
        assert_eq!(info.time, Some(250));
        assert_eq!(info.pv, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn parse_mate_score() {
        let info = EngineInfo::parse("info depth 20 score mate 3 pv e2e4").unwrap();
        assert_eq!(info.score, Some(Score::Mate(3)));

        let info = EngineInfo::parse("info depth 20 score mate -2").unwrap();
        assert_eq!(info.score, Some(Score::Mate(-2)));
    }

    #[test]
    fn parse_rejects_other_lines() {
        assert!(EngineInfo::parse("bestmove e2e4").is_none());
        assert!(EngineInfo::parse("").is_none());
    }

    #[test]
    fn parse_string_consumes_rest() {
        let info = EngineInfo::parse("info string book move chosen").unwrap();
        assert_eq!(info.string.as_deref(), Some("book move chosen"));
    }
}
