//! Transposition table.
//!
//! A flat array of slots indexed by `hash % capacity`; each slot is
//! three-way associative. The first sub-entry prefers depth within the
//! current generation, the other two always replace. A one-byte generation
//! tag (the game move count at insertion) invalidates stale entries
//! without clearing the table.

use sable_core::Move;
use thiserror::Error;

/// Node classification for a stored score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    /// Exact score.
    Pv = 0,
    /// Upper bound (no move improved alpha).
    All = 1,
    /// Lower bound (a move caused a beta cutoff).
    Cut = 2,
}

impl NodeType {
    fn from_bits(bits: u8) -> NodeType {
        match bits & 0x3 {
            0 => NodeType::Pv,
            1 => NodeType::All,
            _ => NodeType::Cut,
        }
    }
}

/// Errors raised while sizing the table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("hash size {0} MB out of range (1..=1024)")]
    SizeOutOfRange(u64),
}

/// A usable probe hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHit {
    /// Score adjusted to the probe window for bound entries.
    pub score: i32,
    pub node_type: NodeType,
    /// The stored move for PV hits; null for bound hits.
    pub mov: Move,
}

/// Outcome of a probe: an optional usable hit, plus whatever move the slot
/// remembers for ordering even when the hit is not usable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Probe {
    pub hit: Option<TableHit>,
    /// Best move recorded in the slot's preferred entry, for ordering.
    pub ordering_move: Option<Move>,
    /// Node type of the slot's preferred entry.
    pub node_type: Option<NodeType>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SubEntry {
    key: u64,
    score: i32,
    mov: Move,
    /// Node type in the low 2 bits, depth in the high 6.
    info: u8,
    generation: u8,
}

impl SubEntry {
    const EMPTY: SubEntry = SubEntry {
        key: 0,
        score: 0,
        mov: Move::NULL,
        info: 0,
        generation: 0,
    };

    #[inline]
    fn depth(self) -> u8 {
        self.info >> 2
    }

    #[inline]
    fn node_type(self) -> NodeType {
        NodeType::from_bits(self.info)
    }

    #[inline]
    fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

fn pack_info(node_type: NodeType, depth: u8) -> u8 {
    (node_type as u8) | (depth.min(63) << 2)
}

const SUB_ENTRIES: usize = 3;
const SUB_ENTRY_BYTES: u64 = 16;
const SLOT_BYTES: u64 = SUB_ENTRIES as u64 * SUB_ENTRY_BYTES;

/// Default table size in megabytes.
pub const DEFAULT_SIZE_MB: u64 = 16;

/// Permitted table sizes in megabytes.
pub const SIZE_RANGE_MB: std::ops::RangeInclusive<u64> = 1..=1024;

#[derive(Clone, Copy, Default)]
struct Slot {
    entries: [SubEntry; SUB_ENTRIES],
}

/// The transposition table.
pub struct TranspositionTable {
    slots: Vec<Slot>,
    size_mb: u64,
    /// Sub-entries holding live data, for the hashfull report.
    used: u64,
}

impl TranspositionTable {
    /// Creates a table of the default size.
    pub fn new() -> Self {
        Self::with_size(DEFAULT_SIZE_MB).expect("default size is in range")
    }

    /// Creates a table of `size_mb` megabytes.
    pub fn with_size(size_mb: u64) -> Result<Self, TableError> {
        if !SIZE_RANGE_MB.contains(&size_mb) {
            return Err(TableError::SizeOutOfRange(size_mb));
        }
        let capacity = (size_mb * 1024 * 1024 / SLOT_BYTES) as usize;
        Ok(TranspositionTable {
            slots: vec![Slot::default(); capacity],
            size_mb,
            used: 0,
        })
    }

    /// The configured size in megabytes.
    pub fn size_mb(&self) -> u64 {
        self.size_mb
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Drops every entry, reallocating at the current size.
    pub fn clear(&mut self) {
        let capacity = self.slots.len();
        self.slots = vec![Slot::default(); capacity];
        self.used = 0;
    }

    /// Resizes the table, dropping every entry.
    pub fn resize(&mut self, size_mb: u64) -> Result<(), TableError> {
        *self = Self::with_size(size_mb)?;
        Ok(())
    }

    /// Occupancy in per-mille, as reported on `info hashfull`.
    pub fn hashfull(&self) -> u32 {
        let total = (self.slots.len() * SUB_ENTRIES) as u64;
        if total == 0 {
            return 0;
        }
        (self.used.min(total) * 1000 / total) as u32
    }

    #[inline]
    fn slot_index(&self, key: u64) -> usize {
        (key % self.slots.len() as u64) as usize
    }

    /// Probes the table.
    ///
    /// A sub-entry is usable when its key matches, its depth is at least
    /// the requested depth, and its generation is not older than the
    /// current one. A PV hit returns the stored score and move; bound hits
    /// return the window edge they prove.
    pub fn probe(&self, key: u64, depth: u8, generation: u8, alpha: i32, beta: i32) -> Probe {
        let slot = &self.slots[self.slot_index(key)];
        let mut probe = Probe::default();

        let preferred = slot.entries[0];
        if !preferred.is_empty() {
            probe.node_type = Some(preferred.node_type());
            if !preferred.mov.is_null() {
                probe.ordering_move = Some(preferred.mov);
            }
        }

        for entry in &slot.entries {
            if entry.key != key || entry.depth() < depth || entry.generation < generation {
                continue;
            }
            let hit = match entry.node_type() {
                NodeType::Pv => TableHit {
                    score: entry.score,
                    node_type: NodeType::Pv,
                    mov: entry.mov,
                },
                NodeType::All if entry.score <= alpha => TableHit {
                    score: alpha,
                    node_type: NodeType::All,
                    mov: Move::NULL,
                },
                NodeType::Cut if entry.score >= beta => TableHit {
                    score: beta,
                    node_type: NodeType::Cut,
                    mov: Move::NULL,
                },
                _ => continue,
            };
            probe.hit = Some(hit);
            break;
        }

        probe
    }

    /// Records a search result.
    ///
    /// A stale preferred entry is overwritten in place; a result at least
    /// as deep as the preferred entry shifts it into the always-replace
    /// pair; anything else goes into the always-replace pair directly.
    pub fn record(
        &mut self,
        key: u64,
        depth: u8,
        generation: u8,
        node_type: NodeType,
        score: i32,
        mov: Move,
    ) {
        let index = self.slot_index(key);
        let slot = &mut self.slots[index];

        let target = if slot.entries[0].generation < generation {
            0
        } else if depth >= slot.entries[0].depth() {
            // Demote the preferred entry into the always-replace pair.
            for i in (1..SUB_ENTRIES).rev() {
                slot.entries[i] = slot.entries[i - 1];
            }
            0
        } else {
            for i in (2..SUB_ENTRIES).rev() {
                slot.entries[i] = slot.entries[i - 1];
            }
            1
        };

        if slot.entries[target].is_empty() {
            self.used += 1;
        }
        slot.entries[target] = SubEntry {
            key,
            score,
            mov,
            info: pack_info(node_type, depth),
            generation,
        };
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
