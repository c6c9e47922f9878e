//! Random search for magic multipliers.
//!
//! For each square the candidate multiplier must map every blocker subset
//! of the relevant-occupancy mask to a distinct table index. Candidates
//! are sparse random values; for each one the shift starts at the mask's
//! natural width and grows while the mapping stays collision-free, since
//! a larger shift means a smaller table. A candidate replaces the current
//! parameters only when its table is strictly smaller.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sable_engine::movegen::{blocker_subsets, relevant_mask, slider_attacks, MagicParams, SliderKind};
use sable_engine::Bitboard;
use sable_core::Square;
use std::time::{Duration, Instant};

/// Refines the given parameters within a time budget, returning the best
/// (smallest-table) collision-free set found.
pub fn refine_params(
    kind: SliderKind,
    mut params: MagicParams,
    seed: u64,
    budget: Duration,
) -> MagicParams {
    let deadline = Instant::now() + budget;
    let mut rng = StdRng::seed_from_u64(seed);

    // Precompute the blocker patterns and reference attacks per square.
    let squares: Vec<SquareData> = (0..64u8)
        .map(|index| {
            let sq = Square::try_new(index).expect("0..64");
            let mask = relevant_mask(kind, sq);
            let subsets = blocker_subsets(mask);
            let attacks: Vec<Bitboard> = subsets
                .iter()
                .map(|&blockers| slider_attacks(kind, sq, blockers))
                .collect();
            SquareData {
                mask,
                subsets,
                attacks,
            }
        })
        .collect();

    let mut scratch = Scratch::new();
    while Instant::now() < deadline {
        for (index, data) in squares.iter().enumerate() {
            // Sparse candidates hash far better than uniform ones.
            let candidate = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();

            let base_shift = 64 - data.mask.count() as u64;
            let mut shift = base_shift;
            let mut best_for_candidate: Option<(u64, u64)> = None;
            while let Some(size) = table_size(candidate, shift, data, &mut scratch) {
                best_for_candidate = Some((shift, size));
                shift += 1;
            }

            if let Some((shift, size)) = best_for_candidate {
                if size < params.sizes[index] {
                    params.multipliers[index] = candidate;
                    params.shifts[index] = shift;
                    params.sizes[index] = size;
                }
            }
        }
    }

    params
}

struct SquareData {
    mask: Bitboard,
    subsets: Vec<Bitboard>,
    attacks: Vec<Bitboard>,
}

/// Generation-stamped scratch table, reused across probes without
/// clearing.
struct Scratch {
    stamps: Vec<u64>,
    attacks: Vec<Bitboard>,
    generation: u64,
}

impl Scratch {
    fn new() -> Self {
        Scratch {
            stamps: Vec::new(),
            attacks: Vec::new(),
            generation: 0,
        }
    }

    fn begin(&mut self, capacity: usize) {
        if self.stamps.len() < capacity {
            self.stamps.resize(capacity, 0);
            self.attacks.resize(capacity, Bitboard::EMPTY);
        }
        self.generation += 1;
    }
}

/// Tests one (multiplier, shift) pair against every subset. Returns the
/// required table size, or `None` on a collision. Subsets mapping to the
/// same index with the same attack set are constructive and allowed.
fn table_size(
    multiplier: u64,
    shift: u64,
    data: &SquareData,
    scratch: &mut Scratch,
) -> Option<u64> {
    if shift >= 64 {
        return None;
    }
    let capacity = 1usize << (64 - shift);
    scratch.begin(capacity);

    let mut max_index = 0u64;
    for (subset, &attack) in data.subsets.iter().zip(&data.attacks) {
        let index = (subset.0.wrapping_mul(multiplier) >> shift) as usize;
        if scratch.stamps[index] == scratch.generation {
            if scratch.attacks[index] != attack {
                return None;
            }
        } else {
            scratch.stamps[index] = scratch.generation;
            scratch.attacks[index] = attack;
        }
        max_index = max_index.max(index as u64);
    }

    Some(max_index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_engine::movegen::AttackTables;

    #[test]
    fn refined_params_stay_valid() {
        // A short refinement pass must keep both parameter sets buildable.
        let rook = refine_params(
            SliderKind::Rook,
            MagicParams::builtin(SliderKind::Rook),
            7,
            Duration::from_millis(50),
        );
        let bishop = refine_params(
            SliderKind::Bishop,
            MagicParams::builtin(SliderKind::Bishop),
            7,
            Duration::from_millis(50),
        );
        assert!(AttackTables::from_params(&rook, &bishop).is_ok());
    }

    #[test]
    fn refinement_never_grows_tables() {
        let before = MagicParams::builtin(SliderKind::Bishop);
        let after = refine_params(
            SliderKind::Bishop,
            before.clone(),
            42,
            Duration::from_millis(50),
        );
        let sum_before: u64 = before.sizes.iter().sum();
        let sum_after: u64 = after.sizes.iter().sum();
        assert!(sum_after <= sum_before);
    }

    #[test]
    fn builtin_multipliers_pass_the_validator() {
        for kind in [SliderKind::Rook, SliderKind::Bishop] {
            let params = MagicParams::builtin(kind);
            let mut scratch = Scratch::new();
            for index in 0..64u8 {
                let sq = Square::try_new(index).unwrap();
                let mask = relevant_mask(kind, sq);
                let subsets = blocker_subsets(mask);
                let attacks: Vec<Bitboard> = subsets
                    .iter()
                    .map(|&blockers| slider_attacks(kind, sq, blockers))
                    .collect();
                let data = SquareData {
                    mask,
                    subsets,
                    attacks,
                };
                assert!(
                    table_size(
                        params.multipliers[index as usize],
                        params.shifts[index as usize],
                        &data,
                        &mut scratch,
                    )
                    .is_some(),
                    "{:?} square {} rejected",
                    kind,
                    sq
                );
            }
        }
    }
}
