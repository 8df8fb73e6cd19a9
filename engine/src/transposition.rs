/*
  Raven, a UCI-compatible chess engine.
  Copyright (C) 2024 The Raven Authors (see AUTHORS.md file)

  Raven is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  Raven is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! The transposition table: a fixed power-of-two, direct-mapped cache of
//! previously searched positions, keyed by Zobrist hash.
//!
//! Unlike a bucketed table, each index holds exactly one entry; a new store
//! either overwrites a stale key or a shallower search of the same key. This
//! is a simpler and slower-to-collide scheme than aging buckets, traded
//! deliberately for straightforwardness.

use raven_base::{Eval, Move};

/// The default table size: 2^22 entries.
pub const DEFAULT_SIZE: usize = 1 << 22;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What kind of bound `TTEntry::eval` represents.
pub enum Flag {
    /// `eval` is the exact score of the position.
    Exact,
    /// `eval` is an upper bound (no move raised alpha).
    Alpha,
    /// `eval` is a lower bound (a beta cutoff occurred).
    Beta,
}

#[derive(Clone, Copy, Debug)]
/// A single transposition-table slot.
pub struct TTEntry {
    /// The full 64-bit position key, compared on lookup to detect a
    /// different position sharing this slot's index.
    pub key: u64,
    /// The stored evaluation, side-to-move relative.
    pub eval: Eval,
    /// The depth this entry was stored at. `-1` marks an empty slot.
    pub depth: i8,
    /// Whether `eval` is exact or a bound.
    pub flag: Flag,
    /// The best (or cutoff) move found at this node, used for move ordering
    /// even when the stored depth is too shallow to trust `eval`.
    pub best_move: Move,
}

impl TTEntry {
    const EMPTY: TTEntry = TTEntry {
        key: 0,
        eval: Eval::DRAW,
        depth: -1,
        flag: Flag::Exact,
        best_move: Move::NULL,
    };

    #[inline(always)]
    #[must_use]
    /// Whether this slot holds no usable entry.
    pub const fn is_empty(&self) -> bool {
        self.depth < 0
    }
}

/// The outcome of probing the table at a required depth and window.
pub enum Probe {
    /// No entry for this key, or its stored depth was too shallow to use.
    /// The best move, if any was recorded for this key regardless of depth,
    /// is still given for ordering purposes.
    Miss { best_move: Option<Move> },
    /// An entry existed with sufficient depth; `eval` is either directly
    /// usable (the caller should return it) or a bound that didn't resolve
    /// the window (the caller should keep searching, but may still use
    /// `best_move` for ordering).
    Hit { eval: Option<Eval>, best_move: Move },
}

/// A fixed-size, direct-mapped transposition table.
///
/// Single-threaded: mutated only by the search thread (`spec.md` §5). Owns
/// its storage as a single heap-allocated `Vec`, freed when the table is
/// dropped; no unsafe code or custom allocator is used.
pub struct TTable {
    entries: Vec<TTEntry>,
    /// `entries.len()` is a power of two; `mask = entries.len() - 1`.
    mask: usize,
}

impl TTable {
    #[must_use]
    /// Build a table with `size` entries, rounded up to the next power of
    /// two if it is not already one.
    pub fn new(size: usize) -> TTable {
        let size = size.max(1).next_power_of_two();
        TTable {
            entries: vec![TTEntry::EMPTY; size],
            mask: size - 1,
        }
    }

    #[inline(always)]
    fn index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    #[must_use]
    /// The number of entries this table holds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    /// Whether the table holds no entries (only possible for a zero-sized
    /// table, which `new` never constructs).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Probe the table for `key`, honoring `depth`/`alpha`/`beta` per
    /// `spec.md` §4.5's lookup policy.
    #[must_use]
    pub fn probe(&self, key: u64, depth: i8, alpha: Eval, beta: Eval) -> Probe {
        let entry = &self.entries[self.index(key)];
        if entry.is_empty() || entry.key != key {
            return Probe::Miss { best_move: None };
        }
        if entry.depth < depth {
            return Probe::Miss {
                best_move: Some(entry.best_move),
            };
        }
        let eval = match entry.flag {
            Flag::Exact => Some(entry.eval),
            Flag::Alpha if entry.eval <= alpha => Some(alpha),
            Flag::Beta if entry.eval >= beta => Some(beta),
            _ => None,
        };
        Probe::Hit {
            eval,
            best_move: entry.best_move,
        }
    }

    /// If any entry (of any depth) is stored for `key`, return its best
    /// move. Used by move ordering even when the depth is too shallow to
    /// trust the evaluation itself.
    #[must_use]
    pub fn best_move(&self, key: u64) -> Option<Move> {
        let entry = &self.entries[self.index(key)];
        if entry.is_empty() || entry.key != key {
            None
        } else {
            Some(entry.best_move)
        }
    }

    /// Store a node. Per `spec.md` §4.5's replacement policy: overwrite iff
    /// the existing entry's key differs from `key`, or the new `depth` is
    /// at least the existing entry's depth (depth-preferred, always-replace
    /// on a fresh key).
    pub fn store(&mut self, key: u64, eval: Eval, depth: i8, flag: Flag, best_move: Move) {
        let idx = self.index(key);
        let slot = &mut self.entries[idx];
        if slot.key != key || depth >= slot.depth {
            *slot = TTEntry {
                key,
                eval,
                depth,
                flag,
                best_move,
            };
        }
    }

    /// Zero every entry, resetting them to the `depth == -1` sentinel
    /// (`spec.md` §4.5, exercised by `ucinewgame`).
    pub fn clear(&mut self) {
        self.entries.fill(TTEntry::EMPTY);
    }

    /// Resize the table to `size` entries (rounded up to a power of two),
    /// discarding all existing entries. Backs the `Hash` UCI option.
    pub fn resize(&mut self, size: usize) {
        *self = TTable::new(size);
    }
}

impl Default for TTable {
    fn default() -> TTable {
        TTable::new(DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raven_base::{PieceKind, Square};

    #[test]
    fn fresh_table_is_all_empty_sentinels() {
        let tt = TTable::new(64);
        for i in 0..tt.len() as u64 {
            assert!(matches!(
                tt.probe(i, 0, Eval::MIN, Eval::MAX),
                Probe::Miss { best_move: None }
            ));
        }
    }

    #[test]
    fn store_then_exact_hit() {
        let mut tt = TTable::new(64);
        let m = Move::new(PieceKind::Pawn, Square::E2, Square::E4);
        tt.store(7, Eval::pawns(1.0), 4, Flag::Exact, m);
        match tt.probe(7, 3, Eval::MIN, Eval::MAX) {
            Probe::Hit { eval, best_move } => {
                assert_eq!(eval, Some(Eval::pawns(1.0)));
                assert_eq!(best_move, m);
            }
            Probe::Miss { .. } => panic!("expected a hit"),
        }
    }

    #[test]
    fn shallower_required_depth_is_satisfied_but_deeper_is_a_miss_with_move() {
        let mut tt = TTable::new(64);
        let m = Move::new(PieceKind::Pawn, Square::E2, Square::E4);
        tt.store(7, Eval::DRAW, 2, Flag::Exact, m);
        match tt.probe(7, 5, Eval::MIN, Eval::MAX) {
            Probe::Miss { best_move } => assert_eq!(best_move, Some(m)),
            Probe::Hit { .. } => panic!("depth 2 should not satisfy a required depth of 5"),
        }
    }

    #[test]
    fn alpha_flag_only_resolves_below_alpha() {
        let mut tt = TTable::new(64);
        let m = Move::new(PieceKind::Pawn, Square::E2, Square::E4);
        tt.store(1, Eval::pawns(-2.0), 3, Flag::Alpha, m);
        match tt.probe(1, 3, Eval::pawns(-1.0), Eval::MAX) {
            Probe::Hit { eval, .. } => assert_eq!(eval, Some(Eval::pawns(-1.0))),
            Probe::Miss { .. } => panic!("expected a hit"),
        }
        match tt.probe(1, 3, Eval::pawns(-3.0), Eval::MAX) {
            Probe::Hit { eval, .. } => assert_eq!(eval, None),
            Probe::Miss { .. } => panic!("expected a hit with no usable eval"),
        }
    }

    #[test]
    fn depth_preferred_replacement_keeps_the_deeper_entry() {
        let mut tt = TTable::new(64);
        let shallow = Move::new(PieceKind::Pawn, Square::E2, Square::E4);
        let deep = Move::new(PieceKind::Knight, Square::B1, Square::C3);
        tt.store(3, Eval::DRAW, 5, Flag::Exact, deep);
        tt.store(3, Eval::DRAW, 2, Flag::Exact, shallow);
        assert_eq!(tt.best_move(3), Some(deep));
    }

    #[test]
    fn a_different_key_at_the_same_index_overwrites() {
        let mut tt = TTable::new(64);
        let a = Move::new(PieceKind::Pawn, Square::E2, Square::E4);
        let b = Move::new(PieceKind::Knight, Square::B1, Square::C3);
        tt.store(3, Eval::DRAW, 5, Flag::Exact, a);
        tt.store(3 + 64, Eval::DRAW, 1, Flag::Exact, b);
        assert_eq!(tt.best_move(3 + 64), Some(b));
    }

    #[test]
    fn clear_resets_every_slot_to_the_empty_sentinel() {
        let mut tt = TTable::new(64);
        tt.store(
            3,
            Eval::DRAW,
            5,
            Flag::Exact,
            Move::new(PieceKind::Pawn, Square::E2, Square::E4),
        );
        tt.clear();
        for entry in &tt.entries {
            assert_eq!(entry.depth, -1);
        }
    }
}
