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

//! Zobrist hashing: a process-wide table of random keys used to fingerprint
//! positions for the transposition table.
//!
//! The table is seeded deterministically so that every run of the engine
//! hashes the same position to the same key. Only a full recompute is
//! provided here; an incremental update is tempting but easy to get subtly
//! wrong around castling-right and en-passant toggles, so `Position` simply
//! recomputes the hash from scratch after every make/unmake.

use once_cell::sync::Lazy;

use crate::{board::Position, Color, PieceKind};

/// The PRNG seed used to build [`ZOBRIST`]. Fixed so hashes are reproducible
/// across runs and machines.
const ZOBRIST_SEED: u64 = 670;

/// Row index of the side-to-move keys within [`ZobristTable::keys`].
const SIDE_TO_MOVE_ROW: usize = 12;

/// Row index of the castling-rights keys.
const CASTLING_ROW: usize = 13;

/// Row index of the en-passant file keys.
const EN_PASSANT_ROW: usize = 14;

/// The process-wide Zobrist key table.
pub static ZOBRIST: Lazy<ZobristTable> = Lazy::new(ZobristTable::new);

#[derive(Clone, Debug)]
/// A table of random 64-bit keys used to compute Zobrist hashes.
///
/// `keys[kind + 6 * color][square]` gives the key for a piece of that kind
/// and color sitting on that square. `keys[12][color as usize]` is the side
/// to move key (XORed in whenever it is that color's turn). `keys[13][0..4]`
/// holds one key per castling-right bit. `keys[14][file]` holds one key per
/// en-passant file.
pub struct ZobristTable {
    keys: [[u64; 64]; 15],
}

impl ZobristTable {
    fn new() -> ZobristTable {
        let rng = fastrand::Rng::with_seed(ZOBRIST_SEED);
        let mut keys = [[0u64; 64]; 15];
        for row in &mut keys {
            for cell in row.iter_mut() {
                *cell = rng.u64(..);
            }
        }
        ZobristTable { keys }
    }

    #[inline(always)]
    #[must_use]
    /// Get the key for `kind` of `color` sitting on `square_index` (the
    /// square's `u8` discriminant).
    pub fn piece_key(&self, kind: PieceKind, color: Color, square_index: usize) -> u64 {
        self.keys[kind.index() + 6 * color.index()][square_index]
    }

    #[inline(always)]
    #[must_use]
    /// Get the side-to-move key for `color`.
    pub fn side_to_move_key(&self, color: Color) -> u64 {
        self.keys[SIDE_TO_MOVE_ROW][color.index()]
    }

    #[inline(always)]
    #[must_use]
    /// Get the key for castling-right bit `bit` (0..4).
    pub fn castling_key(&self, bit: usize) -> u64 {
        self.keys[CASTLING_ROW][bit]
    }

    #[inline(always)]
    #[must_use]
    /// Get the key for an en-passant target on file `file` (0..8).
    pub fn en_passant_key(&self, file: usize) -> u64 {
        self.keys[EN_PASSANT_ROW][file]
    }
}

/// Compute the full Zobrist key of `pos` from scratch. Always a full
/// recompute (no incremental update) per the module-level note above.
#[must_use]
pub fn hash(pos: &Position) -> u64 {
    let mut h = 0u64;
    for color in [Color::White, Color::Black] {
        for kind in PieceKind::GENERATION_ORDER {
            for sq in pos.pieces(color, kind) {
                h ^= ZOBRIST.piece_key(kind, color, sq as usize);
            }
        }
    }
    h ^= ZOBRIST.side_to_move_key(pos.side_to_move);
    for bit in pos.castling.bits() {
        h ^= ZOBRIST.castling_key(bit);
    }
    if !pos.en_passant_square.is_none() {
        h ^= ZOBRIST.en_passant_key(pos.en_passant_square.file());
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_rows_are_independent() {
        let table = ZobristTable::new();
        assert_ne!(
            table.piece_key(PieceKind::Pawn, Color::White, 0),
            table.piece_key(PieceKind::Pawn, Color::Black, 0)
        );
        assert_ne!(
            table.side_to_move_key(Color::White),
            table.side_to_move_key(Color::Black)
        );
    }

    #[test]
    fn hash_changes_after_a_move() {
        let mut pos = Position::new();
        let before = hash(&pos);
        let m = crate::Move::new(PieceKind::Pawn, crate::Square::E2, crate::Square::E4);
        let undo = pos.make_move(m).unwrap();
        assert_ne!(before, hash(&pos));
        pos.unmake_move(undo);
        assert_eq!(before, hash(&pos));
    }

    #[test]
    fn deterministic_across_instances() {
        let a = ZobristTable::new();
        let b = ZobristTable::new();
        assert_eq!(
            a.piece_key(PieceKind::King, Color::White, 4),
            b.piece_key(PieceKind::King, Color::White, 4)
        );
    }
}
