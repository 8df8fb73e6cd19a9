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

//! The six kinds of chess piece, independent of color.

use std::{
    convert::TryFrom,
    fmt::{Display, Formatter},
};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A kind of chess piece, independent of the color it belongs to.
///
/// The discriminants below are load-bearing: Zobrist hashing indexes a
/// per-piece table by `kind as usize + 6 * color`, and castling rights are
/// packed as `(kind - KING) + 2 * color` for the king and queen. Do not
/// reorder these without updating both.
pub enum PieceKind {
    King = 0,
    Queen = 1,
    Bishop = 2,
    Knight = 3,
    Rook = 4,
    Pawn = 5,
}

impl PieceKind {
    /// The number of distinct piece kinds.
    pub const NUM_TYPES: usize = 6;

    /// All piece kinds, in the order movegen enumerates them: pawn, queen,
    /// knight, bishop, rook, king.
    pub const GENERATION_ORDER: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Queen,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::King,
    ];

    /// The kinds a pawn may promote to, in the order candidate promotions
    /// should be generated.
    pub const PROMOTE_TYPES: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Knight,
        PieceKind::Rook,
        PieceKind::Bishop,
    ];

    #[inline(always)]
    #[must_use]
    /// Get the zero-based index of this piece kind, used for Zobrist and
    /// material-table lookups.
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    /// Get the FEN character for this piece kind, in its lowercase (black)
    /// form.
    pub const fn code(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Rook => 'r',
            PieceKind::Pawn => 'p',
        }
    }

    #[must_use]
    /// Construct a `PieceKind` from its FEN character, case-insensitively.
    pub fn from_code(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'k' => Some(PieceKind::King),
            'q' => Some(PieceKind::Queen),
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            'r' => Some(PieceKind::Rook),
            'p' => Some(PieceKind::Pawn),
            _ => None,
        }
    }
}

impl TryFrom<u8> for PieceKind {
    type Error = &'static str;
    #[inline(always)]
    fn try_from(x: u8) -> Result<PieceKind, Self::Error> {
        match x {
            0 => Ok(PieceKind::King),
            1 => Ok(PieceKind::Queen),
            2 => Ok(PieceKind::Bishop),
            3 => Ok(PieceKind::Knight),
            4 => Ok(PieceKind::Rook),
            5 => Ok(PieceKind::Pawn),
            _ => Err("input for piece kind conversion is out of bounds"),
        }
    }
}

impl Display for PieceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        for kind in PieceKind::GENERATION_ORDER {
            assert_eq!(PieceKind::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn index_matches_discriminant() {
        assert_eq!(PieceKind::King.index(), 0);
        assert_eq!(PieceKind::Pawn.index(), 5);
    }
}
