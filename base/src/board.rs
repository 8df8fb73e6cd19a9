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

//! `Position`: the bitboard representation of a single chess position, plus
//! FEN loading/printing and make/unmake.

use std::{convert::TryFrom, fmt};

use crate::{
    castling::CastleRights, movegen, zobrist, Bitboard, Color, Move, PieceKind, Square,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// A snapshot of everything in `Position` that make/unmake must restore other
/// than the piece bitboards themselves.
struct PositionState {
    side_to_move: Color,
    castling: CastleRights,
    half_move_clock: u16,
    en_passant_square: Square,
    move_count: u16,
}

#[derive(Clone, Copy, Debug)]
/// The record `make_move` returns, which must be handed back to
/// `unmake_move` to reverse the move. Opaque to callers by convention: its
/// only use is being threaded from `make_move` to `unmake_move`.
pub struct UndoRecord {
    mv: Move,
    captured: Option<PieceKind>,
    state: PositionState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// A chess position: piece placement plus the side-to-move/castling/en
/// passant/clock state needed to make and unmake moves and to round-trip a
/// FEN. Does not track game history (no repetition detection; see
/// `spec.md` Non-goals).
pub struct Position {
    /// `boards[color][kind]` is the set of squares held by that color's
    /// pieces of that kind.
    boards: [[Bitboard; PieceKind::NUM_TYPES]; 2],
    /// `occupancy[color]` is the union of `boards[color]`.
    occupancy: [Bitboard; 2],
    /// The side whose turn it is to move.
    pub side_to_move: Color,
    /// The castling rights still available to either side.
    pub castling: CastleRights,
    /// Half-move clock since the last pawn move or capture. Tracked for FEN
    /// round-tripping; not consulted by search (`spec.md` Non-goals).
    pub half_move_clock: u16,
    /// The square a capturing pawn would move into, or `Square::None`.
    pub en_passant_square: Square,
    /// The full-move counter, incremented after Black moves.
    pub move_count: u16,
}

impl Position {
    #[must_use]
    /// The standard chess starting position.
    pub fn new() -> Position {
        Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("the starting FEN is always valid")
    }

    /// Parse a `Position` from a FEN string (`spec.md` §6).
    ///
    /// # Errors
    /// Returns `Err` describing the problem if `fen` is malformed. Per
    /// `spec.md` §7 this is a recoverable input error: callers should log it
    /// and leave any prior position untouched rather than propagating a
    /// panic.
    pub fn from_fen(fen: &str) -> Result<Position, String> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or("FEN is missing piece placement")?;
        let side_chr = fields.next().ok_or("FEN is missing side to move")?;
        let castling_chr = fields.next().unwrap_or("-");
        let ep_chr = fields.next().unwrap_or("-");
        let half_clock: u16 = fields.next().unwrap_or("0").parse().unwrap_or(0);
        let move_count: u16 = fields.next().unwrap_or("1").parse().unwrap_or(1);

        let mut boards = [[Bitboard::EMPTY; PieceKind::NUM_TYPES]; 2];
        let mut rank = 7i32;
        let mut file = 0usize;
        for row in placement.split('/') {
            if rank < 0 {
                return Err("FEN board has too many ranks".into());
            }
            file = 0;
            for c in row.chars() {
                if let Some(n) = c.to_digit(10) {
                    file += n as usize;
                    continue;
                }
                let color = if c.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                let kind = PieceKind::from_code(c).ok_or("unrecognized piece letter in FEN")?;
                if file >= 8 {
                    return Err("FEN row overflows the board".into());
                }
                let sq = Square::new(rank as usize, file).ok_or("square out of range in FEN")?;
                boards[color.index()][kind.index()].insert(sq);
                file += 1;
            }
            rank -= 1;
        }

        let side_to_move = match side_chr {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err("unrecognized side-to-move letter in FEN".into()),
        };

        let mut castling = CastleRights::NONE;
        if castling_chr != "-" {
            for c in castling_chr.chars() {
                castling |= match c {
                    'K' => CastleRights::king_side(Color::White),
                    'Q' => CastleRights::queen_side(Color::White),
                    'k' => CastleRights::king_side(Color::Black),
                    'q' => CastleRights::queen_side(Color::Black),
                    _ => return Err("unrecognized castling letter in FEN".into()),
                };
            }
        }

        let en_passant_square = if ep_chr == "-" {
            Square::None
        } else {
            Square::from_algebraic(ep_chr)?
        };

        let mut occupancy = [Bitboard::EMPTY; 2];
        for color in [Color::White, Color::Black] {
            for kind in PieceKind::GENERATION_ORDER {
                occupancy[color.index()] |= boards[color.index()][kind.index()];
            }
        }

        Ok(Position {
            boards,
            occupancy,
            side_to_move,
            castling,
            half_move_clock: half_clock,
            en_passant_square,
            move_count,
        })
    }

    #[must_use]
    /// Write this position back out as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut s = String::new();
        for rank in (0..8).rev() {
            let mut empties = 0;
            for file in 0..8 {
                let sq = Square::new(rank, file).unwrap();
                match self.piece_at(sq) {
                    Some((color, kind)) => {
                        if empties > 0 {
                            s.push_str(&empties.to_string());
                            empties = 0;
                        }
                        let c = kind.code();
                        s.push(if color == Color::White {
                            c.to_ascii_uppercase()
                        } else {
                            c
                        });
                    }
                    None => empties += 1,
                }
            }
            if empties > 0 {
                s.push_str(&empties.to_string());
            }
            if rank > 0 {
                s.push('/');
            }
        }
        s.push(' ');
        s.push(if self.side_to_move == Color::White {
            'w'
        } else {
            'b'
        });
        s.push(' ');
        let mut any_right = false;
        for (right, c) in [
            (CastleRights::king_side(Color::White), 'K'),
            (CastleRights::queen_side(Color::White), 'Q'),
            (CastleRights::king_side(Color::Black), 'k'),
            (CastleRights::queen_side(Color::Black), 'q'),
        ] {
            if self.castling & right != CastleRights::NONE {
                s.push(c);
                any_right = true;
            }
        }
        if !any_right {
            s.push('-');
        }
        s.push(' ');
        s.push_str(&self.en_passant_square.to_string());
        s.push(' ');
        s.push_str(&self.half_move_clock.to_string());
        s.push(' ');
        s.push_str(&self.move_count.to_string());
        s
    }

    #[inline(always)]
    #[must_use]
    /// The squares held by `color`'s pieces of kind `kind`.
    pub fn pieces(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.boards[color.index()][kind.index()]
    }

    #[inline(always)]
    #[must_use]
    /// The union of all of `color`'s pieces.
    pub fn occupancy(&self, color: Color) -> Bitboard {
        self.occupancy[color.index()]
    }

    #[inline(always)]
    #[must_use]
    /// The union of every occupied square, regardless of color.
    pub fn all_occupancy(&self) -> Bitboard {
        self.occupancy[0] | self.occupancy[1]
    }

    #[must_use]
    /// The color and kind of piece occupying `sq`, if any.
    pub fn piece_at(&self, sq: Square) -> Option<(Color, PieceKind)> {
        for color in [Color::White, Color::Black] {
            if !self.occupancy[color.index()].contains(sq) {
                continue;
            }
            for kind in PieceKind::GENERATION_ORDER {
                if self.boards[color.index()][kind.index()].contains(sq) {
                    return Some((color, kind));
                }
            }
        }
        None
    }

    #[must_use]
    /// The 64-bit Zobrist key of this position, recomputed from scratch.
    pub fn zobrist_key(&self) -> u64 {
        zobrist::hash(self)
    }

    /// Apply `m`, assumed pseudo-legal, to this position.
    ///
    /// Returns `None` if the move turned out to leave the mover's own king
    /// attacked, in which case the position has already been restored to
    /// what it was before this call (`spec.md` §4.3 step 13). Returns
    /// `Some(undo)` on a legal move; `undo` must be passed to
    /// [`Position::unmake_move`] to reverse it.
    pub fn make_move(&mut self, m: Move) -> Option<UndoRecord> {
        let us = self.side_to_move;
        let them = !us;
        let state = PositionState {
            side_to_move: us,
            castling: self.castling,
            half_move_clock: self.half_move_clock,
            en_passant_square: self.en_passant_square,
            move_count: self.move_count,
        };
        let mut captured = None;

        let from_bb = Bitboard::from(m.from);
        let to_bb = Bitboard::from(m.to);
        let from_to = from_bb | to_bb;

        // 2. move the piece
        self.boards[us.index()][m.piece.index()] ^= from_to;
        self.occupancy[us.index()] ^= from_to;

        // 3.
        self.half_move_clock += 1;

        // 4. capture
        if self.occupancy[them.index()].contains(m.to) {
            let cap_kind = PieceKind::GENERATION_ORDER
                .into_iter()
                .find(|&k| self.boards[them.index()][k.index()].contains(m.to))
                .expect("an occupied enemy square must hold some piece kind");
            self.boards[them.index()][cap_kind.index()] &= !to_bb;
            self.occupancy[them.index()] &= !to_bb;
            captured = Some(cap_kind);
            self.half_move_clock = 0;
        }

        // 5. legality mask (castling start + transit squares)
        let is_castle = m.is_castle();
        let mut legality_mask = Bitboard::EMPTY;
        if is_castle {
            legality_mask.insert(m.from);
            let transit_file = (m.from.file() + m.to.file()) / 2;
            legality_mask.insert(Square::new(m.from.rank(), transit_file).unwrap());
        }

        // 6. en passant capture
        let is_ep_capture =
            m.piece == PieceKind::Pawn && !state.en_passant_square.is_none() && m.to == state.en_passant_square;
        if is_ep_capture {
            let cap_sq = Square::new(m.from.rank(), m.to.file()).unwrap();
            let cap_bb = Bitboard::from(cap_sq);
            self.boards[them.index()][PieceKind::Pawn.index()] &= !cap_bb;
            self.occupancy[them.index()] &= !cap_bb;
            captured = Some(PieceKind::Pawn);
        }

        // 7. en passant square bookkeeping
        self.en_passant_square = Square::None;
        if m.piece == PieceKind::Pawn && m.from.chebyshev_to(m.to) == 2 {
            let mid_rank = (m.from.rank() + m.to.rank()) / 2;
            self.en_passant_square = Square::new(mid_rank, m.from.file()).unwrap();
        }

        // 8. pawn-move clock reset + promotion
        if m.piece == PieceKind::Pawn {
            self.half_move_clock = 0;
            if let Some(promo) = m.promotion {
                self.boards[us.index()][PieceKind::Pawn.index()] &= !to_bb;
                self.boards[us.index()][promo.index()] |= to_bb;
            }
        }

        // 9. castling rook move + rights
        if is_castle {
            let (rook_from_file, rook_to_file) = if m.to.file() == 6 { (7, 5) } else { (0, 3) };
            let rook_from = Square::new(m.from.rank(), rook_from_file).unwrap();
            let rook_to = Square::new(m.from.rank(), rook_to_file).unwrap();
            let rook_mask = Bitboard::from(rook_from) | Bitboard::from(rook_to);
            self.boards[us.index()][PieceKind::Rook.index()] ^= rook_mask;
            self.occupancy[us.index()] ^= rook_mask;
            self.castling &= !CastleRights::for_color(us);
        }

        // 10. corner squares disable rook-side rights
        for (sq, right) in [
            (Square::A1, CastleRights::queen_side(Color::White)),
            (Square::H1, CastleRights::king_side(Color::White)),
            (Square::A8, CastleRights::queen_side(Color::Black)),
            (Square::H8, CastleRights::king_side(Color::Black)),
        ] {
            if m.from == sq || m.to == sq {
                self.castling &= !right;
            }
        }

        // 11. the moving side's king also guards the legality mask
        legality_mask |= self.boards[us.index()][PieceKind::King.index()];

        // 12. flip side to move; bump the full-move counter after Black
        self.side_to_move = them;
        if us == Color::Black {
            self.move_count += 1;
        }

        // 13. legality check
        let undo = UndoRecord {
            mv: m,
            captured,
            state,
        };
        if !(movegen::attacks_of(self, self.side_to_move) & legality_mask).is_empty() {
            self.unmake_move(undo);
            return None;
        }
        Some(undo)
    }

    /// Reverse a move previously made with [`Position::make_move`].
    pub fn unmake_move(&mut self, undo: UndoRecord) {
        let m = undo.mv;
        let us = undo.state.side_to_move;
        let them = !us;
        let from_bb = Bitboard::from(m.from);
        let to_bb = Bitboard::from(m.to);

        // reverse promotion before reversing the from/to move itself
        if let Some(promo) = m.promotion {
            self.boards[us.index()][promo.index()] &= !to_bb;
            self.boards[us.index()][m.piece.index()] |= to_bb;
        }

        // reverse castling rook move
        if m.is_castle() {
            let (rook_from_file, rook_to_file) = if m.to.file() == 6 { (7, 5) } else { (0, 3) };
            let rook_from = Square::new(m.from.rank(), rook_from_file).unwrap();
            let rook_to = Square::new(m.from.rank(), rook_to_file).unwrap();
            let rook_mask = Bitboard::from(rook_from) | Bitboard::from(rook_to);
            self.boards[us.index()][PieceKind::Rook.index()] ^= rook_mask;
            self.occupancy[us.index()] ^= rook_mask;
        }

        // reverse en passant capture, or a normal capture
        let is_ep_capture = m.piece == PieceKind::Pawn
            && !undo.state.en_passant_square.is_none()
            && m.to == undo.state.en_passant_square;
        if is_ep_capture {
            let cap_sq = Square::new(m.from.rank(), m.to.file()).unwrap();
            let cap_bb = Bitboard::from(cap_sq);
            self.boards[them.index()][PieceKind::Pawn.index()] |= cap_bb;
            self.occupancy[them.index()] |= cap_bb;
        } else if let Some(cap_kind) = undo.captured {
            self.boards[them.index()][cap_kind.index()] |= to_bb;
            self.occupancy[them.index()] |= to_bb;
        }

        // reverse the primary from/to move
        let from_to = from_bb | to_bb;
        self.boards[us.index()][m.piece.index()] ^= from_to;
        self.occupancy[us.index()] ^= from_to;

        self.side_to_move = undo.state.side_to_move;
        self.castling = undo.state.castling;
        self.half_move_clock = undo.state.half_move_clock;
        self.en_passant_square = undo.state.en_passant_square;
        self.move_count = undo.state.move_count;
    }

    #[must_use]
    /// Do the board's bitboard invariants (`spec.md` §8) all hold?
    pub fn is_valid(&self) -> bool {
        let mut seen = Bitboard::EMPTY;
        for color in [Color::White, Color::Black] {
            let mut union = Bitboard::EMPTY;
            for kind in PieceKind::GENERATION_ORDER {
                let bb = self.boards[color.index()][kind.index()];
                if !(bb & union).is_empty() {
                    return false;
                }
                union |= bb;
            }
            if union != self.occupancy[color.index()] {
                return false;
            }
            if !(union & seen).is_empty() {
                return false;
            }
            seen |= union;
            if self.boards[color.index()][PieceKind::King.index()].len() != 1 {
                return false;
            }
        }
        true
    }
}

impl Default for Position {
    fn default() -> Position {
        Position::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let sq = Square::new(rank, file).unwrap();
                match self.piece_at(sq) {
                    Some((Color::White, kind)) => write!(f, "{} ", kind.code().to_ascii_uppercase())?,
                    Some((Color::Black, kind)) => write!(f, "{} ", kind.code())?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl TryFrom<&str> for Position {
    type Error = String;
    fn try_from(fen: &str) -> Result<Position, String> {
        Position::from_fen(fen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_matches_fen() {
        let fen = Position::new();
        let parsed =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        assert_eq!(fen, parsed);
        assert!(fen.is_valid());
    }

    #[test]
    fn fen_roundtrip() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn make_unmake_restores_state() {
        let mut pos = Position::new();
        let before = pos;
        let m = Move::new(PieceKind::Pawn, Square::E2, Square::E4);
        let undo = pos.make_move(m).expect("e4 is legal from the start");
        assert_eq!(pos.en_passant_square, Square::E3);
        pos.unmake_move(undo);
        assert_eq!(pos, before);
    }

    #[test]
    fn en_passant_capture_round_trips() {
        // 1. e4 e6 2. e5 d5, exd6 en passant is now available for White.
        let mut pos = Position::from_fen(
            "rnbqkbnr/ppp1pppp/4p3/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        )
        .unwrap();
        let before = pos;
        let m = Move::new(PieceKind::Pawn, Square::E5, Square::D6);
        let undo = pos.make_move(m).expect("en passant capture is legal here");
        assert!(pos.piece_at(Square::D5).is_none());
        pos.unmake_move(undo);
        assert_eq!(pos, before);
    }

    #[test]
    fn castling_round_trips_and_clears_rights() {
        let mut pos =
            Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let before = pos;
        let m = Move::new(PieceKind::King, Square::E1, Square::G1);
        let undo = pos.make_move(m).expect("white may castle kingside here");
        assert_eq!(pos.piece_at(Square::F1), Some((Color::White, PieceKind::Rook)));
        assert!(!pos.castling.can_castle_kingside(Color::White));
        pos.unmake_move(undo);
        assert_eq!(pos, before);
    }

    #[test]
    fn illegal_move_leaves_position_untouched() {
        // The white king may not move into an attacked square.
        let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2r w - - 0 1").unwrap();
        let before = pos;
        let m = Move::new(PieceKind::King, Square::E1, Square::F1);
        assert!(pos.make_move(m).is_none());
        assert_eq!(pos, before);
    }
}
