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

//! Formatting of outgoing UCI lines (`spec.md` §6).
//!
//! Every function here returns a plain `String` rather than implementing
//! `Display` on some message enum: the narrow set of lines Raven actually
//! sends doesn't earn a type of its own, just a function per line kind.

use raven_base::{Eval, Move};

/// `id name ...` followed by `id author ...`, sent once in response to
/// `uci`, before any `option` lines.
#[must_use]
pub fn id_lines() -> String {
    "id name Raven\nid author The Raven Authors".to_string()
}

/// The `option name Hash type spin ...` line advertising the transposition
/// table size option, in mebibytes.
#[must_use]
pub fn hash_option_line(default_mb: i64, min_mb: i64, max_mb: i64) -> String {
    format!("option name Hash type spin default {default_mb} min {min_mb} max {max_mb}")
}

#[must_use]
pub fn uciok_line() -> &'static str {
    "uciok"
}

#[must_use]
pub fn readyok_line() -> &'static str {
    "readyok"
}

/// One `info depth <D> score (cp <v>|mate <n>) pv <uci>` line, sent at the
/// end of every completed iterative-deepening depth (`spec.md` §6, §9).
#[must_use]
pub fn info_line(depth: u32, eval: Eval, best_move: Move) -> String {
    let score = match eval.moves_to_mate() {
        Some(plies) if eval > Eval::DRAW => format!("mate {plies}"),
        Some(plies) => format!("mate -{plies}"),
        None => format!("cp {}", eval.centipawn_val()),
    };
    format!("info depth {depth} score {score} pv {}", best_move.to_uci())
}

/// The final `bestmove <uci>` line. `Move::NULL` formats as `bestmove 0000`
/// (`spec.md` §7).
#[must_use]
pub fn bestmove_line(best_move: Move) -> String {
    format!("bestmove {}", best_move.to_uci())
}

#[cfg(test)]
mod tests {
    use super::*;
    use raven_base::{PieceKind, Square};

    #[test]
    fn id_lines_name_the_engine() {
        assert_eq!(id_lines(), "id name Raven\nid author The Raven Authors");
    }

    #[test]
    fn hash_option_formats_as_a_spin() {
        assert_eq!(
            hash_option_line(32, 1, 4096),
            "option name Hash type spin default 32 min 1 max 4096"
        );
    }

    #[test]
    fn info_line_reports_centipawns_for_a_normal_score() {
        let m = Move::new(PieceKind::Pawn, Square::E2, Square::E4);
        assert_eq!(
            info_line(4, Eval::pawns(1.5), m),
            "info depth 4 score cp 150 pv e2e4"
        );
    }

    #[test]
    fn info_line_reports_a_positive_mate_score() {
        let m = Move::new(PieceKind::Queen, Square::E7, Square::E8);
        assert_eq!(info_line(3, Eval::mate_in(3), m), "info depth 3 score mate 2 pv e7e8");
    }

    #[test]
    fn info_line_reports_a_negative_mate_score() {
        let m = Move::new(PieceKind::King, Square::E1, Square::D1);
        assert_eq!(
            info_line(3, -Eval::mate_in(4), m),
            "info depth 3 score mate -2 pv e1d1"
        );
    }

    #[test]
    fn bestmove_line_formats_the_null_move_as_zeros() {
        assert_eq!(bestmove_line(Move::NULL), "bestmove 0000");
    }
}
