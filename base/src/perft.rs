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

//! Perft: counting the leaf nodes of the full game tree to a fixed depth, a
//! correctness check for move generation rather than a search technique in
//! its own right.

use crate::{board::Position, movegen, Move, MoveList};

/// Count the number of leaf positions reachable from `pos` in exactly
/// `depth` plies.
#[must_use]
pub fn perft(pos: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut list = MoveList::new();
    movegen::generate_moves(pos, &mut list);
    let mut total = 0;
    for &m in list.as_slice() {
        let mut child = *pos;
        if child.make_move(m).is_some() {
            total += perft(&child, depth - 1);
        }
    }
    total
}

/// Like [`perft`], but also prints the leaf count contributed by each
/// pseudo-legal root move (a "divide"), which is the standard way of
/// bisecting a move generation bug against a known-good engine.
pub fn perft_divide(pos: &Position, depth: u32) -> u64 {
    let mut list = MoveList::new();
    movegen::generate_moves(pos, &mut list);
    let mut total = 0;
    for &m in list.as_slice() {
        let mut child = *pos;
        if child.make_move(m).is_none() {
            continue;
        }
        let count = if depth == 0 { 1 } else { perft(&child, depth - 1) };
        println!("{}: {count}", format_root_move(m));
        total += count;
    }
    println!();
    println!("Nodes searched: {total}");
    total
}

fn format_root_move(m: Move) -> String {
    m.to_uci()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_perft_one_through_four() {
        let pos = Position::new();
        assert_eq!(perft(&pos, 1), 20);
        assert_eq!(perft(&pos, 2), 400);
        assert_eq!(perft(&pos, 3), 8_902);
        assert_eq!(perft(&pos, 4), 197_281);
    }

    #[test]
    fn kiwipete_perft_one_through_three() {
        let pos = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        assert_eq!(perft(&pos, 1), 48);
        assert_eq!(perft(&pos, 2), 2_039);
        assert_eq!(perft(&pos, 3), 97_862);
    }
}
