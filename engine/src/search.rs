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

//! Iterative-deepening negamax search with alpha-beta pruning, a
//! transposition table, Late Move Reductions, and a quiescence extension
//! (`spec.md` §4.6–§4.9).

use std::{
    cmp::Reverse,
    sync::Arc,
    time::{Duration, Instant},
};

use raven_base::{board::Position, movegen, Eval, Move, MoveList, PieceKind};

use crate::{
    evaluate,
    limit::SearchLimit,
    material,
    transposition::{Flag, Probe, TTable},
    uci::send,
};

/// A depth no reachable chess game approaches; bounds iterative deepening
/// when no move-time budget is given so the loop cannot run forever.
const MAX_ROOT_DEPTH: i8 = 64;

/// Search was aborted because the time budget elapsed mid-node
/// (`spec.md` §4.7 step 1, §5). Propagated with `?` up to the caller that
/// can discard the in-progress iteration; never stored in the TT.
#[derive(Debug, Clone, Copy)]
pub struct Aborted;

#[derive(Debug, Clone, Copy)]
/// What the iterative deepening driver settled on before its budget ran
/// out, or before the deepest iteration it managed to complete.
pub struct SearchOutcome {
    /// The best move found, or [`Move::NULL`] if no root move is legal.
    pub best_move: Move,
    /// That move's evaluation, relative to the side to move at the root.
    pub eval: Eval,
    /// The deepest iteration that completed without aborting.
    pub depth: u32,
}

/// The kind of chess piece a captured piece belongs to, if `m` captures one
/// (including en passant, whose victim does not sit on `m.to`).
fn captured_kind(pos: &Position, m: Move) -> Option<PieceKind> {
    if let Some((_, kind)) = pos.piece_at(m.to) {
        Some(kind)
    } else if m.piece == PieceKind::Pawn
        && !pos.en_passant_square.is_none()
        && m.to == pos.en_passant_square
    {
        Some(PieceKind::Pawn)
    } else {
        None
    }
}

#[inline(always)]
fn is_capture(pos: &Position, m: Move) -> bool {
    captured_kind(pos, m).is_some()
}

/// The cheap static-exchange proxy used for move ordering (`spec.md` §4.6):
/// `value(captured) - value(mover)`, or `DRAW` (0) for a quiet move.
fn order_score(pos: &Position, m: Move) -> Eval {
    match captured_kind(pos, m) {
        Some(captured) => material::value(captured) - material::value(m.piece),
        None => Eval::DRAW,
    }
}

/// Order `list` per `spec.md` §4.6: the TT's best move (if it appears in
/// the list) goes first, then the rest descending by [`order_score`].
fn order_moves(pos: &Position, list: &mut MoveList, tt_best: Option<Move>) {
    let mut start = 0;
    if let Some(best) = tt_best {
        if let Some(idx) = list.position(best) {
            list.swap(0, idx);
            start = 1;
        }
    }
    list.as_mut_slice()[start..].sort_by_key(|&m| Reverse(order_score(pos, m)));
}

/// `spec.md` §4.7's LMR cutoff: moves ordered at or past this index (when
/// `depth > 2`) are searched one ply shallower than usual.
fn lmr_cutoff(depth: i8, move_count: usize) -> i32 {
    let d = (depth as f64).ln();
    let m = (move_count as f64).ln();
    (0.99 + d * m / 3.14).floor() as i32
}

/// Quiescence search (`spec.md` §4.8): extend only captures and promotions
/// until the position is quiet, with a stand-pat baseline and delta
/// pruning.
fn quiesce(pos: &Position, limit: &SearchLimit, mut alpha: Eval, beta: Eval) -> Result<Eval, Aborted> {
    if !limit.is_searching() {
        return Err(Aborted);
    }
    let stand = evaluate::evaluate(pos);
    if stand >= beta {
        return Ok(stand);
    }
    if stand > alpha {
        alpha = stand;
    }

    let mut list = MoveList::new();
    movegen::generate_moves(pos, &mut list);
    order_moves(pos, &mut list, None);

    for &m in list.as_slice() {
        if m.promotion.is_none() && !is_capture(pos, m) {
            continue;
        }
        let mut child = *pos;
        if child.make_move(m).is_none() {
            continue;
        }
        let delta = if m.promotion.is_some() {
            material::value(PieceKind::Queen) * 2i16
        } else {
            material::value(PieceKind::Queen)
        };
        let score = -quiesce(&child, limit, -beta, -alpha)?;
        if score < alpha - delta {
            return Ok(alpha);
        }
        if score >= beta {
            return Ok(score);
        }
        if score > alpha {
            alpha = score;
        }
    }
    Ok(alpha)
}

/// Negamax with alpha-beta pruning, TT lookup/store, move ordering, and
/// LMR (`spec.md` §4.7). `depth <= 0` tails into [`quiesce`].
fn negamax(
    pos: &Position,
    tt: &mut TTable,
    limit: &SearchLimit,
    depth: i8,
    mut alpha: Eval,
    beta: Eval,
) -> Result<Eval, Aborted> {
    if !limit.is_searching() {
        return Err(Aborted);
    }
    if depth <= 0 {
        return quiesce(pos, limit, alpha, beta);
    }

    let key = pos.zobrist_key();
    let orig_alpha = alpha;
    let tt_best = match tt.probe(key, depth, alpha, beta) {
        Probe::Hit { eval: Some(eval), .. } => return Ok(eval),
        Probe::Hit { best_move, .. } => Some(best_move),
        Probe::Miss { best_move } => best_move,
    };

    let mut list = MoveList::new();
    movegen::generate_moves(pos, &mut list);
    order_moves(pos, &mut list, tt_best);
    let cutoff = lmr_cutoff(depth, list.len());

    let mut best = Eval::MIN;
    let mut best_move = tt_best.unwrap_or(Move::NULL);
    let mut any_legal = false;

    for (i, &m) in list.as_slice().iter().enumerate() {
        let mut child = *pos;
        if child.make_move(m).is_none() {
            continue;
        }
        any_legal = true;

        let reduce = i as i32 >= cutoff && depth > 2;
        let child_depth = depth - if reduce { 2 } else { 1 };
        let score = -negamax(&child, tt, limit, child_depth, -beta, -alpha)?;

        if score > best {
            best = score;
            best_move = m;
        }
        if best > alpha {
            alpha = best;
        }
        if best >= beta {
            break;
        }
    }

    if !any_legal {
        best = if movegen::in_check(pos, pos.side_to_move) {
            -Eval::mate_in(0)
        } else {
            Eval::DRAW
        };
    }
    best = best.step_back();

    let flag = if !any_legal {
        Flag::Exact
    } else if best >= beta {
        Flag::Beta
    } else if best > orig_alpha {
        Flag::Exact
    } else {
        Flag::Alpha
    };
    tt.store(key, best, depth, flag, best_move);
    Ok(best)
}

/// Drive iterative deepening from `pos` until the time budget (if any)
/// elapses or a `stop` arrives, printing one `info` line per completed
/// depth and a final `bestmove` line (`spec.md` §4.9, §6).
pub fn iterative_deepening(
    pos: &Position,
    tt: &mut TTable,
    limit: &Arc<SearchLimit>,
    move_time: Option<Duration>,
) -> SearchOutcome {
    let started = Instant::now();
    let watcher = limit.start(move_time);

    let mut root_moves = MoveList::new();
    movegen::generate_moves(pos, &mut root_moves);

    let mut best_overall = Move::NULL;
    let mut eval_overall = Eval::DRAW;
    let mut depth_reached = 0;

    let mut depth: i8 = 1;
    while depth <= MAX_ROOT_DEPTH {
        let tt_best = tt.best_move(pos.zobrist_key());
        let mut ordered = root_moves.clone();
        order_moves(pos, &mut ordered, tt_best);

        let mut depth_best_move = Move::NULL;
        let mut depth_best_eval = Eval::MIN;
        let mut any_legal = false;
        let mut aborted = false;

        for &m in ordered.as_slice() {
            let mut child = *pos;
            if child.make_move(m).is_none() {
                continue;
            }
            any_legal = true;
            match negamax(&child, tt, limit, depth - 1, Eval::MIN, Eval::MAX) {
                Ok(score) => {
                    let score = -score;
                    if score > depth_best_eval {
                        depth_best_eval = score;
                        depth_best_move = m;
                    }
                }
                Err(Aborted) => {
                    aborted = true;
                    break;
                }
            }
        }

        if !any_legal || aborted {
            break;
        }

        best_overall = depth_best_move;
        eval_overall = depth_best_eval;
        depth_reached = depth as u32;
        println!("{}", send::info_line(depth_reached, eval_overall, best_overall));

        if !limit.is_searching() {
            break;
        }
        depth += 1;
    }
    let _ = started.elapsed();

    limit.stop();
    if let Some(handle) = watcher {
        let _ = handle.join();
    }

    println!("{}", send::bestmove_line(best_overall));

    SearchOutcome {
        best_move: best_overall,
        eval: eval_overall,
        depth: depth_reached,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn searching_limit() -> Arc<SearchLimit> {
        let limit = Arc::new(SearchLimit::new());
        limit.start(None);
        limit
    }

    #[test]
    fn quiescence_on_a_quiet_position_matches_evaluate() {
        let pos = Position::new();
        let limit = searching_limit();
        let score = quiesce(&pos, &limit, Eval::MIN, Eval::MAX).unwrap();
        assert_eq!(score, evaluate::evaluate(&pos));
    }

    #[test]
    fn mate_in_one_is_found_and_reported() {
        // White mates immediately with Qe7-e8 or similar; use a textbook
        // mate-in-1 to keep the search shallow enough for a test.
        let pos = Position::from_fen("4k3/4Q3/4K3/8/8/8/8/8 w - - 0 1").unwrap();
        let mut tt = TTable::new(1 << 10);
        let limit = Arc::new(SearchLimit::new());
        let outcome = iterative_deepening(&pos, &mut tt, &limit, Some(Duration::from_millis(200)));
        assert!(outcome.eval.is_mate());
        assert!(outcome.eval > Eval::DRAW);
    }

    #[test]
    fn stalemate_negamax_returns_draw() {
        let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut tt = TTable::new(1 << 10);
        let limit = searching_limit();
        let score = negamax(&pos, &mut tt, &limit, 1, Eval::MIN, Eval::MAX).unwrap();
        assert_eq!(score, Eval::DRAW);
    }

    #[test]
    fn no_legal_root_moves_reports_the_null_move() {
        let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut tt = TTable::new(1 << 10);
        let limit = Arc::new(SearchLimit::new());
        let outcome = iterative_deepening(&pos, &mut tt, &limit, Some(Duration::from_millis(50)));
        assert!(outcome.best_move.is_null());
    }

    #[test]
    fn negamax_aborts_immediately_when_not_searching() {
        // A fresh, never-started limit reads as `searching == false`, so the
        // very first node entry must abort rather than search on.
        let pos = Position::new();
        let limit = SearchLimit::new();
        let mut tt = TTable::new(1 << 10);
        let result = negamax(&pos, &mut tt, &limit, 3, Eval::MIN, Eval::MAX);
        assert!(result.is_err());
    }
}
