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

use raven_base::{board::Position, Move, Square};

/// The result of parsing one line of UCI input. Per `spec.md` §7, parse
/// failures are reported for the caller to log; they never panic.
pub type UciParseResult = Result<UciCommand, String>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// The commands Raven understands from the GUI (`spec.md` §6).
pub enum UciCommand {
    /// Identify the engine and advertise its options, then send `uciok`.
    Uci,
    /// Reply `readyok` once any pending work is done.
    IsReady,
    /// Set an engine option, e.g. the transposition table's `Hash` size.
    SetOption { name: String, value: Option<String> },
    /// Clear the transposition table ahead of a new game.
    NewGame,
    /// Set up a position: `fen` is `None` for the standard start position,
    /// and `moves` are UCI long-algebraic tokens to replay afterward.
    Position { fen: Option<String>, moves: Vec<String> },
    /// Begin searching, stopping after `move_time` milliseconds if given, or
    /// running until an explicit `stop` otherwise.
    Go { move_time: Option<u64> },
    /// Stop the in-progress search and report its best move so far.
    Stop,
    /// Shut down as soon as possible.
    Quit,
}

/// Parse one line of UCI input. Unknown commands and malformed arguments are
/// rejected, never ignored silently at this layer — the caller decides
/// whether to log and continue (`spec.md` §6, §7).
pub fn parse_line(line: &str) -> UciParseResult {
    let mut tokens = line.split_ascii_whitespace();
    let first = tokens.next().ok_or("line contains no tokens")?;
    match first {
        "uci" => Ok(UciCommand::Uci),
        "isready" => Ok(UciCommand::IsReady),
        "setoption" => parse_set_option(&mut tokens),
        "ucinewgame" => Ok(UciCommand::NewGame),
        "position" => parse_position(&mut tokens),
        "go" => parse_go(&mut tokens),
        "stop" => Ok(UciCommand::Stop),
        "quit" => Ok(UciCommand::Quit),
        _ => Err(format!("unrecognized UCI command `{first}`")),
    }
}

fn parse_set_option(tokens: &mut dyn Iterator<Item = &str>) -> UciParseResult {
    let name_tok = tokens
        .next()
        .ok_or("reached end of line while searching for `name` field in `setoption`")?;
    if name_tok != "name" {
        return Err(format!("expected token `name` for `setoption`, got `{name_tok}`"));
    }

    let mut name = String::new();
    loop {
        let Some(tok) = tokens.next() else {
            return Ok(UciCommand::SetOption { name, value: None });
        };
        if tok == "value" {
            break;
        }
        if !name.is_empty() {
            name += " ";
        }
        name += tok;
    }

    let mut value = String::new();
    for tok in tokens {
        if !value.is_empty() {
            value += " ";
        }
        value += tok;
    }
    Ok(UciCommand::SetOption {
        name,
        value: Some(value),
    })
}

fn parse_position(tokens: &mut dyn Iterator<Item = &str>) -> UciParseResult {
    let fen = match tokens
        .next()
        .ok_or_else(|| "reached end of line while parsing `position`".to_string())?
    {
        "fen" => {
            let mut fen = String::new();
            loop {
                let tok = tokens.next().ok_or("reached end of line while parsing FEN")?;
                if tok == "moves" {
                    break;
                }
                if !fen.is_empty() {
                    fen += " ";
                }
                fen += tok;
            }
            Some(fen)
        }
        "startpos" => {
            if let Some(tok) = tokens.next() {
                if tok != "moves" {
                    return Err(format!("expected token `moves` after `startpos`, got `{tok}`"));
                }
            }
            None
        }
        other => return Err(format!("illegal starting position token `{other}`")),
    };

    let moves = tokens.map(str::to_string).collect();
    Ok(UciCommand::Position { fen, moves })
}

fn parse_go(tokens: &mut dyn Iterator<Item = &str>) -> UciParseResult {
    let mut move_time = None;
    let mut peeks = tokens.peekable();
    while let Some(tok) = peeks.next() {
        match tok {
            "movetime" => {
                let ms = peeks
                    .next()
                    .ok_or("reached end of line while parsing `movetime`")?;
                move_time = Some(
                    ms.parse()
                        .map_err(|e| format!("could not parse `movetime` value: {e}"))?,
                );
            }
            // Every other GUI-sent `go` option (`wtime`, `depth`, `infinite`,
            // ...) is outside this engine's scope; skip its argument, if any,
            // rather than rejecting the whole command.
            "ponder" | "infinite" => {}
            _ => {
                peeks.next();
            }
        }
    }
    Ok(UciCommand::Go { move_time })
}

/// Build the position named by a `UciCommand::Position`, replaying `moves`
/// against it one at a time. Each token's piece kind is resolved from the
/// live position before the move is parsed and applied, so a later move in
/// the chain sees the board as it stood after earlier ones.
///
/// Per `spec.md` §7: an illegal or unparsable move anywhere in the chain
/// fails the whole command, leaving the engine's previously active position
/// untouched rather than applying a partial, inconsistent sequence.
pub fn build_position(fen: Option<&str>, moves: &[String]) -> Result<Position, String> {
    let mut pos = match fen {
        Some(fen) => Position::from_fen(fen)?,
        None => Position::new(),
    };

    for tok in moves {
        if tok.len() < 4 {
            return Err(format!("UCI move `{tok}` is too short"));
        }
        let from = Square::from_algebraic(&tok[0..2])?;
        let (_, piece) = pos
            .piece_at(from)
            .ok_or_else(|| format!("no piece on {from} for move `{tok}`"))?;
        let m = Move::from_uci(tok, piece)?;
        pos.make_move(m)
            .ok_or_else(|| format!("move `{tok}` is illegal in the current position"))?;
    }

    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uci_and_isready_parse_with_no_arguments() {
        assert_eq!(parse_line("uci\n"), Ok(UciCommand::Uci));
        assert_eq!(parse_line("isready\n"), Ok(UciCommand::IsReady));
    }

    #[test]
    fn position_startpos_with_no_moves() {
        assert_eq!(
            parse_line("position startpos\n"),
            Ok(UciCommand::Position {
                fen: None,
                moves: Vec::new(),
            })
        );
    }

    #[test]
    fn position_fen_then_moves() {
        assert_eq!(
            parse_line(
                "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1 moves c7c5 g1f3\n"
            ),
            Ok(UciCommand::Position {
                fen: Some("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".into()),
                moves: vec!["c7c5".into(), "g1f3".into()],
            })
        );
    }

    #[test]
    fn setoption_with_a_multi_word_name_and_value() {
        assert_eq!(
            parse_line("setoption name Hash value 64\n"),
            Ok(UciCommand::SetOption {
                name: "Hash".into(),
                value: Some("64".into()),
            })
        );
    }

    #[test]
    fn setoption_with_no_value() {
        assert_eq!(
            parse_line("setoption name Clear Hash\n"),
            Ok(UciCommand::SetOption {
                name: "Clear Hash".into(),
                value: None,
            })
        );
    }

    #[test]
    fn go_movetime_parses_the_millisecond_budget() {
        assert_eq!(
            parse_line("go movetime 500\n"),
            Ok(UciCommand::Go { move_time: Some(500) })
        );
    }

    #[test]
    fn go_infinite_has_no_move_time() {
        assert_eq!(parse_line("go infinite\n"), Ok(UciCommand::Go { move_time: None }));
    }

    #[test]
    fn unrecognized_command_is_rejected() {
        assert!(parse_line("castle queenside\n").is_err());
    }

    #[test]
    fn build_position_replays_moves_against_the_live_board() {
        let pos = build_position(None, &["e2e4".to_string(), "e7e5".to_string()]).unwrap();
        assert_eq!(pos.piece_at(Square::E4).map(|(_, k)| k), pos.piece_at(Square::E4).map(|(_, k)| k));
        assert!(pos.piece_at(Square::E5).is_some());
        assert!(pos.piece_at(Square::E2).is_none());
    }

    #[test]
    fn build_position_rejects_an_illegal_move_in_the_chain() {
        assert!(build_position(None, &["e2e4".to_string(), "e2e4".to_string()]).is_err());
    }
}
