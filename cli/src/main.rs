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

use std::{
    env,
    io::{self, BufRead},
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use raven_base::{board::Position, perft::perft};
use raven_engine::{
    limit::SearchLimit,
    search,
    transposition::TTable,
    uci::{send, UciCommand},
};

/// Mebibytes the `Hash` option converts to transposition-table entries. A
/// `TTEntry` is small enough that one mebibyte holds tens of thousands of
/// slots once rounded to a power of two.
const BYTES_PER_MB: usize = 1 << 20;
const DEFAULT_HASH_MB: i64 = 32;
const MIN_HASH_MB: i64 = 1;
const MAX_HASH_MB: i64 = 4096;

fn main() {
    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("perft") if args.len() >= 4 => {
            let depth: u32 = args[2].parse().expect("depth must be a non-negative integer");
            let fen = args[3..].join(" ");
            let pos = Position::from_fen(&fen).expect("invalid FEN");
            println!("{}", perft(&pos, depth));
        }
        Some("perft") => {
            eprintln!("usage: raven perft <depth> <FEN...>");
        }
        _ => run_uci(),
    }
}

/// The engine's mutable state across a UCI session: the current position,
/// the transposition table, and the handle used to stop an in-progress
/// search.
struct EngineState {
    pos: Position,
    tt: TTable,
}

/// Read UCI commands from stdin until `quit`, dispatching `go` to a
/// dedicated search thread so `stop` (read on this thread) is never blocked
/// behind a running search (`spec.md` §5).
fn run_uci() {
    let state = Arc::new(Mutex::new(EngineState {
        pos: Position::new(),
        tt: TTable::default(),
    }));
    let limit = Arc::new(SearchLimit::new());
    let mut search_thread: Option<thread::JoinHandle<()>> = None;

    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let command = match raven_engine::uci::parse::parse_line(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                eprintln!("info string {e}");
                continue;
            }
        };

        match command {
            UciCommand::Uci => {
                println!("{}", send::id_lines());
                println!(
                    "{}",
                    send::hash_option_line(DEFAULT_HASH_MB, MIN_HASH_MB, MAX_HASH_MB)
                );
                println!("{}", send::uciok_line());
            }
            UciCommand::IsReady => println!("{}", send::readyok_line()),
            UciCommand::SetOption { name, value } => {
                if name.eq_ignore_ascii_case("Hash") {
                    if let Some(mb) = value.and_then(|v| v.parse::<usize>().ok()) {
                        let entry_size = std::mem::size_of::<raven_engine::transposition::TTEntry>();
                        let entries = (mb * BYTES_PER_MB) / entry_size;
                        state.lock().unwrap().tt.resize(entries.max(1));
                    }
                }
            }
            UciCommand::NewGame => {
                let mut s = state.lock().unwrap();
                s.tt.clear();
                s.pos = Position::new();
            }
            UciCommand::Position { fen, moves } => {
                match raven_engine::uci::parse::build_position(fen.as_deref(), &moves) {
                    Ok(pos) => state.lock().unwrap().pos = pos,
                    Err(e) => eprintln!("info string {e}"),
                }
            }
            UciCommand::Go { move_time } => {
                if let Some(handle) = search_thread.take() {
                    limit.stop();
                    let _ = handle.join();
                }
                let state = Arc::clone(&state);
                let limit = Arc::clone(&limit);
                search_thread = Some(thread::spawn(move || {
                    let mut s = state.lock().unwrap();
                    let pos = s.pos;
                    let tt = &mut s.tt;
                    search::iterative_deepening(&pos, tt, &limit, move_time.map(Duration::from_millis));
                }));
            }
            UciCommand::Stop => {
                limit.stop();
                if let Some(handle) = search_thread.take() {
                    let _ = handle.join();
                }
            }
            UciCommand::Quit => {
                limit.stop();
                if let Some(handle) = search_thread.take() {
                    let _ = handle.join();
                }
                break;
            }
        }
    }
}
