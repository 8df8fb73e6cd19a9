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

//! The UCI text-protocol front-end: line parsing and outgoing-message
//! formatting (`spec.md` §6). Commands understood are the ones `spec.md`
//! names: `uci`, `isready`, `ucinewgame`, `position`, `go movetime`, `stop`,
//! `quit`. Everything else is rejected with a parse error for the caller to
//! log and ignore.

pub mod parse;
pub mod send;

pub use parse::UciCommand;
