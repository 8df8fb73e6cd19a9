//! The search time budget (`spec.md` §5): a single atomic flag, flipped by a
//! watcher thread once the move-time budget expires. No node counting, no
//! nodes-per-second bookkeeping — `search` reads the flag with acquire
//! ordering at every node and quiescence entry and aborts as soon as it
//! reads `false`.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

/// The shared flag a search reads to learn whether its time budget has
/// expired. `true` means "keep searching."
pub struct SearchLimit {
    searching: AtomicBool,
}

impl SearchLimit {
    #[must_use]
    /// Build a limit in the "not yet searching" state.
    pub const fn new() -> SearchLimit {
        SearchLimit {
            searching: AtomicBool::new(false),
        }
    }

    /// Mark the start of a search and, if `move_time` is given, spawn a
    /// watcher thread that sleeps for that duration and then clears the
    /// flag. Returns the watcher's `JoinHandle`, if one was spawned, so the
    /// caller can join it once the search itself returns (per `spec.md`
    /// §5's "no forcible interrupt": the watcher always runs to completion
    /// even if the search stops early via an explicit `stop`).
    pub fn start(self: &Arc<Self>, move_time: Option<Duration>) -> Option<thread::JoinHandle<()>> {
        self.searching.store(true, Ordering::Release);
        move_time.map(|duration| {
            let limit = Arc::clone(self);
            thread::spawn(move || {
                thread::sleep(duration);
                limit.stop();
            })
        })
    }

    #[inline(always)]
    /// Whether the search should keep going. Read with acquire ordering at
    /// every node and quiescence entry.
    pub fn is_searching(&self) -> bool {
        self.searching.load(Ordering::Acquire)
    }

    /// Clear the flag immediately: either the time budget elapsed, or a UCI
    /// `stop` was received.
    pub fn stop(&self) {
        self.searching.store(false, Ordering::Release);
    }
}

impl Default for SearchLimit {
    fn default() -> SearchLimit {
        SearchLimit::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_limit_is_not_searching() {
        assert!(!SearchLimit::new().is_searching());
    }

    #[test]
    fn start_without_a_move_time_never_stops_on_its_own() {
        let limit = Arc::new(SearchLimit::new());
        let handle = limit.start(None);
        assert!(handle.is_none());
        assert!(limit.is_searching());
        limit.stop();
        assert!(!limit.is_searching());
    }

    #[test]
    fn watcher_stops_the_search_after_its_budget() {
        let limit = Arc::new(SearchLimit::new());
        let handle = limit.start(Some(Duration::from_millis(10)));
        assert!(limit.is_searching());
        handle.unwrap().join().unwrap();
        assert!(!limit.is_searching());
    }
}
