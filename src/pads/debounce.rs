// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// The default minimum time between accepted triggers on the same pad.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Suppresses repeated triggers on the same pad inside a short window, to
/// absorb switch bounce and MIDI jitter from hardware controllers.
///
/// Only the most recent accepted timestamp per pad matters, so old entries
/// simply age out and no explicit reset exists.
pub struct Debouncer {
    window: Duration,
    last_accepted: HashMap<u8, Instant>,
}

impl Debouncer {
    /// Creates a debouncer with the given window.
    pub fn new(window: Duration) -> Debouncer {
        Debouncer {
            window,
            last_accepted: HashMap::new(),
        }
    }

    /// Decides whether a trigger on the given pad at the given time should
    /// be accepted. Accepting records the timestamp; rejected triggers are
    /// dropped without side effects.
    pub fn should_accept(&mut self, note: u8, now: Instant) -> bool {
        if let Some(last) = self.last_accepted.get(&note) {
            if now.duration_since(*last) < self.window {
                return false;
            }
        }

        self.last_accepted.insert(note, now);
        true
    }

    /// The configured debounce window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for Debouncer {
    fn default() -> Debouncer {
        Debouncer::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}
