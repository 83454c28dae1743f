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
    error::Error,
    fmt,
    sync::{Arc, Mutex},
};

use tokio::sync::mpsc::Sender;

/// A mock MIDI input. Feeds raw messages through the same decoding path as
/// the hardware backend.
#[derive(Clone)]
pub struct Input {
    name: String,
    sender: Arc<Mutex<Option<Sender<u8>>>>,
}

impl Input {
    /// Gets the given mock input.
    pub fn get(name: &str) -> Input {
        Input {
            name: name.to_string(),
            sender: Arc::new(Mutex::new(None)),
        }
    }

    #[cfg(test)]
    /// Feeds a raw MIDI message into the watcher, as if it arrived from
    /// hardware. Messages that don't decode to a trigger are dropped.
    pub fn mock_message(&self, raw_event: &[u8]) {
        let sender = self.sender.lock().expect("unable to get sender lock");
        if let (Some(sender), Some(note)) = (sender.as_ref(), super::decode_trigger(raw_event)) {
            sender.try_send(note).expect("trigger channel full");
        }
    }
}

impl super::Input for Input {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn watch_triggers(&self, sender: Sender<u8>) -> Result<(), Box<dyn Error>> {
        let mut watcher = self.sender.lock().expect("unable to get sender lock");
        if watcher.is_some() {
            return Err("Already watching triggers.".into());
        }

        *watcher = Some(sender);
        Ok(())
    }

    fn stop_watch_triggers(&self) {
        self.sender.lock().expect("unable to get sender lock").take();
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Input>, Box<dyn Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}
