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
use std::{error::Error, fmt, sync::Arc};

use midly::{live::LiveEvent, MidiMessage};
use tokio::sync::mpsc::Sender;
use tracing::{info, warn};

pub mod midir;
pub mod mock;

/// A MIDI input that can watch for pad triggers.
pub trait Input: fmt::Display + Send + Sync {
    /// Returns the name of the input.
    fn name(&self) -> String;

    /// Watches the input for note-on events and sends each decoded note
    /// number to the given sender. Watching an already watched input is an
    /// error.
    fn watch_triggers(&self, sender: Sender<u8>) -> Result<(), Box<dyn Error>>;

    /// Stops watching for triggers.
    fn stop_watch_triggers(&self);

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Input>, Box<dyn Error>>;
}

/// Decodes a raw MIDI message into a pad trigger. Only channel-voice note-on
/// messages with a velocity greater than zero qualify: controllers commonly
/// encode note-off as note-on with velocity 0, which must not trigger.
pub fn decode_trigger(raw: &[u8]) -> Option<u8> {
    match LiveEvent::parse(raw) {
        Ok(LiveEvent::Midi {
            message: MidiMessage::NoteOn { key, vel },
            ..
        }) if vel.as_int() > 0 => Some(key.as_int()),
        _ => None,
    }
}

/// Lists inputs known to midir.
pub fn list_inputs() -> Result<Vec<Box<dyn Input>>, Box<dyn Error>> {
    midir::list()
}

/// Gets an input with the given name.
pub fn get_input(name: &str) -> Result<Arc<dyn Input>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Input::get(name)));
    };

    Ok(Arc::new(midir::get(name)?))
}

/// Subscribes to every available hardware MIDI input, sending decoded pad
/// triggers to the given sender. MIDI being unavailable is not an error: a
/// warning is logged and no inputs are watched, leaving the pads fully
/// usable from pointer input. The returned inputs keep their connections
/// open; dropping them stops the watchers.
pub fn connect_all(sender: Sender<u8>) -> Vec<Arc<dyn Input>> {
    let inputs = match midir::list_all() {
        Ok(inputs) => inputs,
        Err(e) => {
            warn!(
                err = e.to_string(),
                "MIDI is unavailable, pads will only respond to pointer input."
            );
            return Vec::new();
        }
    };

    if inputs.is_empty() {
        warn!("No MIDI inputs detected.");
        return Vec::new();
    }

    let mut watching: Vec<Arc<dyn Input>> = Vec::new();
    for input in inputs {
        if let Err(e) = input.watch_triggers(sender.clone()) {
            warn!(
                input = input.name(),
                err = e.to_string(),
                "Unable to watch MIDI input."
            );
            continue;
        }

        info!(input = input.name(), "Watching MIDI input for triggers.");
        watching.push(Arc::new(input));
    }

    watching
}

#[cfg(test)]
pub mod test {
    pub use super::mock::Input;
}

#[cfg(test)]
mod decode_test {
    use super::decode_trigger;

    #[test]
    fn test_note_on_with_velocity_triggers() {
        assert_eq!(decode_trigger(&[0x90, 47, 100]), Some(47));
        // Any channel qualifies.
        assert_eq!(decode_trigger(&[0x95, 36, 1]), Some(36));
        assert_eq!(decode_trigger(&[0x9F, 43, 127]), Some(43));
    }

    #[test]
    fn test_note_on_with_zero_velocity_is_ignored() {
        // Running-status note-off convention.
        assert_eq!(decode_trigger(&[0x90, 47, 0]), None);
    }

    #[test]
    fn test_other_messages_are_ignored() {
        // Note-off.
        assert_eq!(decode_trigger(&[0x80, 47, 100]), None);
        // Control change.
        assert_eq!(decode_trigger(&[0xB0, 1, 64]), None);
        // Pitch bend.
        assert_eq!(decode_trigger(&[0xE0, 0, 64]), None);
        // Truncated message.
        assert_eq!(decode_trigger(&[0x90, 47]), None);
        assert_eq!(decode_trigger(&[]), None);
    }
}
