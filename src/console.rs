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

//! The interactive console: a stdin driver that stands in for the pointer
//! side of the pad UI.

use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

const PRESS: &str = "press";
const SOUND: &str = "sound";
const PATCH: &str = "patch";
const SOUNDS: &str = "sounds";
const PADS: &str = "pads";
const QUIT: &str = "quit";

/// An event produced by console input.
#[derive(Debug, PartialEq)]
pub enum Event {
    /// A pad was pressed.
    Press(u8),
    /// A sample was picked for a pad.
    Sound(u8, String),
    /// A patch was picked.
    Patch(String),
    /// List the available samples.
    Sounds,
    /// Show the current pad assignments.
    Pads,
    /// Quit the instrument.
    Quit,
}

/// Reads one command from the reader and sends the resulting event.
/// Unrecognized or malformed input is reported and skipped.
fn monitor_io<R, W>(events_tx: &Sender<Event>, mut reader: R, mut writer: W) -> Result<(), io::Error>
where
    R: io::BufRead,
    W: io::Write,
{
    write!(
        writer,
        "Command ({} <note>, {} <note> <sample>, {} <name>, {}, {}, {}): ",
        PRESS, SOUND, PATCH, SOUNDS, PADS, QUIT,
    )?;
    writer.flush()?;
    let mut input: String = String::default();
    reader.read_line(&mut input)?;

    let input = input.trim();
    let (command, rest) = match input.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };

    let event = match command.to_lowercase().as_str() {
        PRESS => match rest.parse::<u8>() {
            Ok(note) => Some(Event::Press(note)),
            Err(_) => {
                warn!(input, "Expected a pad note number.");
                None
            }
        },
        SOUND => match rest.split_once(' ') {
            Some((note, sample)) => match note.parse::<u8>() {
                Ok(note) => Some(Event::Sound(note, sample.trim().to_string())),
                Err(_) => {
                    warn!(input, "Expected a pad note number.");
                    None
                }
            },
            None => {
                warn!(input, "Expected a pad note number and a sample name.");
                None
            }
        },
        PATCH if !rest.is_empty() => Some(Event::Patch(rest.to_string())),
        SOUNDS => Some(Event::Sounds),
        PADS => Some(Event::Pads),
        QUIT => Some(Event::Quit),
        _ => {
            warn!(input, "Unrecognized input");
            None
        }
    };

    if let Some(event) = event {
        events_tx
            .blocking_send(event)
            .map_err(|e| io::Error::other(e.to_string()))?;
    }
    Ok(())
}

/// Monitors console input for events until the receiver closes.
pub fn monitor_events(events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
    tokio::task::spawn_blocking(move || {
        let span = span!(Level::INFO, "console driver");
        let _enter = span.enter();

        info!("Console driver started.");

        loop {
            monitor_io(&events_tx, io::stdin().lock(), io::stdout())?;
        }
    })
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader, BufWriter};

    use tokio::sync::mpsc;

    use super::*;

    fn get_event(input: &str) -> Result<Option<Event>, io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        let reader = BufReader::new(input.as_bytes());
        let writer_bytes: Vec<u8> = vec![0; 255];
        let writer = BufWriter::new(writer_bytes);
        monitor_io(&sender, reader, writer)?;

        // Force the sender to close.
        drop(sender);
        Ok(receiver.blocking_recv())
    }

    #[test]
    fn test_console_events() -> Result<(), io::Error> {
        assert_eq!(Event::Press(47), get_event("press 47")?.unwrap());
        assert_eq!(
            Event::Sound(47, "Kick02".to_string()),
            get_event("sound 47 Kick02")?.unwrap()
        );
        // Patch names may contain spaces.
        assert_eq!(
            Event::Patch("Basic Kit".to_string()),
            get_event("patch Basic Kit")?.unwrap()
        );
        assert_eq!(Event::Sounds, get_event("sounds")?.unwrap());
        assert_eq!(Event::Pads, get_event("pads")?.unwrap());
        assert_eq!(Event::Quit, get_event("quit")?.unwrap());
        assert_eq!(None, get_event("unrecognized")?);
        assert_eq!(None, get_event("press notanote")?);
        assert_eq!(None, get_event("sound 47")?);
        assert_eq!(None, get_event("patch")?);
        Ok(())
    }
}
