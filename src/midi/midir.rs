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
use std::{error::Error, fmt, mem, sync::Mutex};

use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use tokio::sync::mpsc::Sender;
use tracing::{debug, error};

const CLIENT_NAME: &str = "octadrum input";

/// A midir-backed MIDI input port.
pub struct Input {
    name: String,
    port: MidiInputPort,
    connection: Box<Mutex<Option<MidiInputConnection<()>>>>,
}

/// Lists all midir input ports as inputs.
pub fn list() -> Result<Vec<Box<dyn super::Input>>, Box<dyn Error>> {
    Ok(list_all()?
        .into_iter()
        .map(|input| Box::new(input) as Box<dyn super::Input>)
        .collect())
}

/// Lists all midir input ports.
pub fn list_all() -> Result<Vec<Input>, Box<dyn Error>> {
    let midi_in = MidiInput::new(CLIENT_NAME)?;
    let mut inputs = Vec::new();

    for port in midi_in.ports() {
        inputs.push(Input {
            name: midi_in.port_name(&port)?,
            port,
            connection: Box::new(Mutex::new(None)),
        });
    }

    Ok(inputs)
}

/// Gets the input with the given port name.
pub fn get(name: &str) -> Result<Input, Box<dyn Error>> {
    for input in list_all()? {
        if input.name == name {
            return Ok(input);
        }
    }

    Err(format!("no MIDI input named {}", name).into())
}

impl super::Input for Input {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn watch_triggers(&self, sender: Sender<u8>) -> Result<(), Box<dyn Error>> {
        let mut connection = self.connection.lock().expect("unable to get lock");
        if connection.is_some() {
            return Err("Already watching triggers.".into());
        }

        let input = MidiInput::new(CLIENT_NAME)?;
        *connection = Some(input.connect(
            &self.port,
            "octadrum trigger watcher",
            move |_, raw_event, _| {
                let note = match super::decode_trigger(raw_event) {
                    Some(note) => note,
                    None => return,
                };

                debug!(note, "Received pad trigger.");
                if let Err(e) = sender.blocking_send(note) {
                    error!(
                        err = format!("{:?}", e),
                        "Error sending pad trigger to receiver."
                    );
                }
            },
            (),
        )?);

        Ok(())
    }

    /// Stops watching triggers.
    fn stop_watch_triggers(&self) {
        // Explicitly drop the connection.
        let connection = self
            .connection
            .lock()
            .expect("error getting mutex")
            .take();

        mem::drop(connection);
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<std::sync::Arc<super::mock::Input>, Box<dyn Error>> {
        Err("not a mock input".into())
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
