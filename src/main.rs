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
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::{crate_version, Parser, Subcommand};
use tracing::error;

use octadrum::console::{self, Event};
use octadrum::{audio, config, midi};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A MIDI-triggered drum pad instrument."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will start the instrument.
    Start {
        /// The path to the instrument config.
        config_path: String,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the available MIDI input ports.
    MidiDevices {},
    /// Lists the sample registry.
    Samples {
        /// The path to the instrument config.
        #[arg[short, long]]
        config_path: Option<String>,
    },
    /// Lists the patches and their pad assignments.
    Patches {
        /// The path to the instrument config.
        #[arg[short, long]]
        config_path: Option<String>,
    },
    /// Verifies that every registered sample file exists.
    Verify {
        /// The path to the instrument config.
        config_path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config_path } => {
            start(&PathBuf::from(config_path)).await?;
            // The console driver blocks on stdin; exit rather than wait
            // for a read that may never finish.
            std::process::exit(0);
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::MidiDevices {} => {
            let inputs = midi::list_inputs()?;

            if inputs.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for input in inputs {
                println!("- {}", input);
            }
        }
        Commands::Samples { config_path } => {
            let registry = registry_from(config_path)?;

            println!("Samples (count: {}):", registry.len());
            for (name, path) in registry.iter() {
                println!("- {} ({})", name, path.display());
            }
        }
        Commands::Patches { config_path } => {
            let registry = registry_from(config_path.clone())?;
            let catalog = match config_path {
                Some(config_path) => {
                    let config = config::load(&PathBuf::from(config_path))?;
                    config::build_patches(&config, &registry)?
                }
                None => octadrum::patch::PatchCatalog::builtin(&registry)?,
            };

            println!("Patches:");
            for patch in catalog.iter() {
                println!("- {}", patch.name());
                for (note, sample) in patch.assignments() {
                    println!("    {}: {}", note, sample);
                }
            }
        }
        Commands::Verify { config_path } => {
            let config = config::load(&PathBuf::from(config_path))?;
            let registry = config::build_registry(&config)?;
            registry.verify()?;
            println!("All {} sample files found.", registry.len());
        }
    }

    Ok(())
}

/// Builds the registry from the config if one was given, or the factory
/// registry rooted at the working directory otherwise.
fn registry_from(
    config_path: Option<String>,
) -> Result<octadrum::registry::SampleRegistry, Box<dyn Error>> {
    match config_path {
        Some(config_path) => {
            let config = config::load(&PathBuf::from(config_path))?;
            config::build_registry(&config)
        }
        None => Ok(octadrum::registry::SampleRegistry::builtin(
            &PathBuf::from("."),
        )),
    }
}

/// Runs the instrument until the console quits or the process is
/// interrupted.
async fn start(config_path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let mut instrument = config::init_instrument(config_path)?;

    // MIDI being unavailable leaves the console fully usable.
    let (trigger_tx, mut trigger_rx) = tokio::sync::mpsc::channel::<u8>(64);
    let _midi_inputs = midi::connect_all(trigger_tx);

    let (events_tx, mut events_rx) = tokio::sync::mpsc::channel::<Event>(16);
    let _console_handle = console::monitor_events(events_tx);

    println!("Press any pad (e.g. \"press 47\") to start audio.");

    loop {
        tokio::select! {
            Some(note) = trigger_rx.recv() => {
                instrument.midi_trigger(note, Instant::now());
            }
            Some(event) = events_rx.recv() => {
                match event {
                    Event::Press(note) => {
                        if let Err(e) = instrument.pad_pressed(note) {
                            error!(err = e.to_string(), "Unable to press pad.");
                        }
                    }
                    Event::Sound(note, sample) => {
                        if let Err(e) = instrument.select_sound(note, &sample) {
                            error!(err = e.to_string(), "Unable to select sound.");
                        }
                    }
                    Event::Patch(name) => {
                        if let Err(e) = instrument.select_patch(&name) {
                            error!(err = e.to_string(), "Unable to select patch.");
                        }
                    }
                    Event::Sounds => {
                        for name in instrument.registry().names() {
                            println!("- {}", name);
                        }
                    }
                    Event::Pads => {
                        for (note, sample) in instrument.selected_sounds() {
                            println!("- {}: {}", note, sample);
                        }
                    }
                    Event::Quit => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
