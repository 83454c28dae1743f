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
    error::Error,
    path::PathBuf,
    time::Duration,
};

use duration_string::DurationString;
use serde::Deserialize;

use crate::pads::DEFAULT_DEBOUNCE_WINDOW;

/// The audio device used when the configuration doesn't name one.
const DEFAULT_AUDIO_DEVICE: &str = "default";

/// A YAML representation of the instrument configuration.
#[derive(Deserialize, Clone)]
pub struct Instrument {
    /// The audio output device.
    audio_device: Option<String>,

    /// The directory holding the sample files.
    samples: String,

    /// The minimum time between accepted triggers on the same pad.
    debounce: Option<String>,

    /// The patch to select at startup.
    patch: Option<String>,

    /// Additional samples to register, by name.
    extra_samples: Option<HashMap<String, String>>,

    /// Additional patches.
    patches: Option<Vec<Patch>>,
}

impl Instrument {
    /// New will create a new instrument configuration.
    pub fn new(audio_device: Option<String>, samples: &str) -> Instrument {
        Instrument {
            audio_device,
            samples: samples.to_string(),
            debounce: None,
            patch: None,
            extra_samples: None,
            patches: None,
        }
    }

    /// Returns the audio device from the configuration.
    pub fn audio_device(&self) -> String {
        self.audio_device
            .clone()
            .unwrap_or_else(|| DEFAULT_AUDIO_DEVICE.to_string())
    }

    /// Returns the samples directory from the configuration.
    pub fn samples_dir(&self) -> PathBuf {
        PathBuf::from(&self.samples)
    }

    /// Returns the debounce window from the configuration.
    pub fn debounce_window(&self) -> Result<Duration, Box<dyn Error>> {
        match &self.debounce {
            Some(debounce) => Ok(DurationString::from_string(debounce.clone())?.into()),
            None => Ok(DEFAULT_DEBOUNCE_WINDOW),
        }
    }

    /// Returns the startup patch from the configuration.
    pub fn patch(&self) -> Option<&str> {
        self.patch.as_deref()
    }

    /// Returns the additional samples from the configuration.
    pub fn extra_samples(&self) -> HashMap<String, String> {
        self.extra_samples.clone().unwrap_or_default()
    }

    /// Returns the additional patches from the configuration.
    pub fn patches(&self) -> Vec<Patch> {
        self.patches.clone().unwrap_or_default()
    }
}

/// A YAML representation of a patch.
#[derive(Deserialize, Clone)]
pub struct Patch {
    /// The name of the patch.
    name: String,

    /// The sample assigned to each pad note.
    pads: HashMap<u8, String>,
}

impl Patch {
    /// Returns the name of the patch.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pad assignments.
    pub fn pads(&self) -> &HashMap<u8, String> {
        &self.pads
    }
}
