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
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::info;

use super::mixer::Mixer;

/// The channel count mock devices render.
const MOCK_CHANNELS: u16 = 2;

/// The sample rate mock devices render at.
const MOCK_SAMPLE_RATE: u32 = 44100;

/// A mock device. Doesn't produce audible output; tests pull rendered
/// buffers out of it directly.
#[derive(Clone)]
pub struct Device {
    name: String,
    started: Arc<AtomicBool>,
    mixer: Arc<Mutex<Option<Arc<Mixer>>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            started: Arc::new(AtomicBool::new(false)),
            mixer: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns true if the device has been started.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    /// Renders the next `frames` frames from the attached mixer, standing in
    /// for the output stream callback.
    pub fn pull(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; frames * MOCK_CHANNELS as usize];
        if let Some(mixer) = self.mixer.lock().as_ref() {
            mixer.fill(&mut out);
        }
        out
    }

    #[cfg(test)]
    /// Returns the attached mixer, if the device has been started.
    pub fn mixer(&self) -> Option<Arc<Mixer>> {
        self.mixer.lock().clone()
    }
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn channels(&self) -> u16 {
        MOCK_CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        MOCK_SAMPLE_RATE
    }

    fn start(&self, mixer: Arc<Mixer>) -> Result<(), Box<dyn Error>> {
        let mut attached = self.mixer.lock();
        if attached.is_some() {
            return Err("Already started.".into());
        }

        info!(device = self.name, "Output stream started (mock).");
        *attached = Some(mixer);
        self.started.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn stop(&self) {
        self.mixer.lock().take();
        self.started.store(false, Ordering::Relaxed);
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>, Box<dyn Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}
