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

use self::mixer::Mixer;

pub mod cpal;
pub mod mixer;
pub mod mock;
pub mod source;

pub use mixer::{PlaybackSource, SourceSender};

/// An audio output device that renders a mixer.
pub trait Device: fmt::Display + Send + Sync {
    /// Returns the name of the device.
    fn name(&self) -> String;

    /// The number of output channels the device will render.
    fn channels(&self) -> u16;

    /// The sample rate the device will render at.
    fn sample_rate(&self) -> u32;

    /// Starts the output stream, continuously pulling buffers from the given
    /// mixer until stopped. Starting an already started device is an error.
    fn start(&self, mixer: Arc<Mixer>) -> Result<(), Box<dyn Error>>;

    /// Stops the output stream.
    fn stop(&self);

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Device>, Box<dyn Error>>;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets a device with the given name.
pub fn get_device(name: &str) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(name)));
    };

    Ok(Arc::new(cpal::Device::get(name)?))
}

#[cfg(test)]
pub mod test {
    pub use super::mock::Device;
}
