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
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SizedSample, StreamConfig};
use parking_lot::Mutex;
use tracing::{error, info};

use super::mixer::Mixer;
use crate::playsync::StopHandle;

/// The name that resolves to the host's default output device.
pub const DEFAULT_DEVICE: &str = "default";

/// A cpal-backed output device.
pub struct Device {
    name: String,
    channels: u16,
    sample_rate: u32,
    sample_format: SampleFormat,
    stop: Mutex<Option<StopHandle>>,
}

impl Device {
    /// Gets the device with the given name. The device's default output
    /// configuration determines channel count, sample rate, and format.
    pub fn get(name: &str) -> Result<Device, Box<dyn Error>> {
        let device = find_output_device(name)?;
        let config = device.default_output_config()?;

        Ok(Device {
            name: name.to_string(),
            channels: config.channels(),
            sample_rate: config.sample_rate(),
            sample_format: config.sample_format(),
            stop: Mutex::new(None),
        })
    }

    /// Lists all output devices known to cpal.
    pub fn list() -> Result<Vec<Box<dyn super::Device>>, Box<dyn Error>> {
        let host = cpal::default_host();
        let mut devices: Vec<Box<dyn super::Device>> = Vec::new();

        for device in host.output_devices()? {
            let name = device.name()?;
            let config = match device.default_output_config() {
                Ok(config) => config,
                // Devices without an output configuration are not usable here.
                Err(_) => continue,
            };

            devices.push(Box::new(Device {
                name,
                channels: config.channels(),
                sample_rate: config.sample_rate(),
                sample_format: config.sample_format(),
                stop: Mutex::new(None),
            }));
        }

        Ok(devices)
    }
}

/// Finds the cpal output device with the given name.
fn find_output_device(name: &str) -> Result<cpal::Device, Box<dyn Error>> {
    let host = cpal::default_host();

    if name == DEFAULT_DEVICE {
        return host
            .default_output_device()
            .ok_or_else(|| "no default output device".into());
    }

    for device in host.output_devices()? {
        if device.name()? == name {
            return Ok(device);
        }
    }

    Err(format!("no output device named {}", name).into())
}

/// Builds an output stream that renders the mixer into buffers of sample
/// type T, converting from the f32 mix buffer.
fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mixer: Arc<Mixer>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            mixer.fill(&mut scratch);
            for (out, mixed) in data.iter_mut().zip(scratch.iter()) {
                *out = T::from_sample(*mixed);
            }
        },
        |err| error!(err = err.to_string(), "Output stream error."),
        None,
    )
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&self, mixer: Arc<Mixer>) -> Result<(), Box<dyn Error>> {
        let mut stop = self.stop.lock();
        if stop.is_some() {
            return Err("Already started.".into());
        }

        let name = self.name.clone();
        let config = StreamConfig {
            channels: self.channels,
            sample_rate: self.sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };
        let sample_format = self.sample_format;

        let handle = StopHandle::new();
        let thread_handle = handle.clone();

        // cpal streams are not Send, so the stream is created and kept alive
        // inside a dedicated thread. Construction errors are reported back
        // through a channel before start returns.
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();
        thread::spawn(move || {
            let device = match find_output_device(&name) {
                Ok(device) => device,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };

            let stream_result = match sample_format {
                SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer),
                SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer),
                SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer),
                other => {
                    let _ = ready_tx.send(Err(format!("unsupported sample format {:?}", other)));
                    return;
                }
            };

            let stream = match stream_result {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }

            info!(device = name, "Output stream started.");
            let _ = ready_tx.send(Ok(()));

            while !thread_handle.is_stopped() {
                thread::sleep(Duration::from_millis(100));
            }

            info!(device = name, "Output stream stopped.");
        });

        ready_rx.recv()??;
        *stop = Some(handle);
        Ok(())
    }

    fn stop(&self) {
        if let Some(handle) = self.stop.lock().take() {
            handle.stop();
        }
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<super::mock::Device>, Box<dyn Error>> {
        Err("not a mock device".into())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (channels: {}, sample rate: {})",
            self.name, self.channels, self.sample_rate
        )
    }
}
