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

//! Mixing of active playback sources into the output stream.
//!
//! New sources arrive over a channel that is drained inside the render path,
//! so triggering a pad never contends with the audio callback for a lock.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use super::source::Source;
use crate::playsync::StopHandle;

/// A playback source handed to the mixer, paired with the stop handle the
/// owning voice keeps to cut it off.
pub struct PlaybackSource {
    source: Box<dyn Source>,
    stop: StopHandle,
}

impl PlaybackSource {
    /// Creates a new playback source.
    pub fn new(source: Box<dyn Source>, stop: StopHandle) -> PlaybackSource {
        PlaybackSource { source, stop }
    }
}

/// The sending half used to hand new playback sources to the mixer.
pub type SourceSender = Sender<PlaybackSource>;

/// Mixes all active playback sources into interleaved f32 output buffers.
pub struct Mixer {
    channels: u16,
    sample_rate: u32,
    incoming: Receiver<PlaybackSource>,
    active: Mutex<Vec<PlaybackSource>>,
}

impl Mixer {
    /// Creates a new mixer along with the sender for new playback sources.
    pub fn new(channels: u16, sample_rate: u32) -> (Arc<Mixer>, SourceSender) {
        let (source_tx, incoming) = crossbeam_channel::unbounded();
        (
            Arc::new(Mixer {
                channels,
                sample_rate,
                incoming,
                active: Mutex::new(Vec::new()),
            }),
            source_tx,
        )
    }

    /// The number of output channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// The output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Renders the next buffer of audio: zeroes `out`, adopts any newly
    /// arrived sources, then mixes every active source in. Sources that have
    /// been stopped or that ran out of frames are dropped.
    pub fn fill(&self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = 0.0;
        }

        let mut active = self.active.lock();
        while let Ok(source) = self.incoming.try_recv() {
            active.push(source);
        }

        let frames = out.len() / self.channels as usize;
        active.retain_mut(|playback| {
            if playback.stop.is_stopped() {
                return false;
            }
            playback.source.mix_into(out, self.channels) == frames
        });
    }

    /// The number of sources currently being mixed. Sources queued but not
    /// yet adopted by a fill pass are not counted.
    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}
