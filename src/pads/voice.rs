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
use super::loader::LoadedSample;
use crate::playsync::StopHandle;

/// The load state of a voice's sample data.
pub enum LoadState {
    /// The sample is still being decoded; triggers are no-ops.
    Loading,
    /// The sample is ready for playback.
    Ready(LoadedSample),
    /// The sample failed to load; the pad stays silent until reassigned.
    Failed,
}

/// One playback-ready binding of a pad to a sample. A voice is exclusively
/// owned by its pad's slot; replacing the slot retires the voice.
pub struct Voice {
    sample_name: String,
    /// Distinguishes this voice from any earlier or later voice on the same
    /// pad, so a sample decode that finishes late can be discarded.
    generation: u64,
    state: LoadState,
    /// Stop handle for the playback currently sounding, if any.
    playback: Option<StopHandle>,
}

impl Voice {
    /// Creates a new voice awaiting its sample data.
    pub fn new(sample_name: &str, generation: u64) -> Voice {
        Voice {
            sample_name: sample_name.to_string(),
            generation,
            state: LoadState::Loading,
            playback: None,
        }
    }

    /// The sample name this voice is bound to.
    pub fn sample_name(&self) -> &str {
        &self.sample_name
    }

    /// The voice's generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Installs the decoded sample data, making the voice playable.
    pub fn install(&mut self, loaded: LoadedSample) {
        self.state = LoadState::Ready(loaded);
    }

    /// Marks the voice as failed to load.
    pub fn mark_failed(&mut self) {
        self.state = LoadState::Failed;
    }

    /// Returns the loaded sample data, if ready.
    pub fn loaded(&self) -> Option<&LoadedSample> {
        match &self.state {
            LoadState::Ready(loaded) => Some(loaded),
            _ => None,
        }
    }

    /// Returns true if the voice failed to load.
    pub fn is_failed(&self) -> bool {
        matches!(self.state, LoadState::Failed)
    }

    /// Stops the playback currently sounding, if any. Returns true if a
    /// playback was actually stopped; a voice that was never triggered, or
    /// was already stopped, returns false.
    pub fn stop_playback(&mut self) -> bool {
        match self.playback.take() {
            Some(handle) => {
                let was_sounding = !handle.is_stopped();
                handle.stop();
                was_sounding
            }
            None => false,
        }
    }

    /// Records a newly started playback. Any previous playback must have
    /// been stopped first.
    pub fn begin_playback(&mut self, handle: StopHandle) {
        self.playback = Some(handle);
    }
}
