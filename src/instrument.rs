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

//! The instrument ties the pads, patches, and devices together and is the
//! surface a UI shell talks to.

use std::{
    collections::BTreeMap,
    error::Error,
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{info, warn};

use crate::audio;
use crate::audio::mixer::Mixer;
use crate::pads::{is_pad_note, Debouncer, PadEngine, PadError, DEFAULT_SAMPLE, PAD_NOTES};
use crate::patch::PatchCatalog;
use crate::registry::SampleRegistry;

/// How long a triggered pad stays highlighted, for visual feedback only.
pub const PAD_HIGHLIGHT: Duration = Duration::from_millis(300);

/// An eight-pad drum instrument.
///
/// The audio subsystem starts lazily: the first pad press of a session
/// starts the output device and builds the initial voices, and makes no
/// sound itself. Until then, MIDI triggers are ignored while sound and
/// patch selection still work.
pub struct Instrument {
    engine: PadEngine,
    audio_device: Arc<dyn audio::Device>,
    mixer: Arc<Mixer>,
    registry: Arc<SampleRegistry>,
    patches: PatchCatalog,
    /// The sample selected for each pad, applied to the engine when audio
    /// is running.
    selected: BTreeMap<u8, String>,
    debouncer: Debouncer,
    audio_started: bool,
    /// The most recently triggered pad and when, for the UI highlight.
    active_pad: Option<(u8, Instant)>,
}

impl Instrument {
    /// Creates a new instrument. Every pad starts out assigned the default
    /// sample; no audio runs until the first pad press.
    pub fn new(
        audio_device: Arc<dyn audio::Device>,
        registry: Arc<SampleRegistry>,
        patches: PatchCatalog,
        debounce_window: Duration,
    ) -> Instrument {
        let (mixer, source_tx) = Mixer::new(audio_device.channels(), audio_device.sample_rate());
        let engine = PadEngine::new(registry.clone(), source_tx, audio_device.sample_rate());

        Instrument {
            engine,
            audio_device,
            mixer,
            registry,
            patches,
            selected: PAD_NOTES
                .iter()
                .map(|note| (*note, DEFAULT_SAMPLE.to_string()))
                .collect(),
            debouncer: Debouncer::new(debounce_window),
            audio_started: false,
            active_pad: None,
        }
    }

    /// Handles a pad press from pointer input. The first press of the
    /// session activates audio instead of triggering; presses after that
    /// trigger the pad. Pointer presses are not debounced.
    pub fn pad_pressed(&mut self, note: u8) -> Result<(), Box<dyn Error>> {
        if !is_pad_note(note) {
            return Err(Box::new(PadError::UnknownPad(note)));
        }

        if !self.audio_started {
            return self.start_audio();
        }

        self.engine.trigger(note);
        self.mark_active(note, Instant::now());
        Ok(())
    }

    /// Handles a trigger decoded from MIDI input at the given time.
    /// Triggers for notes outside the pad set, or arriving before audio has
    /// been activated, are ignored; the rest are debounced.
    pub fn midi_trigger(&mut self, note: u8, now: Instant) {
        if !self.audio_started || !is_pad_note(note) {
            return;
        }
        if !self.debouncer.should_accept(note, now) {
            return;
        }

        self.engine.trigger(note);
        self.mark_active(note, now);
    }

    /// Selects a sample for a pad. If audio is running, the pad's voice is
    /// reassigned immediately.
    pub fn select_sound(&mut self, note: u8, sample_name: &str) -> Result<(), PadError> {
        if !is_pad_note(note) {
            return Err(PadError::UnknownPad(note));
        }
        if !self.registry.contains(sample_name) {
            return Err(PadError::UnknownSample(sample_name.to_string()));
        }

        info!(note, sample = sample_name, "Selecting pad sample.");
        self.selected.insert(note, sample_name.to_string());
        if self.audio_started {
            self.engine.assign(note, sample_name)?;
        }
        Ok(())
    }

    /// Selects a patch, replacing every pad's sample at once. If audio is
    /// running, all voices are rebuilt.
    pub fn select_patch(&mut self, name: &str) -> Result<(), PadError> {
        let patch = match self.patches.get(name) {
            Some(patch) => patch.clone(),
            None => return Err(PadError::UnknownPatch(name.to_string())),
        };

        info!(patch = name, "Selecting patch.");
        self.selected = patch.assignments().clone();
        if self.audio_started {
            self.engine.load_patch(&patch);
        }
        Ok(())
    }

    /// The sample currently selected for each pad.
    pub fn selected_sounds(&self) -> &BTreeMap<u8, String> {
        &self.selected
    }

    /// The patch catalog.
    pub fn patches(&self) -> &PatchCatalog {
        &self.patches
    }

    /// The sample registry.
    pub fn registry(&self) -> &SampleRegistry {
        &self.registry
    }

    /// Returns true once the audio subsystem has been activated.
    pub fn audio_started(&self) -> bool {
        self.audio_started
    }

    /// The pad to highlight at the given time, if one was triggered within
    /// the highlight window.
    pub fn active_pad(&self, now: Instant) -> Option<u8> {
        self.active_pad.and_then(|(note, at)| {
            if now.duration_since(at) < PAD_HIGHLIGHT {
                Some(note)
            } else {
                None
            }
        })
    }

    /// Starts the output device and builds the initial voice set from the
    /// current selections. A pad whose sample fails doesn't block the rest.
    fn start_audio(&mut self) -> Result<(), Box<dyn Error>> {
        self.audio_device.start(self.mixer.clone())?;
        self.audio_started = true;

        for (note, sample_name) in self.selected.clone() {
            if let Err(e) = self.engine.assign(note, &sample_name) {
                warn!(
                    note,
                    sample = sample_name,
                    err = e.to_string(),
                    "Unable to assign pad sample."
                );
            }
        }

        info!(device = self.audio_device.name(), "Audio started.");
        Ok(())
    }

    #[cfg(test)]
    /// The pad engine (test only).
    pub fn engine(&self) -> &PadEngine {
        &self.engine
    }

    fn mark_active(&mut self, note: u8, now: Instant) {
        self.active_pad = Some((note, now));
    }
}
