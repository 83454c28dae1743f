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

//! The pad engine owns one voice slot per pad and coordinates sample
//! loading, triggering, and patch swaps.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use super::loader::SampleLoader;
use super::voice::Voice;
use super::{is_pad_note, PadError, PAD_NOTES};
use crate::audio::{PlaybackSource, SourceSender};
use crate::patch::Patch;
use crate::playsync::StopHandle;
use crate::registry::SampleRegistry;

/// Playback volume for triggered samples.
const PLAYBACK_VOLUME: f32 = 1.0;

/// Global voice generation counter.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::SeqCst)
}

/// The pad engine manages the per-pad voices.
///
/// Every mutation of the voice table happens inside a single lock
/// acquisition, so the stop-then-release-then-rebind sequence of a
/// reassignment can never interleave with a trigger on the same pad.
pub struct PadEngine {
    registry: Arc<SampleRegistry>,
    loader: Arc<Mutex<SampleLoader>>,
    voices: Arc<Mutex<BTreeMap<u8, Voice>>>,
    /// Channel for handing new playback sources to the mixer without
    /// touching the render path's lock.
    source_tx: SourceSender,
}

impl PadEngine {
    /// Creates a new pad engine. Loaded samples are resampled to the given
    /// target rate, which should match the output device.
    pub fn new(
        registry: Arc<SampleRegistry>,
        source_tx: SourceSender,
        target_sample_rate: u32,
    ) -> PadEngine {
        PadEngine {
            registry,
            loader: Arc::new(Mutex::new(SampleLoader::new(target_sample_rate))),
            voices: Arc::new(Mutex::new(BTreeMap::new())),
            source_tx,
        }
    }

    /// Assigns a sample to a pad. Any existing voice for the pad is stopped
    /// and released before the replacement is created; the replacement
    /// becomes playable once its sample data finishes decoding in the
    /// background. Triggers in the meantime are quiet no-ops.
    pub fn assign(&self, note: u8, sample_name: &str) -> Result<(), PadError> {
        if !is_pad_note(note) {
            return Err(PadError::UnknownPad(note));
        }
        let path = self
            .registry
            .resolve(sample_name)
            .ok_or_else(|| PadError::UnknownSample(sample_name.to_string()))?;

        let generation = next_generation();
        {
            let mut voices = self.voices.lock();
            if let Some(mut old) = voices.remove(&note) {
                // The old voice must be fully retired before the new one
                // exists, so the pad never has two live voices.
                old.stop_playback();
                drop(old);
            }
            voices.insert(note, Voice::new(sample_name, generation));
        }

        self.spawn_load(note, generation, path);
        Ok(())
    }

    /// Triggers a pad. A pad with no voice, or whose voice hasn't finished
    /// loading (or failed to), is a no-op. Otherwise any playback still
    /// sounding is stopped before a fresh one starts from frame zero.
    pub fn trigger(&self, note: u8) {
        let mut voices = self.voices.lock();
        let voice = match voices.get_mut(&note) {
            Some(voice) => voice,
            None => return,
        };
        let loaded = match voice.loaded() {
            Some(loaded) => loaded.clone(),
            None => {
                debug!(note, "Pad has no playable sample, ignoring trigger.");
                return;
            }
        };

        voice.stop_playback();

        let stop = StopHandle::new();
        voice.begin_playback(stop.clone());
        if let Err(e) = self.source_tx.send(PlaybackSource::new(
            Box::new(loaded.source(PLAYBACK_VOLUME)),
            stop,
        )) {
            error!(
                note,
                err = e.to_string(),
                "Error sending playback source to mixer."
            );
        }
    }

    /// Loads a patch: every existing voice is retired before any of the new
    /// voices are created, including pads the patch reassigns to the sample
    /// they already had. A pad whose sample can't be resolved or decoded
    /// stays silent without affecting the others.
    pub fn load_patch(&self, patch: &Patch) {
        let mut pending: Vec<(u8, u64, PathBuf)> = Vec::new();

        {
            let mut voices = self.voices.lock();
            for (_, mut voice) in std::mem::take(&mut *voices) {
                voice.stop_playback();
            }

            for note in PAD_NOTES {
                let sample_name = match patch.sample_for(note) {
                    Some(sample_name) => sample_name,
                    None => continue,
                };

                let generation = next_generation();
                let mut voice = Voice::new(sample_name, generation);
                match self.registry.resolve(sample_name) {
                    Some(path) => pending.push((note, generation, path)),
                    None => {
                        warn!(
                            note,
                            sample = sample_name,
                            "Sample not in registry, pad will stay silent."
                        );
                        voice.mark_failed();
                    }
                }
                voices.insert(note, voice);
            }
        }

        for (note, generation, path) in pending {
            self.spawn_load(note, generation, path);
        }
    }

    /// Returns the current pad note to sample-name assignments.
    pub fn assigned_sounds(&self) -> BTreeMap<u8, String> {
        self.voices
            .lock()
            .iter()
            .map(|(note, voice)| (*note, voice.sample_name().to_string()))
            .collect()
    }

    /// Decodes a sample on a background thread and installs it into the
    /// pad's voice slot, unless the slot has moved on to a newer voice by
    /// the time the decode finishes.
    fn spawn_load(&self, note: u8, generation: u64, path: PathBuf) {
        let loader = self.loader.clone();
        let voices = self.voices.clone();

        thread::spawn(move || {
            let result = loader.lock().load(&path);

            let mut voices = voices.lock();
            let voice = match voices.get_mut(&note) {
                Some(voice) if voice.generation() == generation => voice,
                _ => {
                    debug!(note, path = ?path, "Discarding stale sample load.");
                    return;
                }
            };

            match result {
                Ok(loaded) => voice.install(loaded),
                Err(e) => {
                    warn!(
                        note,
                        path = ?path,
                        err = e.to_string(),
                        "Sample failed to load, pad will stay silent."
                    );
                    voice.mark_failed();
                }
            }
        });
    }

    #[cfg(test)]
    /// Installs a ready voice directly, bypassing the loader (test only).
    pub fn install_for_test(
        &self,
        note: u8,
        sample_name: &str,
        loaded: super::loader::LoadedSample,
    ) {
        let mut voices = self.voices.lock();
        if let Some(mut old) = voices.remove(&note) {
            old.stop_playback();
        }
        let mut voice = Voice::new(sample_name, next_generation());
        voice.install(loaded);
        voices.insert(note, voice);
    }

    #[cfg(test)]
    /// Returns true if the pad's voice is playable (test only).
    pub fn is_ready(&self, note: u8) -> bool {
        self.voices
            .lock()
            .get(&note)
            .is_some_and(|voice| voice.loaded().is_some())
    }

    #[cfg(test)]
    /// Returns true if the pad's voice failed to load (test only).
    pub fn is_failed(&self, note: u8) -> bool {
        self.voices
            .lock()
            .get(&note)
            .is_some_and(|voice| voice.is_failed())
    }

    #[cfg(test)]
    /// Returns the loader handle, letting tests hold its lock to delay
    /// background loads (test only).
    pub fn loader_handle(&self) -> Arc<Mutex<SampleLoader>> {
        self.loader.clone()
    }

    #[cfg(test)]
    /// Returns the pad's shared sample data, if loaded (test only).
    pub fn loaded_data(&self, note: u8) -> Option<Arc<Vec<f32>>> {
        self.voices
            .lock()
            .get(&note)
            .and_then(|voice| voice.loaded().map(|loaded| loaded.data()))
    }
}

impl std::fmt::Debug for PadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PadEngine")
            .field("voices", &self.voices.lock().len())
            .field("samples", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::audio::mixer::Mixer;
    use crate::pads::loader::LoadedSample;
    use crate::patch::PatchCatalog;
    use crate::testutil::{eventually, factory_fixtures};

    fn engine_with_fixtures() -> (PadEngine, Arc<Mixer>, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = Arc::new(factory_fixtures(dir.path()));
        let (mixer, source_tx) = Mixer::new(1, 44100);
        (PadEngine::new(registry, source_tx, 44100), mixer, dir)
    }

    fn ramp_sample(len: usize) -> LoadedSample {
        LoadedSample::from_frames((0..len).map(|i| i as f32).collect(), 1, 44100)
    }

    #[test]
    fn test_assign_loads_in_background() {
        let (engine, _mixer, _dir) = engine_with_fixtures();

        engine.assign(47, "Cymbal04").expect("assign succeeds");
        assert_eq!(
            engine.assigned_sounds().get(&47).map(String::as_str),
            Some("Cymbal04")
        );
        eventually(|| engine.is_ready(47), "sample never loaded");
    }

    #[test]
    fn test_assign_rejects_unknown_pads_and_samples() {
        let (engine, _mixer, _dir) = engine_with_fixtures();

        assert!(matches!(
            engine.assign(60, "Kick01"),
            Err(PadError::UnknownPad(60))
        ));
        assert!(matches!(
            engine.assign(47, "NoSuchSample"),
            Err(PadError::UnknownSample(_))
        ));
        assert!(engine.assigned_sounds().is_empty());
    }

    #[test]
    fn test_trigger_without_voice_is_noop() {
        let (engine, mixer, _dir) = engine_with_fixtures();

        engine.trigger(47);

        let mut out = vec![0.0f32; 4];
        mixer.fill(&mut out);
        assert_eq!(out, vec![0.0; 4]);
        assert_eq!(mixer.active_count(), 0);
    }

    #[test]
    fn test_trigger_while_loading_is_noop() {
        let (engine, mixer, _dir) = engine_with_fixtures();

        // Holding the loader lock keeps the background decode from
        // finishing, pinning the voice in its loading state.
        let loader = engine.loader_handle();
        let guard = loader.lock();
        engine.assign(47, "Kick01").expect("assign succeeds");

        engine.trigger(47);
        let mut out = vec![0.0f32; 4];
        mixer.fill(&mut out);
        assert_eq!(mixer.active_count(), 0);

        drop(guard);
        eventually(|| engine.is_ready(47), "sample never loaded");
    }

    #[test]
    fn test_trigger_restarts_from_frame_zero() {
        let (engine, mixer, _dir) = engine_with_fixtures();
        engine.install_for_test(47, "Cymbal04", ramp_sample(64));

        engine.trigger(47);
        let mut out = vec![0.0f32; 2];
        mixer.fill(&mut out);
        assert_eq!(out, vec![0.0, 1.0]);

        // Retriggering stops the old playback and starts over; the two must
        // never layer.
        engine.trigger(47);
        mixer.fill(&mut out);
        assert_eq!(out, vec![0.0, 1.0]);
        assert_eq!(mixer.active_count(), 1);
    }

    #[test]
    fn test_reassign_retires_old_voice() {
        let (engine, mixer, _dir) = engine_with_fixtures();
        engine.install_for_test(47, "Cymbal04", ramp_sample(64));

        engine.trigger(47);
        let mut out = vec![0.0f32; 2];
        mixer.fill(&mut out);
        assert_eq!(mixer.active_count(), 1);

        let old_data = engine.loaded_data(47).expect("voice is loaded");
        engine.assign(47, "Kick02").expect("assign succeeds");

        // The old playback is dropped by the mixer on its next pass, and
        // the old voice's sample data is released.
        mixer.fill(&mut out);
        assert_eq!(out, vec![0.0, 0.0]);
        assert_eq!(mixer.active_count(), 0);
        eventually(
            || Arc::strong_count(&old_data) == 1,
            "old voice data never released",
        );

        assert_eq!(
            engine.assigned_sounds().get(&47).map(String::as_str),
            Some("Kick02")
        );
        eventually(|| engine.is_ready(47), "replacement never loaded");
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let (engine, _mixer, _dir) = engine_with_fixtures();

        let loader = engine.loader_handle();
        let guard = loader.lock();
        engine.assign(47, "Cymbal04").expect("assign succeeds");
        // Reassign while the first decode is still pending; the first
        // decode's completion must not clobber the newer voice.
        engine.assign(47, "Kick02").expect("assign succeeds");
        drop(guard);

        eventually(|| engine.is_ready(47), "sample never loaded");
        assert_eq!(
            engine.assigned_sounds().get(&47).map(String::as_str),
            Some("Kick02")
        );
    }

    #[test]
    fn test_load_patch_round_trips() {
        let (engine, _mixer, dir) = engine_with_fixtures();
        let registry = SampleRegistry::builtin(dir.path());
        let catalog = PatchCatalog::builtin(&registry).expect("factory patches");
        let patch = catalog.get("Basic Kit").expect("patch exists");

        engine.load_patch(patch);

        assert_eq!(&engine.assigned_sounds(), patch.assignments());
        eventually(
            || PAD_NOTES.iter().all(|note| engine.is_ready(*note)),
            "patch samples never loaded",
        );
    }

    #[test]
    fn test_load_patch_retires_all_voices_first() {
        let (engine, mixer, dir) = engine_with_fixtures();
        let registry = SampleRegistry::builtin(dir.path());
        let catalog = PatchCatalog::builtin(&registry).expect("factory patches");

        engine.install_for_test(47, "Cymbal04", ramp_sample(64));
        engine.install_for_test(48, "Kick02", ramp_sample(64));
        engine.trigger(47);
        engine.trigger(48);

        let mut out = vec![0.0f32; 2];
        mixer.fill(&mut out);
        assert_eq!(mixer.active_count(), 2);

        // "Basic Kit" assigns Kick02 to pad 48 again; its voice must be
        // retired all the same.
        engine.load_patch(catalog.get("Basic Kit").expect("patch exists"));
        mixer.fill(&mut out);
        assert_eq!(out, vec![0.0, 0.0]);
        assert_eq!(mixer.active_count(), 0);
    }

    #[test]
    fn test_failed_load_is_isolated_per_pad() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = Arc::new(factory_fixtures(dir.path()));
        // Break exactly one sample of the "Basic Kit" patch.
        let broken = registry.resolve("Cymbal04").expect("sample exists");
        std::fs::remove_file(&broken).expect("remove fixture");

        let (_mixer, source_tx) = Mixer::new(1, 44100);
        let engine = PadEngine::new(registry.clone(), source_tx, 44100);
        let catalog = PatchCatalog::builtin(&registry).expect("factory patches");

        engine.load_patch(catalog.get("Basic Kit").expect("patch exists"));

        eventually(|| engine.is_failed(47), "broken pad never failed");
        eventually(
            || {
                PAD_NOTES
                    .iter()
                    .filter(|note| **note != 47)
                    .all(|note| engine.is_ready(*note))
            },
            "healthy pads never loaded",
        );

        // The failed pad triggers as a quiet no-op.
        engine.trigger(47);
    }
}
