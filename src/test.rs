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

//! End-to-end tests over the mock devices: raw MIDI bytes in, mixed audio
//! out.

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::instrument::Instrument;
use crate::pads::PAD_NOTES;
use crate::testutil::eventually;
use crate::{audio, config, midi};

#[tokio::test(flavor = "multi_thread")]
async fn test_midi_to_audio_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    crate::testutil::factory_fixtures(dir.path());

    let config_path = dir.path().join("octadrum.yaml");
    fs::write(
        &config_path,
        format!(
            "audio_device: mock-output\nsamples: {}\npatch: Basic Kit\n",
            dir.path().display()
        ),
    )
    .expect("write config");

    let mut instrument = config::init_instrument(&config_path).expect("instrument initializes");

    // Wire up a mock MIDI input the way the shell wires hardware ports.
    let midi_input = midi::get_input("mock-pads").expect("mock input");
    let mock_input = midi_input.to_mock().expect("is a mock");
    let (trigger_tx, mut trigger_rx) = tokio::sync::mpsc::channel::<u8>(64);
    midi_input
        .watch_triggers(trigger_tx)
        .expect("watching succeeds");

    // Activate audio with the first pad press and wait for the voices.
    instrument.pad_pressed(47).expect("activation");
    assert!(instrument.audio_started());

    eventually(
        || {
            PAD_NOTES
                .iter()
                .all(|note| instrument.engine().is_ready(*note))
        },
        "pads never loaded",
    );

    // A note-on for pad 47 arrives from the controller.
    mock_input.mock_message(&[0x90, 47, 100]);
    let note = trigger_rx.recv().await.expect("trigger arrives");
    let now = Instant::now();
    instrument.midi_trigger(note, now);
    assert_eq!(instrument.active_pad(now), Some(47));

    // Note-off and zero-velocity note-on never reach the channel.
    mock_input.mock_message(&[0x80, 47, 100]);
    mock_input.mock_message(&[0x90, 47, 0]);
    assert!(trigger_rx.try_recv().is_err());

    midi_input.stop_watch_triggers();
}

#[test]
fn test_instrument_survives_without_midi_or_sound_files() {
    // An empty samples directory means every load fails; the instrument
    // must stay usable (silently) regardless.
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = Arc::new(crate::registry::SampleRegistry::builtin(dir.path()));
    let patches = crate::patch::PatchCatalog::builtin(&registry).expect("factory patches");
    let device = audio::get_device("mock-output").expect("mock device");

    let mut instrument = Instrument::new(device, registry, patches, Duration::from_millis(300));

    instrument.pad_pressed(47).expect("activation");
    eventually(
        || {
            PAD_NOTES
                .iter()
                .all(|note| instrument.engine().is_failed(*note))
        },
        "pads never settled",
    );

    // Triggers and selections all degrade to quiet no-ops.
    instrument.pad_pressed(47).expect("press succeeds");
    instrument.midi_trigger(47, Instant::now());
    instrument
        .select_patch("Percussion")
        .expect("patch selection succeeds");
}
