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
    path::Path,
    thread,
    time::{Duration, SystemTime},
};

use crate::registry::SampleRegistry;

/// Wait for the given predicate to return true or fail.
#[inline]
pub fn eventually<F>(predicate: F, error_msg: &str)
where
    F: Fn() -> bool,
{
    let start = SystemTime::now();
    let mut tick = Duration::from_millis(5);
    let timeout = Duration::from_secs(10);
    let max_tick = Duration::from_millis(100);

    loop {
        let elapsed = start.elapsed().expect("system time error");

        if elapsed > timeout {
            panic!("{}", error_msg);
        }
        if predicate() {
            return;
        }

        // Exponential backoff to reduce CPU contention
        thread::sleep(tick);
        tick = std::cmp::min(tick * 2, max_tick);
    }
}

/// Writes a 16-bit PCM wav with the given frames.
pub fn write_wav(path: &Path, frames: &[i16], channels: u16, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for frame in frames {
        writer.write_sample(*frame).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

/// Writes a short wav file for every factory sample into the given
/// directory and returns a registry rooted there. The samples are long
/// enough to still be sounding after a few mixer pulls.
pub fn factory_fixtures(dir: &Path) -> SampleRegistry {
    let registry = SampleRegistry::builtin(dir);
    let frames: Vec<i16> = (0..64).map(|i| (i * 256) as i16).collect();
    for (_, path) in registry.iter() {
        write_wav(&path, &frames, 1, 44100);
    }
    registry
}
