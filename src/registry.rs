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

//! The sample registry: a name to audio file catalog, populated once at
//! startup and immutable afterwards.

use std::{
    collections::BTreeMap,
    error::Error,
    path::{Path, PathBuf},
};

use tracing::info;

/// The factory sample set. Every name is unique; files are resolved
/// relative to the configured samples directory.
const FACTORY_SAMPLES: &[(&str, &str)] = &[
    ("Clap01", "Main_Room_Clap_01.wav"),
    ("Clap02", "Main_Room_Clap_02.wav"),
    ("Clap03", "Main_Room_Clap_03.wav"),
    ("ClosedHat01", "Main_Room_Closed_Hat_01.wav"),
    ("ClosedHat02", "Main_Room_Closed_Hat_02.wav"),
    ("ClosedHat03", "Main_Room_Closed_Hat_03.wav"),
    ("ClosedHat04", "Main_Room_Closed_Hat_04.wav"),
    ("Cymbal01", "Main_Room_Cymbal_01.wav"),
    ("Cymbal02", "Main_Room_Cymbal_02.wav"),
    ("Cymbal03", "Main_Room_Cymbal_03.wav"),
    ("Cymbal04", "Main_Room_Cymbal_04.wav"),
    ("Kick01", "Main_Room_Kick_01.wav"),
    ("Kick02", "Main_Room_Kick_02.wav"),
    ("Kick03", "Main_Room_Kick_03.wav"),
    ("OpenHat01", "Main_Room_Open_Hat_01.wav"),
    ("OpenHat02", "Main_Room_Open_Hat_02.wav"),
    ("OpenHat03", "Main_Room_Open_Hat_03.wav"),
    ("Shaker01", "Main_Room_Shaker_01.wav"),
    ("Shaker02", "Main_Room_Shaker_02.wav"),
    ("Snare01", "Main_Room_Snare_01.wav"),
    ("Snare02", "Main_Room_Snare_02.wav"),
    ("Snare03", "Main_Room_Snare_03.wav"),
    ("StackedHit01", "Main_Room_Stacked_Hit_01.wav"),
    ("StackedHit02", "Main_Room_Stacked_Hit_02.wav"),
    ("StackedHit03", "Main_Room_Stacked_Hit_03.wav"),
    ("Tom1", "Tom1.wav"),
    ("Tom2", "Tom2.wav"),
    ("Tom3", "Tom3.wav"),
    ("Tom4", "Tom4.wav"),
    ("tabla1", "Tabla1.wav"),
    ("tabla2", "Tabla2.wav"),
    ("tabla3", "Tabla3.wav"),
    ("congo1", "Congo1.wav"),
    ("congo2", "Congo2.wav"),
    ("congo3", "Congo3.wav"),
];

/// A catalog of samples by name.
pub struct SampleRegistry {
    /// The directory sample files resolve against.
    root: PathBuf,
    /// Sample file names by sample name.
    entries: BTreeMap<String, String>,
}

impl SampleRegistry {
    /// Creates an empty registry rooted at the given samples directory.
    pub fn empty(root: &Path) -> SampleRegistry {
        SampleRegistry {
            root: root.to_path_buf(),
            entries: BTreeMap::new(),
        }
    }

    /// Creates a registry with the factory sample set, rooted at the given
    /// samples directory.
    pub fn builtin(root: &Path) -> SampleRegistry {
        SampleRegistry {
            root: root.to_path_buf(),
            entries: FACTORY_SAMPLES
                .iter()
                .map(|(name, file)| (name.to_string(), file.to_string()))
                .collect(),
        }
    }

    /// Registers a sample. Names must be unique.
    pub fn insert(&mut self, name: &str, file: &str) -> Result<(), Box<dyn Error>> {
        if self.entries.contains_key(name) {
            return Err(format!("duplicate sample name {}", name).into());
        }

        self.entries.insert(name.to_string(), file.to_string());
        Ok(())
    }

    /// Returns true if the registry contains the given sample name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolves a sample name to its file path.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.entries.get(name).map(|file| {
            if Path::new(file).is_absolute() {
                PathBuf::from(file)
            } else {
                self.root.join(file)
            }
        })
    }

    /// Iterates over all (name, path) entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, PathBuf)> {
        self.entries.keys().map(|name| {
            let path = self
                .resolve(name)
                .expect("registry entry resolves to a path");
            (name.as_str(), path)
        })
    }

    /// Returns all sample names in name order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(|name| name.as_str()).collect()
    }

    /// The number of registered samples.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Verifies that every registered sample file exists on disk. All
    /// missing files are reported together.
    pub fn verify(&self) -> Result<(), Box<dyn Error>> {
        let missing: Vec<String> = self
            .iter()
            .filter(|(_, path)| !path.is_file())
            .map(|(name, path)| format!("{} ({})", name, path.display()))
            .collect();

        if !missing.is_empty() {
            return Err(format!("missing sample files: {}", missing.join(", ")).into());
        }

        info!(samples = self.len(), "All sample files found.");
        Ok(())
    }
}
