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

//! Patches: named presets assigning a sample to every pad at once.

use std::{collections::BTreeMap, error::Error};

use crate::pads::PAD_NOTES;
use crate::registry::SampleRegistry;

/// The factory patches.
const FACTORY_PATCHES: &[(&str, &[(u8, &str)])] = &[
    (
        "Basic Kit",
        &[
            (47, "Cymbal04"),
            (45, "Tom1"),
            (36, "Tom2"),
            (41, "Tom3"),
            (48, "Kick02"),
            (38, "Snare03"),
            (40, "OpenHat01"),
            (43, "ClosedHat02"),
        ],
    ),
    (
        "Electronic",
        &[
            (47, "Kick02"),
            (45, "Snare02"),
            (36, "ClosedHat02"),
            (41, "OpenHat02"),
            (48, "Clap02"),
            (38, "Cymbal02"),
            (40, "StackedHit01"),
            (43, "Shaker02"),
        ],
    ),
    (
        "Percussion",
        &[
            (47, "tabla1"),
            (45, "tabla2"),
            (36, "congo1"),
            (41, "congo2"),
            (48, "Tom2"),
            (38, "Tom3"),
            (40, "Cymbal03"),
            (43, "tabla3"),
        ],
    ),
];

/// A named, immutable assignment of one registered sample to every pad.
#[derive(Clone)]
pub struct Patch {
    name: String,
    assignments: BTreeMap<u8, String>,
}

impl Patch {
    /// Creates a new patch. The assignments must cover the full pad set
    /// exactly, and every sample name must exist in the registry.
    pub fn new(
        name: &str,
        assignments: BTreeMap<u8, String>,
        registry: &SampleRegistry,
    ) -> Result<Patch, Box<dyn Error>> {
        for note in PAD_NOTES {
            if !assignments.contains_key(&note) {
                return Err(format!("patch {} is missing pad note {}", name, note).into());
            }
        }

        for (note, sample) in assignments.iter() {
            if !PAD_NOTES.contains(note) {
                return Err(format!("patch {} assigns unknown pad note {}", name, note).into());
            }
            if !registry.contains(sample) {
                return Err(format!(
                    "patch {} references unknown sample {} for pad note {}",
                    name, sample, note
                )
                .into());
            }
        }

        Ok(Patch {
            name: name.to_string(),
            assignments,
        })
    }

    /// Returns the name of the patch.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sample name assigned to the given pad note.
    pub fn sample_for(&self, note: u8) -> Option<&str> {
        self.assignments.get(&note).map(|sample| sample.as_str())
    }

    /// Returns the full note to sample-name mapping.
    pub fn assignments(&self) -> &BTreeMap<u8, String> {
        &self.assignments
    }
}

/// The catalog of available patches, in presentation order.
pub struct PatchCatalog {
    patches: Vec<Patch>,
}

impl PatchCatalog {
    /// Creates a catalog with the factory patches, validated against the
    /// given registry.
    pub fn builtin(registry: &SampleRegistry) -> Result<PatchCatalog, Box<dyn Error>> {
        let mut catalog = PatchCatalog {
            patches: Vec::new(),
        };

        for (name, assignments) in FACTORY_PATCHES {
            let assignments = assignments
                .iter()
                .map(|(note, sample)| (*note, sample.to_string()))
                .collect();
            catalog.add(Patch::new(name, assignments, registry)?)?;
        }

        Ok(catalog)
    }

    /// Adds a patch to the catalog. Patch names must be unique.
    pub fn add(&mut self, patch: Patch) -> Result<(), Box<dyn Error>> {
        if self.get(patch.name()).is_some() {
            return Err(format!("duplicate patch name {}", patch.name()).into());
        }

        self.patches.push(patch);
        Ok(())
    }

    /// Returns the patch with the given name.
    pub fn get(&self, name: &str) -> Option<&Patch> {
        self.patches.iter().find(|patch| patch.name() == name)
    }

    /// Iterates over all patches in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = &Patch> {
        self.patches.iter()
    }

    /// Returns all patch names in presentation order.
    pub fn names(&self) -> Vec<&str> {
        self.patches.iter().map(|patch| patch.name()).collect()
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;

    fn registry() -> SampleRegistry {
        SampleRegistry::builtin(Path::new("/samples"))
    }

    #[test]
    fn test_factory_patches_validate() {
        let catalog = PatchCatalog::builtin(&registry()).expect("factory patches are valid");
        assert_eq!(catalog.names(), vec!["Basic Kit", "Electronic", "Percussion"]);

        let basic = catalog.get("Basic Kit").expect("patch exists");
        assert_eq!(basic.sample_for(47), Some("Cymbal04"));
        assert_eq!(basic.sample_for(48), Some("Kick02"));
        assert_eq!(basic.assignments().len(), PAD_NOTES.len());
    }

    #[test]
    fn test_patch_must_cover_every_pad() {
        let registry = registry();
        let mut assignments: BTreeMap<u8, String> = PAD_NOTES
            .iter()
            .map(|note| (*note, "Kick01".to_string()))
            .collect();
        assignments.remove(&47);

        assert!(Patch::new("Partial", assignments, &registry).is_err());
    }

    #[test]
    fn test_patch_rejects_unknown_samples_and_pads() {
        let registry = registry();

        let mut assignments: BTreeMap<u8, String> = PAD_NOTES
            .iter()
            .map(|note| (*note, "Kick01".to_string()))
            .collect();
        assignments.insert(47, "NoSuchSample".to_string());
        assert!(Patch::new("BadSample", assignments, &registry).is_err());

        let mut assignments: BTreeMap<u8, String> = PAD_NOTES
            .iter()
            .map(|note| (*note, "Kick01".to_string()))
            .collect();
        assignments.insert(60, "Kick01".to_string());
        assert!(Patch::new("BadPad", assignments, &registry).is_err());
    }

    #[test]
    fn test_duplicate_patch_names_are_rejected() {
        let registry = registry();
        let mut catalog = PatchCatalog::builtin(&registry).expect("factory patches are valid");

        let assignments: BTreeMap<u8, String> = PAD_NOTES
            .iter()
            .map(|note| (*note, "Kick01".to_string()))
            .collect();
        let duplicate =
            Patch::new("Basic Kit", assignments, &registry).expect("patch itself is valid");
        assert!(catalog.add(duplicate).is_err());
    }
}
