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
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::audio;
use crate::patch::PatchCatalog;
use crate::registry::SampleRegistry;

mod instrument;

pub use instrument::{Instrument, Patch};

/// Parses an instrument configuration from a YAML file.
pub fn load(file: &PathBuf) -> Result<Instrument, Box<dyn Error>> {
    let config: Instrument = serde_yml::from_str(&fs::read_to_string(file)?)
        .map_err(|e| format!("error parsing file {}: {}", file.display(), e))?;
    Ok(config)
}

/// Builds the sample registry from the configuration: the factory set
/// rooted at the configured samples directory, plus any user samples.
pub fn build_registry(config: &Instrument) -> Result<SampleRegistry, Box<dyn Error>> {
    let mut registry = SampleRegistry::builtin(&config.samples_dir());
    for (name, file) in config.extra_samples() {
        registry.insert(&name, &file)?;
    }
    Ok(registry)
}

/// Builds the patch catalog from the configuration: the factory patches
/// plus any user patches, all validated against the registry.
pub fn build_patches(
    config: &Instrument,
    registry: &SampleRegistry,
) -> Result<PatchCatalog, Box<dyn Error>> {
    let mut catalog = PatchCatalog::builtin(registry)?;

    for patch in config.patches() {
        let assignments: BTreeMap<u8, String> = patch.pads().clone().into_iter().collect();
        catalog.add(crate::patch::Patch::new(patch.name(), assignments, registry)?)?;
    }

    Ok(catalog)
}

/// Initializes the instrument from the given config file: registry, patch
/// catalog, audio device, debounce window, and the initial patch selection
/// if one is configured.
pub fn init_instrument(file: &PathBuf) -> Result<crate::instrument::Instrument, Box<dyn Error>> {
    let config = load(file)?;

    let registry = Arc::new(build_registry(&config)?);
    let patches = build_patches(&config, &registry)?;
    let device = audio::get_device(&config.audio_device())?;

    let mut instrument = crate::instrument::Instrument::new(
        device,
        registry,
        patches,
        config.debounce_window()?,
    );

    if let Some(patch) = config.patch() {
        instrument.select_patch(patch)?;
    }

    Ok(instrument)
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("octadrum.yaml");
        let mut file = fs::File::create(&path).expect("create config");
        file.write_all(content.as_bytes()).expect("write config");
        (dir, path)
    }

    #[test]
    fn test_load_full_config() {
        let (_dir, path) = write_config(
            r#"
audio_device: mock-output
samples: /usr/share/octadrum/samples
debounce: 150ms
patch: Electronic
extra_samples:
  MyKick: my_kick.wav
patches:
  - name: My Kit
    pads:
      47: MyKick
      45: Tom1
      36: Tom2
      41: Tom3
      48: Kick02
      38: Snare03
      40: OpenHat01
      43: ClosedHat02
"#,
        );

        let config = load(&path).expect("config parses");
        assert_eq!(config.audio_device(), "mock-output");
        assert_eq!(
            config.samples_dir(),
            PathBuf::from("/usr/share/octadrum/samples")
        );
        assert_eq!(
            config.debounce_window().expect("window parses"),
            std::time::Duration::from_millis(150)
        );
        assert_eq!(config.patch(), Some("Electronic"));

        let registry = build_registry(&config).expect("registry builds");
        assert!(registry.contains("MyKick"));

        let catalog = build_patches(&config, &registry).expect("patches build");
        let custom = catalog.get("My Kit").expect("user patch exists");
        assert_eq!(custom.sample_for(47), Some("MyKick"));
    }

    #[test]
    fn test_defaults() {
        let (_dir, path) = write_config("samples: /samples\n");

        let config = load(&path).expect("config parses");
        assert_eq!(config.audio_device(), "default");
        assert_eq!(
            config.debounce_window().expect("window parses"),
            crate::pads::DEFAULT_DEBOUNCE_WINDOW
        );
        assert_eq!(config.patch(), None);
        assert!(config.extra_samples().is_empty());
        assert!(config.patches().is_empty());
    }

    #[test]
    fn test_invalid_user_patch_is_an_error() {
        let (_dir, path) = write_config(
            r#"
samples: /samples
patches:
  - name: Broken
    pads:
      47: Kick01
"#,
        );

        let config = load(&path).expect("config parses");
        let registry = build_registry(&config).expect("registry builds");
        assert!(build_patches(&config, &registry).is_err());
    }

    #[test]
    fn test_init_instrument_selects_initial_patch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("octadrum.yaml");
        fs::write(
            &config_path,
            format!(
                "audio_device: mock-output\nsamples: {}\npatch: Basic Kit\n",
                dir.path().display()
            ),
        )
        .expect("write config");

        let instrument = init_instrument(&config_path).expect("instrument initializes");
        assert_eq!(
            instrument.selected_sounds().get(&47).map(String::as_str),
            Some("Cymbal04")
        );
        assert!(!instrument.audio_started());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        assert!(load(&PathBuf::from("/nonexistent/octadrum.yaml")).is_err());
    }
}
