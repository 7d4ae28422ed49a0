use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::Context as _;

use crate::{
    config::{ScheduleConfig, Settings, StageConfig},
    error::{FreeUError, FreeUResult},
};

/// A named parameter set: everything in [`Settings`] except the enable flag.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Preset {
    #[serde(flatten)]
    pub schedule: ScheduleConfig,
    pub stages: Vec<StageConfig>,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            stages: Settings::default().stages,
        }
    }
}

impl Preset {
    pub fn from_stages(stages: Vec<StageConfig>) -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            stages,
        }
    }

    /// Resolves the preset into a per-request settings snapshot.
    pub fn settings(&self, enabled: bool) -> Settings {
        let mut settings = Settings {
            enabled,
            schedule: self.schedule,
            stages: self.stages.clone(),
        };
        settings.normalize();
        settings
    }
}

/// The named preset collection: built-in recommendations plus user presets
/// persisted as JSON. Only user presets are ever written back.
#[derive(Clone, Debug, Default)]
pub struct PresetStore {
    presets: BTreeMap<String, Preset>,
}

/// Published FreeU parameter recommendations per base model family.
pub fn built_in_presets() -> BTreeMap<String, Preset> {
    BTreeMap::from([
        (
            "SD1.4 Recommendations".to_string(),
            Preset::from_stages(vec![
                StageConfig::with_factors(1.2, 0.9),
                StageConfig::with_factors(1.4, 0.2),
                StageConfig::with_factors(1.0, 1.0),
            ]),
        ),
        (
            "SD2.1 Recommendations".to_string(),
            Preset::from_stages(vec![
                StageConfig::with_factors(1.1, 0.9),
                StageConfig::with_factors(1.2, 0.2),
                StageConfig::with_factors(1.0, 1.0),
            ]),
        ),
        (
            "SDXL Recommendations".to_string(),
            Preset::from_stages(vec![
                StageConfig::with_factors(1.1, 0.6),
                StageConfig::with_factors(1.2, 0.4),
                StageConfig::with_factors(1.0, 1.0),
            ]),
        ),
    ])
}

impl PresetStore {
    pub fn with_built_ins() -> Self {
        Self {
            presets: built_in_presets(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, preset: Preset) {
        self.presets.insert(name.into(), preset);
    }

    pub fn remove(&mut self, name: &str) -> Option<Preset> {
        self.presets.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Presets not shadowing a built-in; the only part that is persisted.
    pub fn user_presets(&self) -> BTreeMap<String, Preset> {
        let built_in = built_in_presets();
        self.presets
            .iter()
            .filter(|(name, _)| !built_in.contains_key(*name))
            .map(|(name, preset)| (name.clone(), preset.clone()))
            .collect()
    }

    /// Reloads from disk: built-ins, then user presets layered on top.
    /// A missing file leaves only the built-ins.
    pub fn reload(&mut self, path: &Path) -> FreeUResult<()> {
        self.presets = built_in_presets();
        if !path.exists() {
            return Ok(());
        }
        let f = File::open(path).with_context(|| format!("open presets '{}'", path.display()))?;
        let loaded: BTreeMap<String, Preset> = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| FreeUError::serde(format!("parse presets '{}': {e}", path.display())))?;
        tracing::debug!(count = loaded.len(), "loaded user presets");
        self.presets.extend(loaded);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> FreeUResult<()> {
        let f =
            File::create(path).with_context(|| format!("write presets '{}'", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(f), &self.user_presets())
            .map_err(|e| FreeUError::serde(format!("encode presets: {e}")))?;
        Ok(())
    }
}
