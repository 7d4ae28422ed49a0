//! Parameter-grid sweep overrides.
//!
//! A grid tool sweeps one axis per named parameter. Axis names map to an
//! explicit [`Override`] rather than to attribute strings; stage fields use
//! the historical single-letter shorthand (`b0` = stage 0 backbone factor,
//! `t2` = stage 2 skip cutoff, …). Overrides are applied to a base
//! [`Settings`] once, before a generation request begins.

use crate::{
    config::{STAGES_COUNT, Settings, StageConfig, StepValue},
    error::{FreeUError, FreeUResult},
};

/// One per-stage scalar field, tagged with its shorthand letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageField {
    BackboneFactor,
    SkipFactor,
    BackboneOffset,
    BackboneWidth,
    SkipCutoff,
    SkipHighEndFactor,
}

impl StageField {
    pub const ALL: [StageField; 6] = [
        StageField::BackboneFactor,
        StageField::SkipFactor,
        StageField::BackboneOffset,
        StageField::BackboneWidth,
        StageField::SkipCutoff,
        StageField::SkipHighEndFactor,
    ];

    pub fn shorthand(self) -> char {
        match self {
            Self::BackboneFactor => 'b',
            Self::SkipFactor => 's',
            Self::BackboneOffset => 'o',
            Self::BackboneWidth => 'w',
            Self::SkipCutoff => 't',
            Self::SkipHighEndFactor => 'h',
        }
    }

    pub fn from_shorthand(tag: char) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.shorthand() == tag)
    }

    pub fn set(self, stage: &mut StageConfig, value: f64) {
        match self {
            Self::BackboneFactor => stage.backbone_factor = value,
            Self::SkipFactor => stage.skip_factor = value,
            Self::BackboneOffset => stage.backbone_offset = value,
            Self::BackboneWidth => stage.backbone_width = value,
            Self::SkipCutoff => stage.skip_cutoff = value,
            Self::SkipHighEndFactor => stage.skip_high_end_factor = value,
        }
    }

    pub fn get(self, stage: &StageConfig) -> f64 {
        match self {
            Self::BackboneFactor => stage.backbone_factor,
            Self::SkipFactor => stage.skip_factor,
            Self::BackboneOffset => stage.backbone_offset,
            Self::BackboneWidth => stage.backbone_width,
            Self::SkipCutoff => stage.skip_cutoff,
            Self::SkipHighEndFactor => stage.skip_high_end_factor,
        }
    }
}

/// One grid-axis assignment applied over a base [`Settings`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Override {
    Enabled(bool),
    StartRatio(StepValue),
    StopRatio(StepValue),
    TransitionSmoothness(f64),
    Stage(usize, StageField, f64),
}

impl Override {
    /// Decodes a stage-field shorthand key such as `"b0"` or `"t2"`.
    pub fn parse_shorthand(key: &str, value: f64) -> FreeUResult<Self> {
        let mut chars = key.chars();
        let tag = chars
            .next()
            .and_then(StageField::from_shorthand)
            .ok_or_else(|| FreeUError::validation(format!("unknown shorthand key '{key}'")))?;
        let index: usize = chars
            .as_str()
            .parse()
            .map_err(|_| FreeUError::validation(format!("unknown shorthand key '{key}'")))?;
        if index >= STAGES_COUNT {
            return Err(FreeUError::validation(format!(
                "stage index {index} out of range in '{key}'"
            )));
        }
        Ok(Self::Stage(index, tag, value))
    }

    pub fn apply(&self, settings: &mut Settings) {
        match *self {
            Self::Enabled(v) => settings.enabled = v,
            Self::StartRatio(v) => settings.schedule.start_ratio = v,
            Self::StopRatio(v) => settings.schedule.stop_ratio = v,
            Self::TransitionSmoothness(v) => settings.schedule.transition_smoothness = v,
            Self::Stage(index, field, value) => {
                if settings.stages.len() <= index {
                    settings.normalize();
                }
                if let Some(stage) = settings.stages.get_mut(index) {
                    field.set(stage, value);
                }
            }
        }
    }
}

/// Merges grid overrides into a base configuration. Later overrides win.
pub fn apply_overrides(base: &Settings, overrides: &[Override]) -> Settings {
    let mut settings = base.clone();
    for o in overrides {
        o.apply(&mut settings);
    }
    settings
}
