use crate::error::{FreeUError, FreeUResult};

/// Decoder stages the transform recognizes, widest first.
pub const STAGES_COUNT: usize = 3;

/// Number of per-stage values in the flat serialized form. New fields are
/// appended at the end so older flat lists keep decoding.
pub const STAGE_FIELD_COUNT: usize = 6;

/// Per-stage reweighting parameters. All defaults make the transform the
/// identity function.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub backbone_factor: f64,
    pub skip_factor: f64,
    pub backbone_offset: f64,
    pub backbone_width: f64,
    pub skip_cutoff: f64,
    pub skip_high_end_factor: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            backbone_factor: 1.0,
            skip_factor: 1.0,
            backbone_offset: 0.0,
            backbone_width: 0.5,
            skip_cutoff: 0.0,
            skip_high_end_factor: 1.0,
        }
    }
}

impl StageConfig {
    pub fn with_factors(backbone_factor: f64, skip_factor: f64) -> Self {
        Self {
            backbone_factor,
            skip_factor,
            ..Self::default()
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Ordered flat form used by preset buttons, grid sweeps and infotext.
    pub fn to_flat(&self) -> [f64; STAGE_FIELD_COUNT] {
        [
            self.backbone_factor,
            self.skip_factor,
            self.backbone_offset,
            self.backbone_width,
            self.skip_cutoff,
            self.skip_high_end_factor,
        ]
    }

    /// Decodes a flat value list; missing trailing values keep their
    /// defaults so older serialized forms stay readable.
    pub fn from_flat(values: &[f64]) -> Self {
        let mut cfg = Self::default();
        let mut it = values.iter().copied();
        if let Some(v) = it.next() {
            cfg.backbone_factor = v;
        }
        if let Some(v) = it.next() {
            cfg.skip_factor = v;
        }
        if let Some(v) = it.next() {
            cfg.backbone_offset = v;
        }
        if let Some(v) = it.next() {
            cfg.backbone_width = v;
        }
        if let Some(v) = it.next() {
            cfg.skip_cutoff = v;
        }
        if let Some(v) = it.next() {
            cfg.skip_high_end_factor = v;
        }
        cfg
    }

    pub fn validate(&self) -> FreeUResult<()> {
        for (name, v) in [
            ("backbone_factor", self.backbone_factor),
            ("skip_factor", self.skip_factor),
            ("backbone_offset", self.backbone_offset),
            ("backbone_width", self.backbone_width),
            ("skip_cutoff", self.skip_cutoff),
            ("skip_high_end_factor", self.skip_high_end_factor),
        ] {
            if !v.is_finite() {
                return Err(FreeUError::validation(format!("{name} must be finite")));
            }
        }
        if !(0.0..=1.0).contains(&self.skip_cutoff) {
            return Err(FreeUError::validation("skip_cutoff must be in [0, 1]"));
        }
        Ok(())
    }
}

/// A schedule boundary: either an absolute denoising step or a fraction of
/// the total step count. The two are told apart by whether the serialized
/// value is integral.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum StepValue {
    Step(u32),
    Fraction(f64),
}

impl StepValue {
    /// Parses the textual form used in generation metadata: a value with a
    /// decimal point is a fraction, anything else an absolute step.
    pub fn parse(s: &str) -> FreeUResult<Self> {
        let s = s.trim();
        if s.contains('.') {
            let f: f64 = s
                .parse()
                .map_err(|_| FreeUError::validation(format!("invalid step fraction '{s}'")))?;
            Ok(Self::Fraction(f))
        } else {
            let n: u32 = s
                .parse()
                .map_err(|_| FreeUError::validation(format!("invalid step value '{s}'")))?;
            Ok(Self::Step(n))
        }
    }

    pub fn validate(&self) -> FreeUResult<()> {
        if let Self::Fraction(f) = self {
            if !f.is_finite() {
                return Err(FreeUError::validation("step fraction must be finite"));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for StepValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Step(n) => write!(f, "{n}"),
            // Keep the decimal point so the value re-parses as a fraction.
            Self::Fraction(v) if v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Fraction(v) => write!(f, "{v}"),
        }
    }
}

/// When the effect applies along the sampling trajectory.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub start_ratio: StepValue,
    pub stop_ratio: StepValue,
    /// 0 = hard on/off window, 1 = fully ramped; blended linearly between.
    pub transition_smoothness: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            start_ratio: StepValue::Fraction(0.0),
            stop_ratio: StepValue::Fraction(1.0),
            transition_smoothness: 0.0,
        }
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> FreeUResult<()> {
        self.start_ratio.validate()?;
        self.stop_ratio.validate()?;
        if !self.transition_smoothness.is_finite()
            || !(0.0..=1.0).contains(&self.transition_smoothness)
        {
            return Err(FreeUError::validation(
                "transition_smoothness must be in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// The full per-request configuration snapshot. Built once before a
/// generation request begins and only read afterwards.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    pub enabled: bool,
    #[serde(flatten)]
    pub schedule: ScheduleConfig,
    pub stages: Vec<StageConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: false,
            schedule: ScheduleConfig::default(),
            stages: vec![StageConfig::default(); STAGES_COUNT],
        }
    }
}

impl Settings {
    /// Pads or truncates the stage list to exactly [`STAGES_COUNT`].
    pub fn normalize(&mut self) {
        self.stages.resize(STAGES_COUNT, StageConfig::default());
    }

    pub fn stage(&self, index: usize) -> StageConfig {
        self.stages.get(index).copied().unwrap_or_default()
    }

    /// Decodes stages from one flat value list, [`STAGE_FIELD_COUNT`]
    /// values per stage.
    pub fn stages_from_flat(values: &[f64]) -> Vec<StageConfig> {
        let mut stages: Vec<StageConfig> = values
            .chunks(STAGE_FIELD_COUNT)
            .take(STAGES_COUNT)
            .map(StageConfig::from_flat)
            .collect();
        stages.resize(STAGES_COUNT, StageConfig::default());
        stages
    }

    pub fn stages_to_flat(&self) -> Vec<f64> {
        self.stages.iter().flat_map(|s| s.to_flat()).collect()
    }

    pub fn validate(&self) -> FreeUResult<()> {
        self.schedule.validate()?;
        for stage in &self.stages {
            stage.validate()?;
        }
        Ok(())
    }
}
