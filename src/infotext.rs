//! Generation-metadata text round-trip.
//!
//! The schedule serializes as `"start, stop, smoothness"` and the stages as
//! a JSON array of sparse objects with default-valued fields omitted;
//! trailing all-default stages are stripped. Parsing either string
//! reconstructs an identical configuration.

use serde_json::{Map, Value};

use crate::{
    config::{STAGES_COUNT, ScheduleConfig, StageConfig, StepValue},
    error::{FreeUError, FreeUResult},
};

pub fn schedule_infotext(schedule: &ScheduleConfig) -> String {
    format!(
        "{}, {}, {}",
        schedule.start_ratio, schedule.stop_ratio, schedule.transition_smoothness
    )
}

pub fn parse_schedule_infotext(text: &str) -> FreeUResult<ScheduleConfig> {
    let mut parts = text.split(',').map(str::trim);
    let (Some(start), Some(stop), Some(smoothness)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(FreeUError::serde(format!(
            "schedule infotext needs three values, got '{text}'"
        )));
    };
    Ok(ScheduleConfig {
        start_ratio: StepValue::parse(start)?,
        stop_ratio: StepValue::parse(stop)?,
        transition_smoothness: smoothness
            .parse()
            .map_err(|_| FreeUError::serde(format!("invalid smoothness '{smoothness}'")))?,
    })
}

pub fn stages_infotext(stages: &[StageConfig]) -> String {
    let trailing_defaults = stages.iter().rev().take_while(|s| s.is_default()).count();
    let kept = &stages[..stages.len() - trailing_defaults];
    let values: Vec<Value> = kept.iter().map(sparse_stage).collect();
    Value::Array(values).to_string()
}

pub fn parse_stages_infotext(text: &str) -> FreeUResult<Vec<StageConfig>> {
    let mut stages: Vec<StageConfig> = serde_json::from_str(text)
        .map_err(|e| FreeUError::serde(format!("parse stages infotext: {e}")))?;
    if stages.len() > STAGES_COUNT {
        return Err(FreeUError::serde(format!(
            "stages infotext has {} entries, at most {STAGES_COUNT} expected",
            stages.len()
        )));
    }
    stages.resize(STAGES_COUNT, StageConfig::default());
    Ok(stages)
}

fn sparse_stage(stage: &StageConfig) -> Value {
    let defaults = StageConfig::default();
    let mut map = Map::new();
    let fields = [
        ("backbone_factor", stage.backbone_factor, defaults.backbone_factor),
        ("skip_factor", stage.skip_factor, defaults.skip_factor),
        ("backbone_offset", stage.backbone_offset, defaults.backbone_offset),
        ("backbone_width", stage.backbone_width, defaults.backbone_width),
        ("skip_cutoff", stage.skip_cutoff, defaults.skip_cutoff),
        (
            "skip_high_end_factor",
            stage.skip_high_end_factor,
            defaults.skip_high_end_factor,
        ),
    ];
    for (name, value, default) in fields {
        if value != default {
            map.insert(name.to_string(), Value::from(value));
        }
    }
    Value::Object(map)
}
