// `deny` rather than `forbid`: ndarray's `s!` macro expands with a scoped
// `#[allow(unsafe_code)]`, which `forbid` would reject outright.
#![deny(unsafe_code)]

//! FreeU feature reweighting for U-Net diffusion decoders.
//!
//! The host's denoising loop intercepts the backbone/skip concatenation at
//! each decoder stage and routes it through [`StageTransform::cat`], which
//! scales a configured backbone channel region and spectrally filters the
//! skip tensor, both modulated by a per-step schedule ratio.

pub mod config;
pub mod device;
pub mod error;
pub mod grid;
pub mod infotext;
pub mod presets;
pub mod region;
pub mod schedule;
pub mod spectral;
pub mod transform;

pub use config::{
    STAGE_FIELD_COUNT, STAGES_COUNT, ScheduleConfig, Settings, StageConfig, StepValue,
};
pub use device::{CpuProbe, DeviceProbe, FilterPlacement, PlacementCache};
pub use error::{FreeUError, FreeUResult};
pub use grid::{Override, StageField, apply_overrides};
pub use presets::{Preset, PresetStore};
pub use region::{ChannelRegion, ratio_to_region};
pub use schedule::{SamplingProgress, schedule_ratio};
pub use spectral::{filter_skip, fourier_filter};
pub use transform::{DEFAULT_STAGE_WIDTHS, StageTransform, plain_cat};
