use ndarray::{Array4, ArrayView4, Axis, concatenate, s};

use crate::{
    config::Settings,
    device::FilterPlacement,
    error::{FreeUError, FreeUResult},
    region::{ChannelRegion, ratio_to_region},
    schedule::{SamplingProgress, modulate, schedule_ratio},
    spectral::filter_skip,
};

/// Backbone channel counts of the recognized decoder stages, widest first.
/// The index into this list selects the matching [`crate::config::StageConfig`].
pub const DEFAULT_STAGE_WIDTHS: [usize; 3] = [1280, 640, 320];

/// The intercepted backbone/skip concatenation for one decoder stage.
///
/// Holds the per-request settings snapshot; progress is threaded in per
/// call. Unrecognized channel counts, a disabled flag or a zero schedule
/// ratio all fall through to the plain concatenation.
#[derive(Clone, Debug)]
pub struct StageTransform {
    settings: Settings,
    stage_widths: Vec<usize>,
    placement: FilterPlacement,
}

impl StageTransform {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            stage_widths: DEFAULT_STAGE_WIDTHS.to_vec(),
            placement: FilterPlacement::Native,
        }
    }

    /// Overrides the recognized stage widths (e.g. for a narrower U-Net).
    pub fn with_stage_widths(mut self, widths: impl Into<Vec<usize>>) -> Self {
        self.stage_widths = widths.into();
        self
    }

    /// Where the spectral filter should run for this request's tensors,
    /// as resolved by [`crate::device::PlacementCache`].
    pub fn with_placement(mut self, placement: FilterPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Concatenates `backbone` and `skip` along the channel axis, rescaling
    /// both first when this channel width is a recognized stage and the
    /// schedule is active.
    ///
    /// Mutates the backbone's selected channel range in place; callers
    /// must not assume the input tensor is unchanged afterwards.
    #[tracing::instrument(level = "debug", skip_all, fields(channels = backbone.dim().1))]
    pub fn cat(
        &self,
        backbone: &mut Array4<f32>,
        skip: &Array4<f32>,
        progress: &SamplingProgress,
    ) -> FreeUResult<Array4<f32>> {
        let channels = backbone.dim().1;
        let Some(stage) = self.stage_widths.iter().position(|&w| w == channels) else {
            return plain_cat(backbone.view(), skip.view());
        };
        if !self.settings.enabled {
            return plain_cat(backbone.view(), skip.view());
        }

        let ratio = schedule_ratio(&self.settings.schedule, progress);
        if ratio == 0.0 {
            return plain_cat(backbone.view(), skip.view());
        }

        // A stage without configuration falls back to the identity config.
        let cfg = self.settings.stage(stage);

        let region = ratio_to_region(cfg.backbone_width, cfg.backbone_offset, channels);
        let factor = modulate(cfg.backbone_factor, ratio) as f32;
        if factor != 1.0 {
            scale_region(backbone, region, factor);
        }

        let scale = modulate(cfg.skip_factor, ratio) as f32;
        let scale_high = modulate(cfg.skip_high_end_factor, ratio) as f32;
        if self.placement == FilterPlacement::Host && (scale != 1.0 || scale_high != 1.0) {
            tracing::debug!(stage, "complex FFT unsupported on device, filtering on host");
        }
        let filtered = filter_skip(skip, cfg.skip_cutoff, scale, scale_high);

        plain_cat(backbone.view(), filtered.view())
    }
}

/// The original host operation: concatenate along the channel axis.
pub fn plain_cat(a: ArrayView4<'_, f32>, b: ArrayView4<'_, f32>) -> FreeUResult<Array4<f32>> {
    concatenate(Axis(1), &[a, b])
        .map_err(|e| FreeUError::shape(format!("channel concatenation failed: {e}")))
}

fn scale_region(x: &mut Array4<f32>, region: ChannelRegion, factor: f32) {
    let n = x.dim().1;
    let begin = region.begin.min(n);
    let end = region.end.min(n);
    if region.inverted {
        x.slice_mut(s![.., ..begin, .., ..])
            .mapv_inplace(|v| v * factor);
        x.slice_mut(s![.., end.., .., ..])
            .mapv_inplace(|v| v * factor);
    } else {
        x.slice_mut(s![.., begin..end, .., ..])
            .mapv_inplace(|v| v * factor);
    }
}
