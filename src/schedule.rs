use crate::config::{ScheduleConfig, StepValue};

/// Per-request sampling counters. Reset at the start of each generation
/// request; advanced once after each full denoising iteration. Each request
/// owns its instance; nothing here is process-global.
#[derive(Clone, Copy, Debug, Default)]
pub struct SamplingProgress {
    pub current_step: u32,
    pub total_steps: u32,
}

impl SamplingProgress {
    pub fn begin(total_steps: u32) -> Self {
        Self {
            current_step: 0,
            total_steps,
        }
    }

    pub fn advance(&mut self) {
        self.current_step = self.current_step.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.current_step = 0;
    }
}

/// Resolves a schedule boundary to an absolute step index.
pub fn resolve_step(value: StepValue, total_steps: u32) -> u32 {
    match value {
        StepValue::Step(n) => n,
        StepValue::Fraction(f) => {
            let step = (f * f64::from(total_steps)).floor();
            if step.is_finite() && step > 0.0 {
                step as u32
            } else {
                0
            }
        }
    }
}

/// How strongly the effect applies at the current step, in [0, 1].
///
/// The flat schedule is a hard window `[start, stop)`; the smooth schedule
/// ramps linearly up to `start` and back down to `stop`. The configured
/// smoothness blends the two.
pub fn schedule_ratio(schedule: &ScheduleConfig, progress: &SamplingProgress) -> f64 {
    let start = resolve_step(schedule.start_ratio, progress.total_steps);
    let stop = resolve_step(schedule.stop_ratio, progress.total_steps);
    let current = progress.current_step;

    let flat = if start <= current && current < stop {
        1.0
    } else {
        0.0
    };

    let smooth = if start == stop {
        0.0
    } else if current < start {
        // current < start implies start >= 1 here.
        (f64::from(current) / f64::from(start)).clamp(0.0, 1.0)
    } else {
        let span = f64::from(start) - f64::from(stop);
        (1.0 + (f64::from(current) - f64::from(start)) / span).clamp(0.0, 1.0)
    };

    lerp(flat, smooth, schedule.transition_smoothness.clamp(0.0, 1.0))
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Interpolates a configured factor toward the identity value 1 by the
/// schedule ratio: `1 + ratio * (factor - 1)`.
pub fn modulate(factor: f64, ratio: f64) -> f64 {
    lerp(1.0, factor, ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(start: StepValue, stop: StepValue, smoothness: f64) -> ScheduleConfig {
        ScheduleConfig {
            start_ratio: start,
            stop_ratio: stop,
            transition_smoothness: smoothness,
        }
    }

    fn at(step: u32) -> SamplingProgress {
        SamplingProgress {
            current_step: step,
            total_steps: 20,
        }
    }

    #[test]
    fn fractions_resolve_by_flooring() {
        assert_eq!(resolve_step(StepValue::Fraction(0.5), 20), 10);
        assert_eq!(resolve_step(StepValue::Fraction(0.99), 20), 19);
        assert_eq!(resolve_step(StepValue::Fraction(1.0), 20), 20);
        assert_eq!(resolve_step(StepValue::Fraction(0.0), 20), 0);
        assert_eq!(resolve_step(StepValue::Step(7), 20), 7);
    }

    #[test]
    fn flat_window_is_half_open() {
        let cfg = schedule(StepValue::Step(0), StepValue::Step(10), 0.0);
        for step in 0..10 {
            assert_eq!(schedule_ratio(&cfg, &at(step)), 1.0, "step {step}");
        }
        assert_eq!(schedule_ratio(&cfg, &at(10)), 0.0);
        assert_eq!(schedule_ratio(&cfg, &at(15)), 0.0);
    }

    #[test]
    fn degenerate_window_is_zero_regardless_of_smoothness() {
        for smoothness in [0.0, 0.5, 1.0] {
            let cfg = schedule(StepValue::Step(5), StepValue::Step(5), smoothness);
            for step in [0, 5, 10] {
                assert_eq!(schedule_ratio(&cfg, &at(step)), 0.0);
            }
        }
    }

    #[test]
    fn smooth_schedule_ramps_up_then_down() {
        let cfg = schedule(StepValue::Step(4), StepValue::Step(12), 1.0);
        assert_eq!(schedule_ratio(&cfg, &at(0)), 0.0);
        assert_eq!(schedule_ratio(&cfg, &at(2)), 0.5);
        assert_eq!(schedule_ratio(&cfg, &at(4)), 1.0);
        assert_eq!(schedule_ratio(&cfg, &at(8)), 0.5);
        assert_eq!(schedule_ratio(&cfg, &at(12)), 0.0);
        assert_eq!(schedule_ratio(&cfg, &at(16)), 0.0);
    }

    #[test]
    fn smoothness_blends_flat_and_smooth() {
        let cfg = schedule(StepValue::Step(4), StepValue::Step(12), 0.5);
        // flat = 0, smooth = 0.5 at step 2.
        assert_eq!(schedule_ratio(&cfg, &at(2)), 0.25);
        // flat = 1, smooth = 0.5 at step 8.
        assert_eq!(schedule_ratio(&cfg, &at(8)), 0.75);
    }

    #[test]
    fn reversed_window_does_not_divide_by_zero() {
        let cfg = schedule(StepValue::Step(10), StepValue::Step(2), 0.0);
        for step in 0..20 {
            assert_eq!(schedule_ratio(&cfg, &at(step)), 0.0);
        }
        let cfg = schedule(StepValue::Step(10), StepValue::Step(2), 1.0);
        for step in 0..20 {
            let r = schedule_ratio(&cfg, &at(step));
            assert!(r.is_finite());
            assert!((0.0..=1.0).contains(&r));
        }
    }

    #[test]
    fn modulate_moves_toward_identity() {
        assert_eq!(modulate(1.4, 1.0), 1.4);
        assert_eq!(modulate(1.4, 0.0), 1.0);
        assert_eq!(modulate(1.4, 0.5), 1.2);
        assert_eq!(modulate(0.2, 0.5), 0.6);
    }

    #[test]
    fn progress_counters() {
        let mut p = SamplingProgress::begin(20);
        assert_eq!(p.current_step, 0);
        p.advance();
        p.advance();
        assert_eq!(p.current_step, 2);
        p.reset();
        assert_eq!(p.current_step, 0);
    }
}
