use ndarray::{Array4, ArrayView4, CowArray, Ix4};
use rustfft::{FftPlanner, num_complex::Complex};

/// Applies 2-D frequency-domain low-cutoff masking over the last two axes
/// of a `(batch, channel, height, width)` tensor.
///
/// Frequencies inside the centered cutoff rectangle are multiplied by
/// `scale`, everything outside by `scale_high`. The cutoff rectangle spans
/// `[crow - tr, crow + tr) × [ccol - tc, ccol + tc)` around the shifted
/// zero-frequency bin, with `tr = max(1, floor(h/2 * threshold))` and the
/// column analogue, so exactly `2·tr × 2·tc` bins.
///
/// The transform runs per batch/channel plane in single precision.
pub fn fourier_filter(
    x: ArrayView4<'_, f32>,
    threshold: f64,
    scale: f32,
    scale_high: f32,
) -> Array4<f32> {
    let (batch, channels, h, w) = x.dim();
    let mut out = Array4::<f32>::zeros((batch, channels, h, w));
    if h == 0 || w == 0 {
        return out;
    }

    let mask = cutoff_mask(h, w, threshold, scale, scale_high);

    let mut planner = FftPlanner::<f32>::new();
    let fwd_w = planner.plan_fft_forward(w);
    let fwd_h = planner.plan_fft_forward(h);
    let inv_w = planner.plan_fft_inverse(w);
    let inv_h = planner.plan_fft_inverse(h);

    let mut plane = vec![Complex { re: 0.0, im: 0.0 }; h * w];
    let mut column = vec![Complex { re: 0.0, im: 0.0 }; h];
    let norm = 1.0 / (h * w) as f32;

    for b in 0..batch {
        for c in 0..channels {
            for r in 0..h {
                for cc in 0..w {
                    plane[r * w + cc] = Complex {
                        re: x[[b, c, r, cc]],
                        im: 0.0,
                    };
                }
            }

            for row in plane.chunks_exact_mut(w) {
                fwd_w.process(row);
            }
            for cc in 0..w {
                for r in 0..h {
                    column[r] = plane[r * w + cc];
                }
                fwd_h.process(&mut column);
                for r in 0..h {
                    plane[r * w + cc] = column[r];
                }
            }

            // The mask is laid out in centered (shifted) coordinates; the
            // unshifted bin (r, c) sits at ((r + h/2) % h, (c + w/2) % w).
            for r in 0..h {
                let mr = (r + h / 2) % h;
                for cc in 0..w {
                    let mc = (cc + w / 2) % w;
                    plane[r * w + cc] = plane[r * w + cc] * mask[mr * w + mc];
                }
            }

            for cc in 0..w {
                for r in 0..h {
                    column[r] = plane[r * w + cc];
                }
                inv_h.process(&mut column);
                for r in 0..h {
                    plane[r * w + cc] = column[r];
                }
            }
            for row in plane.chunks_exact_mut(w) {
                inv_w.process(row);
            }

            for r in 0..h {
                for cc in 0..w {
                    out[[b, c, r, cc]] = plane[r * w + cc].re * norm;
                }
            }
        }
    }

    out
}

/// Filters a skip tensor, borrowing the input unchanged when both scales
/// are exactly 1 (the transform is the identity then, no copy needed).
pub fn filter_skip<'a>(
    x: &'a Array4<f32>,
    threshold: f64,
    scale: f32,
    scale_high: f32,
) -> CowArray<'a, f32, Ix4> {
    if scale == 1.0 && scale_high == 1.0 {
        return CowArray::from(x.view());
    }
    CowArray::from(fourier_filter(x.view(), threshold, scale, scale_high))
}

fn cutoff_mask(h: usize, w: usize, threshold: f64, scale: f32, scale_high: f32) -> Vec<f32> {
    let threshold = threshold.clamp(0.0, 1.0);
    let mut mask = vec![scale_high; h * w];

    let crow = h / 2;
    let ccol = w / 2;
    // Half-extent in real arithmetic, so odd sizes keep the fractional half.
    let tr = (((h as f64 / 2.0) * threshold).floor() as usize).max(1);
    let tc = (((w as f64 / 2.0) * threshold).floor() as usize).max(1);

    let r0 = crow.saturating_sub(tr);
    let r1 = (crow + tr).min(h);
    let c0 = ccol.saturating_sub(tc);
    let c1 = (ccol + tc).min(w);

    for r in r0..r1 {
        for c in c0..c1 {
            mask[r * w + c] = scale;
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn tensor_filled(shape: (usize, usize, usize, usize), value: f32) -> Array4<f32> {
        Array4::from_elem(shape, value)
    }

    #[test]
    fn noop_scales_borrow_the_input() {
        let x = tensor_filled((1, 2, 8, 8), 3.0);
        let out = filter_skip(&x, 0.5, 1.0, 1.0);
        assert!(out.is_view());
        assert_eq!(out, x);
    }

    #[test]
    fn mask_rectangle_spans_two_thresholds() {
        // 64×64 with threshold 1/32: tr = tc = 1, so a 2×2 scaled block.
        let mask = cutoff_mask(64, 64, 1.0 / 32.0, 0.0, 1.0);
        let zeros = mask.iter().filter(|&&v| v == 0.0).count();
        assert_eq!(zeros, 4);
        assert_eq!(mask[32 * 64 + 32], 0.0);
        assert_eq!(mask[31 * 64 + 31], 0.0);
        assert_eq!(mask[33 * 64 + 33], 1.0);
    }

    #[test]
    fn zero_threshold_still_covers_the_dc_bin() {
        let mask = cutoff_mask(8, 8, 0.0, 0.5, 1.0);
        assert_eq!(mask[4 * 8 + 4], 0.5);
        let scaled = mask.iter().filter(|&&v| v == 0.5).count();
        assert_eq!(scaled, 4);
    }

    #[test]
    fn odd_sizes_keep_the_fractional_half_extent() {
        // 9×9 at threshold 0.9: tr = floor(4.5 * 0.9) = 4, an 8×8 block.
        let mask = cutoff_mask(9, 9, 0.9, 0.0, 1.0);
        let zeros = mask.iter().filter(|&&v| v == 0.0).count();
        assert_eq!(zeros, 64);
        assert_eq!(mask[0], 0.0);
        assert_eq!(mask[8], 1.0);
    }

    #[test]
    fn full_threshold_scales_everything() {
        let mask = cutoff_mask(8, 8, 1.0, 0.25, 1.0);
        assert!(mask.iter().all(|&v| v == 0.25));
    }

    #[test]
    fn zero_scales_annihilate_the_tensor() {
        let mut x = tensor_filled((1, 1, 8, 8), 1.0);
        x[[0, 0, 3, 5]] = -2.0;
        x[[0, 0, 6, 1]] = 7.5;
        let out = fourier_filter(x.view(), 0.25, 0.0, 0.0);
        for v in out.iter() {
            assert!(v.abs() < 1e-4, "residual {v}");
        }
    }

    #[test]
    fn unit_scales_reconstruct_the_input() {
        let mut x = tensor_filled((2, 3, 8, 4), 0.0);
        for (i, v) in x.iter_mut().enumerate() {
            *v = ((i * 37) % 11) as f32 - 5.0;
        }
        let out = fourier_filter(x.view(), 0.5, 1.0, 1.0);
        for (a, b) in out.iter().zip(x.iter()) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn constant_input_scales_by_the_passband_factor() {
        // A constant plane has all its energy in the DC bin, which sits
        // inside the cutoff rectangle even at threshold 0.
        let x = tensor_filled((1, 2, 8, 8), 3.0);
        let out = fourier_filter(x.view(), 0.0, 0.9, 1.0);
        for v in out.iter() {
            assert!((v - 2.7).abs() < 1e-4, "{v}");
        }
    }

    #[test]
    fn high_frequency_content_scales_by_the_stopband_factor() {
        // Nyquist checkerboard along both axes is pure high frequency.
        let mut x = tensor_filled((1, 1, 8, 8), 0.0);
        for r in 0..8 {
            for c in 0..8 {
                x[[0, 0, r, c]] = if (r + c) % 2 == 0 { 1.0 } else { -1.0 };
            }
        }
        let out = fourier_filter(x.view(), 0.0, 1.0, 0.5);
        for (a, b) in out.iter().zip(x.iter()) {
            assert!((a - b * 0.5).abs() < 1e-4, "{a} vs {b}");
        }
    }
}
