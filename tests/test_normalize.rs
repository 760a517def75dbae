// tests/test_normalize.rs — Accumulator normalization.

use vnlm::convert::AccumTexel;
use vnlm::normalize::normalize_into;
use vnlm::{Frame, Rgb};

#[test]
fn normalized_color_is_sum_over_weight_per_channel() {
    let accum: Vec<AccumTexel> = (0..12)
        .map(|i| {
            let w = 1.0 + i as f32;
            AccumTexel {
                weighted_sum: [0.1 * w, 0.5 * w, 0.9 * w],
                weight: w,
            }
        })
        .collect();
    let mut out: Frame<Rgb> = Frame::new(4, 3);
    normalize_into(&accum, &mut out);
    for (_, _, c) in out.pixels() {
        assert!((c.r - 0.1).abs() < 1e-6);
        assert!((c.g - 0.5).abs() < 1e-6);
        assert!((c.b - 0.9).abs() < 1e-6);
    }
}

#[test]
fn traversal_matches_frame_order() {
    // Pixel i gets value i / 10: checks x-fastest traversal.
    let accum: Vec<AccumTexel> = (0..6)
        .map(|i| AccumTexel {
            weighted_sum: [i as f32; 3],
            weight: 10.0,
        })
        .collect();
    let mut out: Frame<Rgb> = Frame::new(3, 2);
    normalize_into(&accum, &mut out);
    for (x, y, c) in out.pixels() {
        let i = y * 3 + x;
        assert!((c.r - i as f32 / 10.0).abs() < 1e-6, "({x},{y})");
    }
}
