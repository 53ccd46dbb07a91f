//! Normalized coefficient correlation (mean-centered NCC).
//!
//! Complements the two `imageproc` passes: both the template and each
//! search window are centered on their own means before correlating, which
//! makes the score invariant to uniform brightness shifts.

use image::GrayImage;

/// Slide the template over the image and return the best zero-mean NCC
/// score with its top-left location. Scores lie in [-1, 1]; flat windows
/// (zero variance) score 0. The template must fit inside the image.
pub fn match_coeff_normed(image: &GrayImage, template: &GrayImage) -> (f32, (u32, u32)) {
    let (iw, ih) = image.dimensions();
    let (tw, th) = template.dimensions();
    assert!(tw <= iw && th <= ih, "template must fit inside image");
    assert!(tw > 0 && th > 0, "template must be non-empty");

    let n = (tw as f64) * (th as f64);
    let t: Vec<f64> = template.iter().map(|&v| v as f64).collect();
    let t_mean = t.iter().sum::<f64>() / n;
    let t_dev: Vec<f64> = t.iter().map(|v| v - t_mean).collect();
    let t_norm_sq: f64 = t_dev.iter().map(|d| d * d).sum();

    let mut best = f64::MIN;
    let mut best_loc = (0u32, 0u32);

    for y in 0..=(ih - th) {
        for x in 0..=(iw - tw) {
            let mut w_sum = 0.0f64;
            let mut w_sq_sum = 0.0f64;
            let mut cross = 0.0f64;

            for ty in 0..th {
                for tx in 0..tw {
                    let w = image.get_pixel(x + tx, y + ty).0[0] as f64;
                    let td = t_dev[(ty * tw + tx) as usize];
                    w_sum += w;
                    w_sq_sum += w * w;
                    cross += td * w;
                }
            }

            // cross already equals sum((t - mt) * (w - mw)) because the
            // template deviations sum to zero.
            let w_mean = w_sum / n;
            let w_norm_sq = (w_sq_sum - n * w_mean * w_mean).max(0.0);
            let denom = (t_norm_sq * w_norm_sq).sqrt();
            let score = if denom > f64::EPSILON { cross / denom } else { 0.0 };

            if score > best {
                best = score;
                best_loc = (x, y);
            }
        }
    }

    (best as f32, best_loc)
}
