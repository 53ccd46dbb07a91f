//! Dominant-color classification over the accepted garment mask.

use stitch_proto::NamedColor;
use tracing::debug;

use crate::hsv::{in_color_box, rgb_to_hsv, Hsv};
use crate::{Frame, Mask, VisionError};

/// Fraction of masked pixels a color's vote must exceed in the fallback.
const VOTE_FLOOR: f64 = 0.10;

/// Reduce the masked pixel population to one named color.
///
/// Mean HSV is checked against fixed decision bands in priority order
/// (dark, light, then hue bands); when the mean lands between bands, a
/// per-color pixel vote decides, with `Unknown` as the conservative
/// fallback. An all-zero mask is an [`VisionError::EmptyMask`].
pub fn classify_color(frame: &Frame, mask: &Mask) -> Result<NamedColor, VisionError> {
    assert_eq!(frame.dimensions(), mask.dimensions(), "mask dimension mismatch");

    let mut sum_h = 0.0f64;
    let mut sum_s = 0.0f64;
    let mut sum_v = 0.0f64;
    let mut count = 0u64;

    for (x, y, px) in frame.enumerate_pixels() {
        if !mask.contains(x, y) {
            continue;
        }
        let hsv = rgb_to_hsv(px[0], px[1], px[2]);
        sum_h += hsv.h as f64;
        sum_s += hsv.s as f64;
        sum_v += hsv.v as f64;
        count += 1;
    }

    if count == 0 {
        return Err(VisionError::EmptyMask);
    }

    let h = (sum_h / count as f64) as f32;
    let s = (sum_s / count as f64) as f32;
    let v = (sum_v / count as f64) as f32;
    debug!(h, s, v, pixels = count, "mean garment hsv");

    if v < 50.0 {
        return Ok(NamedColor::Black);
    }
    if v > 200.0 && s < 50.0 {
        return Ok(NamedColor::White);
    }
    if h <= 10.0 || h >= 170.0 {
        return Ok(NamedColor::Red);
    }
    if h <= 20.0 {
        return Ok(NamedColor::Orange);
    }
    if (100.0..=130.0).contains(&h) {
        return Ok(NamedColor::Blue);
    }
    if (20.0..=30.0).contains(&h) {
        return Ok(NamedColor::Yellow);
    }
    if (40.0..=80.0).contains(&h) {
        return Ok(NamedColor::Green);
    }

    Ok(pixel_vote(frame, mask, count))
}

/// Per-color pixel vote, independent of the mean: each masked pixel votes
/// for every HSV box containing it. The winner must carry more than 10% of
/// the masked pixels, otherwise the color stays `Unknown`.
fn pixel_vote(frame: &Frame, mask: &Mask, masked_pixels: u64) -> NamedColor {
    let mut votes = [0u64; NamedColor::CLASSIFIABLE.len()];

    for (x, y, px) in frame.enumerate_pixels() {
        if !mask.contains(x, y) {
            continue;
        }
        let hsv: Hsv = rgb_to_hsv(px[0], px[1], px[2]);
        for (i, &color) in NamedColor::CLASSIFIABLE.iter().enumerate() {
            if in_color_box(color, hsv) {
                votes[i] += 1;
            }
        }
    }

    let mut best = NamedColor::Unknown;
    let mut best_votes = 0u64;
    for (i, &color) in NamedColor::CLASSIFIABLE.iter().enumerate() {
        if votes[i] > best_votes {
            best_votes = votes[i];
            best = color;
        }
    }

    if (best_votes as f64) > VOTE_FLOOR * masked_pixels as f64 {
        debug!(winner = %best, votes = best_votes, "pixel vote fallback");
        best
    } else {
        NamedColor::Unknown
    }
}
