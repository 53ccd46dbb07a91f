//! RGB -> HSV conversion and the per-color HSV boxes.
//!
//! Uses the OpenCV integer scale the thresholds were tuned on:
//! H in 0..=180 (degrees / 2), S and V in 0..=255.

use stitch_proto::NamedColor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut h = if delta < 1e-6 {
        0.0
    } else if (max - r).abs() < 1e-6 {
        60.0 * (((g - b) / delta) % 6.0)
    } else if (max - g).abs() < 1e-6 {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    if h < 0.0 {
        h += 360.0;
    }

    let s = if max < 1e-6 { 0.0 } else { delta / max };

    Hsv {
        h: h / 2.0,
        s: s * 255.0,
        v: max * 255.0,
    }
}

/// Closed HSV box membership for a classifiable color. Red owns the
/// wrap-around band at the top of the hue circle in addition to its
/// primary band.
pub fn in_color_box(color: NamedColor, hsv: Hsv) -> bool {
    let Hsv { h, s, v } = hsv;
    match color {
        NamedColor::White => s <= 30.0 && v >= 200.0,
        NamedColor::Black => v <= 30.0,
        NamedColor::Red => (h <= 10.0 || h >= 170.0) && s >= 100.0 && v >= 100.0,
        NamedColor::Orange => (10.0..=20.0).contains(&h) && s >= 100.0 && v >= 100.0,
        NamedColor::Blue => (100.0..=130.0).contains(&h) && s >= 100.0 && v >= 100.0,
        NamedColor::Yellow => (20.0..=30.0).contains(&h) && s >= 100.0 && v >= 100.0,
        NamedColor::Green => (40.0..=80.0).contains(&h) && s >= 100.0 && v >= 100.0,
        NamedColor::Unknown => false,
    }
}

/// True if the pixel falls inside any classifiable color's box, i.e. looks
/// like solid garment fabric rather than background.
pub fn in_any_color_box(hsv: Hsv) -> bool {
    NamedColor::CLASSIFIABLE.iter().any(|&c| in_color_box(c, hsv))
}
