//! Region Mask Builder: raw color and edge evidence for one frame.
//!
//! Two provenance channels by design: a garment is a large solid-color blob
//! (color channel) while its printed decoration shows up as edges (edge
//! channel). Either channel alone misses one of the two.

use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use crate::hsv::{in_any_color_box, rgb_to_hsv};
use crate::region::{outer_contours, CandidateRegion, Provenance};
use crate::{DetectionConfig, Frame, Mask};

/// Unvalidated masks plus the candidate regions extracted from them.
#[derive(Debug)]
pub struct MaskArtifacts {
    pub color_mask: Mask,
    pub edge_mask: Mask,
    pub candidates: Vec<CandidateRegion>,
}

pub fn build_region_masks(frame: &Frame, cfg: &DetectionConfig) -> MaskArtifacts {
    let (width, height) = frame.dimensions();

    // Union of all per-color HSV thresholds.
    let mut color_mask = Mask::empty(width, height);
    for (x, y, px) in frame.enumerate_pixels() {
        let hsv = rgb_to_hsv(px[0], px[1], px[2]);
        if in_any_color_box(hsv) {
            color_mask.set(x, y);
        }
    }

    // Blur before Canny to keep sensor noise out of the edge mask.
    let gray = image::imageops::grayscale(frame);
    let blurred = gaussian_blur_f32(&gray, cfg.blur_sigma);
    let edge_mask = Mask::from_gray(canny(&blurred, cfg.canny_low, cfg.canny_high));

    let mut candidates = Vec::new();
    for points in outer_contours(color_mask.as_gray()) {
        let region = CandidateRegion::new(Provenance::ColorDerived, points);
        if region.area > cfg.color_region_min_area {
            candidates.push(region);
        }
    }
    for points in outer_contours(edge_mask.as_gray()) {
        let region = CandidateRegion::new(Provenance::EdgeDerived, points);
        if region.area > cfg.edge_region_min_area && region.area < cfg.edge_region_max_area {
            candidates.push(region);
        }
    }

    debug!(
        color_pixels = color_mask.count(),
        edge_pixels = edge_mask.count(),
        candidates = candidates.len(),
        "region masks built"
    );

    MaskArtifacts { color_mask, edge_mask, candidates }
}
