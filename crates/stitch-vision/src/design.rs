//! Design feature extraction and complexity classification.
//!
//! Works on the accepted garment mask: keypoints come from the masked
//! grayscale region, edge density from the edge mask restricted to the
//! garment, object contours from the edge mask with a sliver filter, and
//! text-like regions from a morphological closing of the edge mask.

use image::GrayImage;
use imageproc::corners::corners_fast9;
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;
use serde::Serialize;
use tracing::debug;

use crate::region::{outer_contours, polygon_area, polygon_perimeter};
use crate::{DetectionConfig, Frame, Mask, VisionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DesignType {
    Plain,
    TextOnly,
    GraphicsOnly,
    TextWithGraphics,
    GraphicsWithText,
    ComplexDesign,
    ModerateDesign,
    SimpleDesign,
}

impl DesignType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignType::Plain => "Plain",
            DesignType::TextOnly => "Text Only",
            DesignType::GraphicsOnly => "Graphics Only",
            DesignType::TextWithGraphics => "Text with Graphics",
            DesignType::GraphicsWithText => "Graphics with Text",
            DesignType::ComplexDesign => "Complex Design",
            DesignType::ModerateDesign => "Moderate Design",
            DesignType::SimpleDesign => "Simple Design",
        }
    }
}

impl std::fmt::Display for DesignType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-frame design signals. `design_type` is derived from the four numeric
/// fields by [`classify_design`] and never set independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignFeatures {
    pub keypoint_count: u32,
    pub object_contour_count: u32,
    pub text_region_count: u32,
    pub edge_density: f32,
    pub complexity_score: f32,
    pub design_type: DesignType,
}

impl DesignFeatures {
    /// Weighted composite of the four signals, shared by the classifier and
    /// the order matcher.
    pub fn composite(&self) -> f32 {
        0.3 * self.keypoint_count as f32
            + 0.3 * self.object_contour_count as f32
            + 0.2 * self.text_region_count as f32
            + 0.2 * self.complexity_score
    }
}

/// Deterministic decision tree over the four signals; first match wins.
pub fn classify_design(
    keypoint_count: u32,
    object_contour_count: u32,
    text_region_count: u32,
    complexity_score: f32,
) -> DesignType {
    let composite = 0.3 * keypoint_count as f32
        + 0.3 * object_contour_count as f32
        + 0.2 * text_region_count as f32
        + 0.2 * complexity_score;

    if text_region_count <= 3 && object_contour_count <= 2 && keypoint_count < 100 && composite < 50.0 {
        DesignType::Plain
    } else if text_region_count > 5 && object_contour_count > 3 {
        DesignType::TextWithGraphics
    } else if text_region_count > 5 {
        DesignType::TextOnly
    } else if object_contour_count > 8 && text_region_count > 3 {
        DesignType::GraphicsWithText
    } else if object_contour_count > 8 {
        DesignType::GraphicsOnly
    } else if keypoint_count > 200 {
        DesignType::ComplexDesign
    } else if composite > 100.0 {
        DesignType::ModerateDesign
    } else if composite > 50.0 {
        DesignType::SimpleDesign
    } else {
        DesignType::Plain
    }
}

/// Extract design features from the garment region of one frame.
///
/// `edge_mask` is the frame's Canny mask from the Region Mask Builder; it is
/// intersected with the garment mask here so that background clutter never
/// counts toward the design.
pub fn extract_design_features(
    frame: &Frame,
    mask: &Mask,
    edge_mask: &Mask,
    cfg: &DetectionConfig,
) -> Result<DesignFeatures, VisionError> {
    assert_eq!(frame.dimensions(), mask.dimensions(), "mask dimension mismatch");

    let masked_pixels = mask.count();
    if masked_pixels == 0 {
        return Err(VisionError::EmptyMask);
    }

    // Grayscale restricted to the garment; everything else zeroed.
    let gray = image::imageops::grayscale(frame);
    let mut masked_gray = GrayImage::new(gray.width(), gray.height());
    for (x, y, px) in gray.enumerate_pixels() {
        if mask.contains(x, y) {
            masked_gray.put_pixel(x, y, *px);
        }
    }

    let keypoint_count = corners_fast9(&masked_gray, cfg.fast_threshold).len() as u32;

    let mut garment_edges = edge_mask.clone();
    garment_edges.intersect_with(mask);
    let edge_density = garment_edges.count() as f32 / masked_pixels as f32;

    // Object contours: mid-sized edge shapes that are not degenerate slivers.
    let mut object_contour_count = 0u32;
    for points in outer_contours(garment_edges.as_gray()) {
        let area = polygon_area(&points);
        if area <= cfg.object_contour_min_area || area >= cfg.object_contour_max_area {
            continue;
        }
        let perimeter = polygon_perimeter(&points);
        if perimeter <= 0.0 {
            continue;
        }
        if area / (perimeter * perimeter) > cfg.min_shape_complexity {
            object_contour_count += 1;
        }
    }

    // Text-like regions: closing merges broken glyph strokes into blobs.
    let closed = close(garment_edges.as_gray(), Norm::LInf, 1);
    let text_region_count = outer_contours(&closed)
        .iter()
        .filter(|points| polygon_area(points) > cfg.text_region_min_area)
        .count() as u32;

    let complexity_score = edge_density * 1000.0;
    let design_type = classify_design(
        keypoint_count,
        object_contour_count,
        text_region_count,
        complexity_score,
    );

    debug!(
        keypoint_count,
        object_contour_count,
        text_region_count,
        edge_density,
        complexity_score,
        design_type = %design_type,
        "design features"
    );

    Ok(DesignFeatures {
        keypoint_count,
        object_contour_count,
        text_region_count,
        edge_density,
        complexity_score,
        design_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn classification_tree_first_match_wins() {
        assert_eq!(classify_design(0, 0, 0, 0.0), DesignType::Plain);
        assert_eq!(classify_design(50, 4, 6, 10.0), DesignType::TextWithGraphics);
        assert_eq!(classify_design(50, 1, 6, 10.0), DesignType::TextOnly);
        assert_eq!(classify_design(50, 9, 4, 10.0), DesignType::GraphicsWithText);
        assert_eq!(classify_design(50, 9, 1, 10.0), DesignType::GraphicsOnly);
        assert_eq!(classify_design(250, 0, 0, 10.0), DesignType::ComplexDesign);
        // composite = 0.3*150 + 0.2*300 = 105
        assert_eq!(classify_design(150, 0, 0, 300.0), DesignType::ModerateDesign);
        // composite = 0.3*120 + 0.2*120 = 60
        assert_eq!(classify_design(120, 0, 0, 120.0), DesignType::SimpleDesign);
        // below every threshold but fails the strict plain rule on keypoints
        assert_eq!(classify_design(110, 0, 0, 0.0), DesignType::Plain);
    }

    #[test]
    fn classification_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(classify_design(123, 7, 4, 88.5), classify_design(123, 7, 4, 88.5));
        }
    }

    #[test]
    fn composite_weights_match_classifier() {
        let feats = DesignFeatures {
            keypoint_count: 100,
            object_contour_count: 10,
            text_region_count: 5,
            edge_density: 0.05,
            complexity_score: 50.0,
            design_type: DesignType::GraphicsWithText,
        };
        assert!((feats.composite() - (30.0 + 3.0 + 1.0 + 10.0)).abs() < 1e-5);
    }

    #[test]
    fn empty_mask_is_an_error() {
        let frame = Frame::from_pixel(40, 40, Rgb([200, 20, 20]));
        let mask = Mask::empty(40, 40);
        let edges = Mask::empty(40, 40);
        let res = extract_design_features(&frame, &mask, &edges, &DetectionConfig::default());
        assert!(matches!(res, Err(VisionError::EmptyMask)));
    }

    #[test]
    fn plain_block_has_near_zero_features() {
        let frame = Frame::from_pixel(120, 120, Rgb([200, 20, 20]));
        let mut mask = Mask::empty(120, 120);
        for y in 10..110 {
            for x in 10..110 {
                mask.set(x, y);
            }
        }
        let edges = Mask::empty(120, 120);
        let feats =
            extract_design_features(&frame, &mask, &edges, &DetectionConfig::default()).unwrap();
        assert_eq!(feats.design_type, DesignType::Plain);
        assert_eq!(feats.object_contour_count, 0);
        assert_eq!(feats.text_region_count, 0);
        assert_eq!(feats.edge_density, 0.0);
    }

    #[test]
    fn edge_density_only_counts_garment_pixels() {
        // Edges everywhere, mask over half the frame: density must be
        // computed against masked pixels only, giving ~1.0 not ~0.5.
        let frame = Frame::from_pixel(40, 40, Rgb([200, 20, 20]));
        let mut mask = Mask::empty(40, 40);
        let mut edges = Mask::empty(40, 40);
        for y in 0..40 {
            for x in 0..40 {
                edges.set(x, y);
                if x < 20 {
                    mask.set(x, y);
                }
            }
        }
        let feats =
            extract_design_features(&frame, &mask, &edges, &DetectionConfig::default()).unwrap();
        assert!((feats.edge_density - 1.0).abs() < 1e-6);
        assert_eq!(feats.complexity_score, 1000.0);
    }
}
