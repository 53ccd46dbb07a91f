pub mod annotate;
pub mod camera;
pub mod color;
pub mod design;
pub mod hsv;
pub mod mask;
pub mod region;

use image::GrayImage;
use serde::Deserialize;
use thiserror::Error;

/// A single frame as handed to the pipeline. Owned by the caller; no stage
/// mutates it. Annotation produces an explicit copy.
pub type Frame = image::RgbImage;

#[derive(Debug, Error)]
pub enum VisionError {
    /// Classification was attempted on an all-zero mask. Treated upstream as
    /// "no color" / "no features", never as a fatal condition.
    #[error("classification attempted on an empty mask")]
    EmptyMask,
}

/// Binary per-pixel membership map. Always the same dimensions as the frame
/// it was built from; the set operations enforce this.
#[derive(Debug, Clone)]
pub struct Mask {
    inner: GrayImage,
}

impl Mask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self { inner: GrayImage::new(width, height) }
    }

    pub fn from_gray(inner: GrayImage) -> Self {
        Self { inner }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.inner.get_pixel(x, y).0[0] > 0
    }

    pub fn set(&mut self, x: u32, y: u32) {
        self.inner.put_pixel(x, y, image::Luma([255u8]));
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.inner
    }

    pub fn as_gray_mut(&mut self) -> &mut GrayImage {
        &mut self.inner
    }

    /// Set union with another mask of the same dimensions.
    pub fn union_with(&mut self, other: &Mask) {
        assert_eq!(self.dimensions(), other.dimensions(), "mask dimension mismatch");
        for (dst, src) in self.inner.iter_mut().zip(other.inner.iter()) {
            if *src > 0 {
                *dst = 255;
            }
        }
    }

    /// Set intersection with another mask of the same dimensions.
    pub fn intersect_with(&mut self, other: &Mask) {
        assert_eq!(self.dimensions(), other.dimensions(), "mask dimension mismatch");
        for (dst, src) in self.inner.iter_mut().zip(other.inner.iter()) {
            if *src == 0 {
                *dst = 0;
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.inner.iter().filter(|&&v| v > 0).count() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.inner.iter().all(|&v| v == 0)
    }

    /// Fraction of the frame covered by the mask, in [0,1].
    pub fn coverage(&self) -> f64 {
        let (w, h) = self.dimensions();
        let total = (w as u64) * (h as u64);
        if total == 0 {
            return 0.0;
        }
        self.count() as f64 / total as f64
    }
}

/// All tunable thresholds of the detection pipeline. Defaults are the
/// production values; a `[detection]` config section can override any of
/// them for a facility with unusual lighting or camera placement.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum contour area for a color-derived candidate (whole garment).
    pub color_region_min_area: f64,
    /// Edge-derived candidates represent graphics and text, which are much
    /// smaller than a garment; bounded on both sides.
    pub edge_region_min_area: f64,
    pub edge_region_max_area: f64,
    /// Grouping radius as a fraction of the frame diagonal.
    pub group_radius_frac: f64,
    /// A group needs at least one contour this large to be considered.
    pub min_contour_area: f64,
    pub aspect_ratio_min: f64,
    pub aspect_ratio_max: f64,
    /// Accepted group's rasterized area over total frame pixels, lower bound.
    pub group_area_ratio_min: f64,
    /// Final garment decision: mask coverage must exceed this.
    pub mask_coverage_threshold: f64,
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// FAST-9 corner threshold for keypoint counting.
    pub fast_threshold: u8,
    pub object_contour_min_area: f64,
    pub object_contour_max_area: f64,
    /// Shape complexity floor (area / perimeter^2) filtering degenerate
    /// slivers out of the object-contour count.
    pub min_shape_complexity: f64,
    pub text_region_min_area: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            color_region_min_area: 5000.0,
            edge_region_min_area: 100.0,
            edge_region_max_area: 50_000.0,
            group_radius_frac: 0.3,
            min_contour_area: 1000.0,
            aspect_ratio_min: 0.3,
            aspect_ratio_max: 2.5,
            group_area_ratio_min: 0.005,
            mask_coverage_threshold: 0.02,
            blur_sigma: 1.4,
            canny_low: 50.0,
            canny_high: 150.0,
            fast_threshold: 20,
            object_contour_min_area: 100.0,
            object_contour_max_area: 10_000.0,
            min_shape_complexity: 0.01,
            text_region_min_area: 50.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_tracks_frame_dimensions() {
        let mask = Mask::empty(64, 48);
        assert_eq!(mask.dimensions(), (64, 48));
        assert!(mask.is_empty());
        assert_eq!(mask.coverage(), 0.0);
    }

    #[test]
    fn union_and_intersection_are_set_ops() {
        let mut a = Mask::empty(4, 4);
        let mut b = Mask::empty(4, 4);
        a.set(0, 0);
        a.set(1, 1);
        b.set(1, 1);
        b.set(2, 2);

        let mut u = a.clone();
        u.union_with(&b);
        assert_eq!(u.count(), 3);

        a.intersect_with(&b);
        assert_eq!(a.count(), 1);
        assert!(a.contains(1, 1));
    }

    #[test]
    #[should_panic(expected = "mask dimension mismatch")]
    fn union_rejects_mismatched_dimensions() {
        let mut a = Mask::empty(4, 4);
        let b = Mask::empty(5, 4);
        a.union_with(&b);
    }
}
