//! Candidate regions, spatial grouping, and garment validation.
//!
//! Garments show up as one big color blob plus a scatter of edge contours
//! from the printed design. Grouping pulls those back together before the
//! size/aspect rules decide whether the blob is plausibly a garment.

use image::Luma;
use imageproc::contours::{find_contours, BorderType};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use tracing::debug;

use crate::{DetectionConfig, Mask};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// From the unioned HSV color mask: large solid-color areas.
    ColorDerived,
    /// From the Canny edge mask: graphics and text, much smaller.
    EdgeDerived,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

/// One tagged contour, produced and consumed within a single frame.
#[derive(Debug, Clone)]
pub struct CandidateRegion {
    pub provenance: Provenance,
    pub points: Vec<Point<i32>>,
    pub area: f64,
    pub bbox: BoundingBox,
}

impl CandidateRegion {
    pub fn new(provenance: Provenance, points: Vec<Point<i32>>) -> Self {
        let area = polygon_area(&points);
        let bbox = bounding_box(&points);
        Self { provenance, points, area, bbox }
    }
}

/// Shoelace area of a closed polygon given without a repeated endpoint.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0i64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        acc += (p.x as i64) * (q.y as i64) - (q.x as i64) * (p.y as i64);
    }
    (acc.abs() as f64) / 2.0
}

/// Closed-polygon perimeter (arc length including the implicit closing edge).
pub fn polygon_perimeter(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        let dx = (q.x - p.x) as f64;
        let dy = (q.y - p.y) as f64;
        acc += (dx * dx + dy * dy).sqrt();
    }
    acc
}

pub fn bounding_box(points: &[Point<i32>]) -> BoundingBox {
    if points.is_empty() {
        return BoundingBox { x: 0, y: 0, width: 0, height: 0 };
    }
    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    }
}

/// Outer contours of a binary image, as point lists.
pub fn outer_contours(image: &image::GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(image)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .map(|c| c.points)
        .collect()
}

/// Outcome of grouping + validation over one frame's candidates.
#[derive(Debug)]
pub struct GarmentDetection {
    pub present: bool,
    pub mask: Mask,
    pub accepted_groups: usize,
}

/// Greedy proximity grouping: largest ungrouped region seeds a group and
/// absorbs every ungrouped region whose bbox center lies within
/// `group_radius_frac` of the frame diagonal. Descending-area order, no
/// backtracking.
pub fn group_regions(
    candidates: &[CandidateRegion],
    width: u32,
    height: u32,
    cfg: &DetectionConfig,
) -> Vec<Vec<usize>> {
    let diag = ((width as f64).powi(2) + (height as f64).powi(2)).sqrt();
    let radius = cfg.group_radius_frac * diag;

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        candidates[b]
            .area
            .partial_cmp(&candidates[a].area)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut grouped = vec![false; candidates.len()];
    let mut groups = Vec::new();

    for &seed in &order {
        if grouped[seed] {
            continue;
        }
        grouped[seed] = true;
        let mut group = vec![seed];
        let (sx, sy) = candidates[seed].bbox.center();

        for &other in &order {
            if grouped[other] {
                continue;
            }
            let (ox, oy) = candidates[other].bbox.center();
            let dist = ((ox - sx).powi(2) + (oy - sy).powi(2)).sqrt();
            if dist <= radius {
                grouped[other] = true;
                group.push(other);
            }
        }
        groups.push(group);
    }
    groups
}

/// Rasterize a group's contours into a mask by filling each polygon.
fn rasterize_group(group: &[usize], candidates: &[CandidateRegion], width: u32, height: u32) -> Mask {
    let mut mask = Mask::empty(width, height);
    for &idx in group {
        let pts = &candidates[idx].points;
        if pts.is_empty() {
            continue;
        }
        // draw_polygon_mut rejects a closed point list.
        let open = if pts.len() > 1 && pts.first() == pts.last() {
            &pts[..pts.len() - 1]
        } else {
            &pts[..]
        };
        if open.is_empty() {
            continue;
        }
        draw_polygon_mut(mask.as_gray_mut(), open, Luma([255u8]));
    }
    mask
}

/// Validate each group and union the accepted ones into the garment mask.
///
/// A group is accepted when it contains at least one contour of area >=
/// `min_contour_area` with a garment-like aspect ratio, and its rasterized
/// area ratio over the frame falls in (group_area_ratio_min, 1.0].
pub fn detect_garment(
    candidates: &[CandidateRegion],
    width: u32,
    height: u32,
    cfg: &DetectionConfig,
) -> GarmentDetection {
    let total_pixels = (width as f64) * (height as f64);
    let groups = group_regions(candidates, width, height, cfg);

    let mut final_mask = Mask::empty(width, height);
    let mut accepted = 0usize;

    for group in &groups {
        let significant: Vec<&CandidateRegion> = group
            .iter()
            .map(|&i| &candidates[i])
            .filter(|r| r.area >= cfg.min_contour_area)
            .collect();
        if significant.is_empty() {
            continue;
        }

        let has_garment_shape = significant.iter().any(|r| {
            let ar = r.bbox.aspect_ratio();
            ar > cfg.aspect_ratio_min && ar < cfg.aspect_ratio_max
        });
        if !has_garment_shape {
            continue;
        }

        let group_mask = rasterize_group(group, candidates, width, height);
        let area_ratio = group_mask.count() as f64 / total_pixels;
        if area_ratio > cfg.group_area_ratio_min && area_ratio <= 1.0 {
            final_mask.union_with(&group_mask);
            accepted += 1;
        }
    }

    let coverage = final_mask.coverage();
    let present = coverage > cfg.mask_coverage_threshold;
    debug!(
        groups = groups.len(),
        accepted, coverage, present, "garment validation"
    );

    GarmentDetection { present, mask: final_mask, accepted_groups: accepted }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_points(x: i32, y: i32, w: i32, h: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ]
    }

    fn region(prov: Provenance, x: i32, y: i32, w: i32, h: i32) -> CandidateRegion {
        CandidateRegion::new(prov, rect_points(x, y, w, h))
    }

    #[test]
    fn shoelace_area_of_rectangle() {
        assert_eq!(polygon_area(&rect_points(0, 0, 10, 20)), 200.0);
    }

    #[test]
    fn perimeter_of_rectangle() {
        assert!((polygon_perimeter(&rect_points(0, 0, 10, 20)) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn grouping_absorbs_nearby_regions_into_largest_seed() {
        // 200x200 frame, diagonal ~283, radius ~85.
        let candidates = vec![
            region(Provenance::ColorDerived, 40, 40, 100, 120), // seed (largest)
            region(Provenance::EdgeDerived, 70, 70, 20, 20),    // nearby, absorbed
            region(Provenance::EdgeDerived, 180, 180, 10, 10),  // far corner, own group
        ];
        let groups = group_regions(&candidates, 200, 200, &DetectionConfig::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec![0, 1]);
        assert_eq!(groups[1], vec![2]);
    }

    #[test]
    fn garment_sized_blob_is_accepted() {
        // A 120x150 blob on a 320x240 frame: area 18000 of 76800 (~23%).
        let candidates = vec![region(Provenance::ColorDerived, 80, 40, 120, 150)];
        let det = detect_garment(&candidates, 320, 240, &DetectionConfig::default());
        assert!(det.present);
        assert_eq!(det.accepted_groups, 1);
        assert_eq!(det.mask.dimensions(), (320, 240));
        assert!(det.mask.coverage() > 0.02);
    }

    #[test]
    fn slivers_and_tiny_contours_are_rejected() {
        // Extreme aspect ratio fails the shape rule.
        let sliver = vec![region(Provenance::ColorDerived, 0, 100, 300, 10)];
        assert!(!detect_garment(&sliver, 320, 240, &DetectionConfig::default()).present);

        // A contour below min_contour_area cannot carry a group.
        let tiny = vec![region(Provenance::EdgeDerived, 10, 10, 20, 20)];
        assert!(!detect_garment(&tiny, 320, 240, &DetectionConfig::default()).present);
    }

    #[test]
    fn empty_candidate_list_means_no_garment() {
        let det = detect_garment(&[], 320, 240, &DetectionConfig::default());
        assert!(!det.present);
        assert!(det.mask.is_empty());
    }
}
