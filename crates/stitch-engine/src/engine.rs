//! Frame-by-frame detection orchestrator.
//!
//! One [`DetectionEngine`] instance exists per facility session. It owns the
//! cooldown timestamps, runs each frame through mask building, garment
//! validation, color classification, design extraction and order matching,
//! and emits snapshot requests for the caller to upload. It never touches
//! the clock or the network itself.

use std::collections::HashMap;

use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use stitch_proto::{NamedColor, PendingOrder};
use stitch_vision::annotate::annotate_detection;
use stitch_vision::color::classify_color;
use stitch_vision::design::{extract_design_features, DesignFeatures};
use stitch_vision::mask::build_region_masks;
use stitch_vision::region::detect_garment;
use stitch_vision::{DetectionConfig, Frame, Mask};

use crate::matcher::{best_match, MatchResult};

/// Orchestrator timing knobs. The detection thresholds live in
/// [`DetectionConfig`]; this only covers snapshot suppression.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matched_cooldown_secs: i64,
    pub unmatched_cooldown_secs: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { matched_cooldown_secs: 5, unmatched_cooldown_secs: 10 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotKind {
    Matched { order_item_id: String, order_number: String },
    Unmatched,
}

/// A capture the caller should persist and upload. `confidence` is a
/// heuristic score, not a calibrated probability.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRequest {
    pub kind: SnapshotKind,
    pub color: NamedColor,
    pub confidence: f32,
}

/// What one frame produced. `snapshot` is only present when the relevant
/// cooldown has elapsed.
#[derive(Debug)]
pub enum FrameOutcome {
    NoGarment,
    Garment {
        color: NamedColor,
        features: DesignFeatures,
        matched: Option<MatchResult>,
        snapshot: Option<SnapshotRequest>,
        annotated: Frame,
        mask: Mask,
    },
}

pub struct DetectionEngine {
    detection: DetectionConfig,
    matched_cooldown: Duration,
    unmatched_cooldown: Duration,
    last_matched: HashMap<String, OffsetDateTime>,
    last_unmatched: Option<OffsetDateTime>,
}

impl DetectionEngine {
    pub fn new(detection: DetectionConfig, cfg: &EngineConfig) -> Self {
        Self {
            detection,
            matched_cooldown: Duration::seconds(cfg.matched_cooldown_secs),
            unmatched_cooldown: Duration::seconds(cfg.unmatched_cooldown_secs),
            last_matched: HashMap::new(),
            last_unmatched: None,
        }
    }

    /// Run one frame through the full pipeline.
    ///
    /// The order list is whatever the caller's cache currently holds; a
    /// stale list degrades match quality, never correctness. Classification
    /// on a degenerate mask is treated as "no garment", so a bad frame
    /// cannot corrupt the cooldown state used by the next one.
    pub fn step(
        &mut self,
        frame: &Frame,
        orders: &[PendingOrder],
        now: OffsetDateTime,
    ) -> FrameOutcome {
        let (width, height) = frame.dimensions();
        let artifacts = build_region_masks(frame, &self.detection);
        let detection = detect_garment(&artifacts.candidates, width, height, &self.detection);
        if !detection.present {
            return FrameOutcome::NoGarment;
        }

        let color = match classify_color(frame, &detection.mask) {
            Ok(color) => color,
            Err(err) => {
                debug!(%err, "color classification failed, dropping frame");
                return FrameOutcome::NoGarment;
            }
        };
        let features = match extract_design_features(
            frame,
            &detection.mask,
            &artifacts.edge_mask,
            &self.detection,
        ) {
            Ok(features) => features,
            Err(err) => {
                debug!(%err, "design extraction failed, dropping frame");
                return FrameOutcome::NoGarment;
            }
        };

        let matched = best_match(orders, color, &features);
        let snapshot = match &matched {
            Some(m) => self.matched_snapshot(m, color, &features, now),
            None => self.unmatched_snapshot(color, &features, now),
        };

        let annotated = annotate_detection(frame, &detection.mask, Some(color));
        FrameOutcome::Garment {
            color,
            features,
            matched,
            snapshot,
            annotated,
            mask: detection.mask,
        }
    }

    fn matched_snapshot(
        &mut self,
        m: &MatchResult,
        color: NamedColor,
        features: &DesignFeatures,
        now: OffsetDateTime,
    ) -> Option<SnapshotRequest> {
        let id = &m.order.order_item_id;
        // Expired entries are dropped here so the map stays bounded over a
        // long session.
        self.last_matched.retain(|_, last| now - *last < self.matched_cooldown);
        if self.last_matched.contains_key(id) {
            debug!(order_item_id = %id, "matched snapshot suppressed by cooldown");
            return None;
        }
        self.last_matched.insert(id.clone(), now);
        info!(
            order_item_id = %id,
            order_number = %m.order.order_number,
            score = m.score,
            %color,
            "garment matched to pending order"
        );
        Some(SnapshotRequest {
            kind: SnapshotKind::Matched {
                order_item_id: id.clone(),
                order_number: m.order.order_number.clone(),
            },
            color,
            confidence: (0.8 + features.keypoint_count as f32 / 200.0).min(1.0),
        })
    }

    fn unmatched_snapshot(
        &mut self,
        color: NamedColor,
        features: &DesignFeatures,
        now: OffsetDateTime,
    ) -> Option<SnapshotRequest> {
        if let Some(last) = self.last_unmatched {
            if now - last < self.unmatched_cooldown {
                debug!("unmatched snapshot suppressed by cooldown");
                return None;
            }
        }
        self.last_unmatched = Some(now);
        info!(%color, "garment detected with no matching order");
        Some(SnapshotRequest {
            kind: SnapshotKind::Unmatched,
            color,
            confidence: (0.6 + features.keypoint_count as f32 / 200.0).min(0.8),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use stitch_proto::PendingOrder;
    use time::macros::datetime;

    /// A solid-colored block large enough to pass every validation gate on
    /// a 320x240 frame.
    fn shirt_frame(color: Rgb<u8>) -> Frame {
        let mut frame = Frame::from_pixel(320, 240, Rgb([128, 128, 128]));
        for y in 40..200 {
            for x in 80..240 {
                frame.put_pixel(x, y, color);
            }
        }
        frame
    }

    fn red_order(id: &str) -> PendingOrder {
        PendingOrder {
            order_item_id: id.to_string(),
            order_number: format!("ORD-{id}"),
            color: NamedColor::Red,
            design_image: None,
            quantity: 1,
            size: "M".to_string(),
        }
    }

    fn engine() -> DetectionEngine {
        DetectionEngine::new(DetectionConfig::default(), &EngineConfig::default())
    }

    #[test]
    fn empty_scene_yields_no_garment() {
        let frame = Frame::from_pixel(320, 240, Rgb([128, 128, 128]));
        let mut eng = engine();
        assert!(matches!(
            eng.step(&frame, &[], datetime!(2026-01-01 00:00:00 UTC)),
            FrameOutcome::NoGarment
        ));
    }

    #[test]
    fn matched_garment_emits_snapshot() {
        let frame = shirt_frame(Rgb([220, 20, 20]));
        let orders = vec![red_order("7")];
        let mut eng = engine();
        let outcome = eng.step(&frame, &orders, datetime!(2026-01-01 00:00:00 UTC));
        match outcome {
            FrameOutcome::Garment { color, matched, snapshot, .. } => {
                assert_eq!(color, NamedColor::Red);
                let m = matched.expect("order should match");
                assert_eq!(m.order.order_item_id, "7");
                let snap = snapshot.expect("first match emits a snapshot");
                assert!(matches!(snap.kind, SnapshotKind::Matched { .. }));
                assert!(snap.confidence >= 0.8 && snap.confidence <= 1.0);
            }
            FrameOutcome::NoGarment => panic!("garment not detected"),
        }
    }

    #[test]
    fn matched_cooldown_suppresses_then_expires() {
        let frame = shirt_frame(Rgb([220, 20, 20]));
        let orders = vec![red_order("7")];
        let mut eng = engine();
        let t0 = datetime!(2026-01-01 00:00:00 UTC);

        let first = eng.step(&frame, &orders, t0);
        assert!(matches!(first, FrameOutcome::Garment { snapshot: Some(_), .. }));

        let within = eng.step(&frame, &orders, t0 + Duration::seconds(3));
        assert!(matches!(within, FrameOutcome::Garment { snapshot: None, .. }));

        let after = eng.step(&frame, &orders, t0 + Duration::seconds(6));
        assert!(matches!(after, FrameOutcome::Garment { snapshot: Some(_), .. }));
    }

    #[test]
    fn cooldowns_are_per_order() {
        let frame = shirt_frame(Rgb([220, 20, 20]));
        let mut eng = engine();
        let t0 = datetime!(2026-01-01 00:00:00 UTC);

        let first = eng.step(&frame, &[red_order("a")], t0);
        assert!(matches!(first, FrameOutcome::Garment { snapshot: Some(_), .. }));

        // A different order id is not suppressed by order "a"'s timestamp.
        let other = eng.step(&frame, &[red_order("b")], t0 + Duration::seconds(1));
        assert!(matches!(other, FrameOutcome::Garment { snapshot: Some(_), .. }));
    }

    #[test]
    fn expired_cooldown_entries_are_pruned() {
        let frame = shirt_frame(Rgb([220, 20, 20]));
        let mut eng = engine();
        let t0 = datetime!(2026-01-01 00:00:00 UTC);

        eng.step(&frame, &[red_order("a")], t0);
        // By the next match, order "a"'s entry has long expired and must be
        // evicted rather than accumulating for the rest of the session.
        eng.step(&frame, &[red_order("b")], t0 + Duration::seconds(20));
        assert!(!eng.last_matched.contains_key("a"));
        assert!(eng.last_matched.contains_key("b"));
    }

    #[test]
    fn unmatched_garment_uses_longer_cooldown() {
        let frame = shirt_frame(Rgb([30, 30, 220]));
        let orders = vec![red_order("7")];
        let mut eng = engine();
        let t0 = datetime!(2026-01-01 00:00:00 UTC);

        let first = eng.step(&frame, &orders, t0);
        match &first {
            FrameOutcome::Garment { matched, snapshot, .. } => {
                assert!(matched.is_none());
                let snap = snapshot.as_ref().expect("first unmatched emits a snapshot");
                assert_eq!(snap.kind, SnapshotKind::Unmatched);
                assert!(snap.confidence >= 0.6 && snap.confidence <= 0.8);
            }
            FrameOutcome::NoGarment => panic!("garment not detected"),
        }

        let within = eng.step(&frame, &orders, t0 + Duration::seconds(7));
        assert!(matches!(within, FrameOutcome::Garment { snapshot: None, .. }));

        let after = eng.step(&frame, &orders, t0 + Duration::seconds(11));
        assert!(matches!(after, FrameOutcome::Garment { snapshot: Some(_), .. }));
    }
}
