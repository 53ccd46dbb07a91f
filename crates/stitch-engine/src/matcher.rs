//! Scores pending orders against the observed garment and picks the best.

use stitch_proto::{NamedColor, PendingOrder};
use stitch_vision::design::{DesignFeatures, DesignType};

/// Minimum score an order must exceed before it counts as a match. A bare
/// color agreement (+50) clears it; keypoint dribble alone (max +20 from
/// that term) does not.
pub const MATCH_THRESHOLD: f32 = 25.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub order: PendingOrder,
    pub score: f32,
}

/// Score one order against the detected color and design features.
///
/// The weights are hand-tuned; color agreement dominates, design-type
/// agreement refines. Every term is additive, so adding evidence can only
/// raise a score.
pub fn score_order(
    order: &PendingOrder,
    detected: NamedColor,
    features: &DesignFeatures,
) -> f32 {
    let mut score = 0.0f32;

    if order.color == detected {
        score += 50.0;
    } else if detected == NamedColor::Unknown {
        score += 10.0;
    }

    if features.design_type != DesignType::Plain {
        score += 20.0;
        score += match features.design_type {
            DesignType::TextOnly => 15.0,
            DesignType::GraphicsOnly => 20.0,
            DesignType::TextWithGraphics | DesignType::GraphicsWithText => 25.0,
            DesignType::ComplexDesign => 30.0,
            _ => 0.0,
        };
        let composite = features.composite();
        if composite > 100.0 {
            score += 15.0;
        } else if composite > 50.0 {
            score += 10.0;
        }
        if features.text_region_count > 3 {
            score += 10.0;
        }
        if features.object_contour_count > 5 {
            score += 10.0;
        }
    }

    score + (features.keypoint_count as f32 / 100.0).min(20.0)
}

/// Pick the strictly best-scoring order, or none if nothing clears the
/// threshold. Ties keep the earliest order in scan order.
pub fn best_match(
    orders: &[PendingOrder],
    detected: NamedColor,
    features: &DesignFeatures,
) -> Option<MatchResult> {
    let mut best: Option<MatchResult> = None;
    for order in orders {
        let score = score_order(order, detected, features);
        let beats = match &best {
            Some(b) => score > b.score,
            None => true,
        };
        if beats {
            best = Some(MatchResult { order: order.clone(), score });
        }
    }
    best.filter(|m| m.score > MATCH_THRESHOLD)
}
