use serde::{Deserialize, Serialize};

use crate::color::NamedColor;

/// Metadata accompanying a snapshot upload. `order_item_id` is `None` for
/// unmatched captures, which go to the manual-assignment endpoint instead.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub print_facility_id: String,
    pub detected_color: NamedColor,
    /// Heuristic detection strength in [0,1]; not a calibrated probability.
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_item_id: Option<String>,
}

/// Acknowledgement body the snapshot sinks return on success.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotAck {
    pub message: String,
    #[serde(default)]
    pub order_status: Option<String>,
}
