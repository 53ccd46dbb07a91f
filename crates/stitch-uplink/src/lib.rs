//! HTTP boundary to the fulfillment backend.
//!
//! Three calls: fetch the pending-order list, upload a matched snapshot,
//! upload an unmatched completion photo. Every call is fallible and the
//! frame loop treats failures as log-and-continue; nothing here retries.

pub mod doctor;

use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::{debug, info};

use stitch_proto::{SnapshotAck, SnapshotMeta, WireOrder};

#[derive(Debug, Error)]
pub enum UplinkError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: reqwest::StatusCode },
    #[error("malformed response body from {url}: {source}")]
    BadBody {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub struct Uplink {
    base_url: String,
    facility_id: String,
    client: reqwest::Client,
}

impl Uplink {
    pub fn new(base_url: String, facility_id: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { base_url, facility_id, client: reqwest::Client::new() }
    }

    pub fn facility_id(&self) -> &str {
        &self.facility_id
    }

    /// GET the orders still awaiting a completion photo for this facility.
    pub async fn fetch_pending_orders(&self) -> Result<Vec<WireOrder>, UplinkError> {
        let url = format!(
            "{}/api/print-facilities/{}/available-order-items",
            self.base_url, self.facility_id
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| UplinkError::Transport { url: url.clone(), source })?;
        let resp = check_status(resp, &url)?;
        let orders: Vec<WireOrder> = resp
            .json()
            .await
            .map_err(|source| UplinkError::BadBody { url: url.clone(), source })?;
        debug!(count = orders.len(), "fetched pending orders");
        Ok(orders)
    }

    /// POST a matched snapshot; the backend links it to the order item and
    /// answers with the updated order status.
    pub async fn upload_matched(
        &self,
        meta: &SnapshotMeta,
        jpeg: Vec<u8>,
        filename: &str,
    ) -> Result<SnapshotAck, UplinkError> {
        let url = format!("{}/api/video-detection/snapshot", self.base_url);
        let mut form = Form::new()
            .part(
                "snapshot",
                Part::bytes(jpeg).file_name(filename.to_string()).mime_str("image/jpeg")
                    .map_err(|source| UplinkError::Transport { url: url.clone(), source })?,
            )
            .text("printFacilityId", meta.print_facility_id.clone())
            .text("detectedColor", meta.detected_color.to_string())
            .text("confidence", meta.confidence.to_string());
        if let Some(id) = &meta.order_item_id {
            form = form.text("orderItemId", id.clone());
        }
        let ack = self.post_form(&url, form).await?;
        info!(
            order_item_id = meta.order_item_id.as_deref().unwrap_or("-"),
            status = ack.order_status.as_deref().unwrap_or("-"),
            "matched snapshot accepted"
        );
        Ok(ack)
    }

    /// POST an unmatched completion photo for later manual assignment.
    pub async fn upload_unmatched(
        &self,
        meta: &SnapshotMeta,
        jpeg: Vec<u8>,
        filename: &str,
    ) -> Result<SnapshotAck, UplinkError> {
        let url = format!("{}/api/completion-photos", self.base_url);
        let form = Form::new()
            .part(
                "completionPhoto",
                Part::bytes(jpeg).file_name(filename.to_string()).mime_str("image/jpeg")
                    .map_err(|source| UplinkError::Transport { url: url.clone(), source })?,
            )
            .text("printFacilityId", meta.print_facility_id.clone())
            .text("detectedColor", meta.detected_color.to_string())
            .text("confidence", meta.confidence.to_string());
        let ack = self.post_form(&url, form).await?;
        info!("unmatched snapshot accepted");
        Ok(ack)
    }

    async fn post_form(&self, url: &str, form: Form) -> Result<SnapshotAck, UplinkError> {
        let resp = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| UplinkError::Transport { url: url.to_string(), source })?;
        let resp = check_status(resp, url)?;
        resp.json()
            .await
            .map_err(|source| UplinkError::BadBody { url: url.to_string(), source })
    }
}

fn check_status(resp: reqwest::Response, url: &str) -> Result<reqwest::Response, UplinkError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(UplinkError::Status { url: url.to_string(), status });
    }
    Ok(resp)
}
