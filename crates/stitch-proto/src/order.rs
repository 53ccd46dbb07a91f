use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::NamedColor;

/// One order item awaiting a completion photo, as served by
/// `GET /api/print-facilities/{id}/available-order-items`.
///
/// The raw payload is duck-shaped JSON; [`PendingOrder::from_wire`] is the
/// boundary where malformed records are rejected so that nothing downstream
/// (in particular the matcher) has to re-check field presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    pub order_item_id: String,
    pub order_number: String,
    pub color: NamedColor,
    pub design_image: Option<String>,
    pub quantity: u32,
    pub size: String,
}

/// Wire shape before validation: color arrives as a free-form string and
/// numeric fields may be missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrder {
    #[serde(default)]
    pub order_item_id: String,
    #[serde(default)]
    pub order_number: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub design_image: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub size: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderValidationError {
    #[error("order record missing orderItemId")]
    MissingItemId,
    #[error("order {0} missing orderNumber")]
    MissingOrderNumber(String),
    #[error("order {0} has unrecognized color {1:?}")]
    BadColor(String, String),
    #[error("order {0} has invalid quantity")]
    BadQuantity(String),
}

impl PendingOrder {
    pub fn from_wire(wire: WireOrder) -> Result<PendingOrder, OrderValidationError> {
        if wire.order_item_id.trim().is_empty() {
            return Err(OrderValidationError::MissingItemId);
        }
        if wire.order_number.trim().is_empty() {
            return Err(OrderValidationError::MissingOrderNumber(wire.order_item_id));
        }
        let color = NamedColor::parse(&wire.color)
            .ok_or_else(|| OrderValidationError::BadColor(wire.order_item_id.clone(), wire.color.clone()))?;
        let quantity = match wire.quantity {
            Some(q) if q >= 1 => q,
            _ => return Err(OrderValidationError::BadQuantity(wire.order_item_id)),
        };
        Ok(PendingOrder {
            order_item_id: wire.order_item_id,
            order_number: wire.order_number,
            color,
            design_image: wire.design_image,
            quantity,
            size: wire.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(color: &str, qty: Option<u32>) -> WireOrder {
        WireOrder {
            order_item_id: "item-1".into(),
            order_number: "ORD-100".into(),
            color: color.into(),
            design_image: Some("designs/a.png".into()),
            quantity: qty,
            size: "M".into(),
        }
    }

    #[test]
    fn accepts_well_formed_record() {
        let order = PendingOrder::from_wire(wire("Red", Some(2))).unwrap();
        assert_eq!(order.color, NamedColor::Red);
        assert_eq!(order.quantity, 2);
    }

    #[test]
    fn rejects_unknown_color_string() {
        let err = PendingOrder::from_wire(wire("paisley", Some(1))).unwrap_err();
        assert!(matches!(err, OrderValidationError::BadColor(_, _)));
    }

    #[test]
    fn rejects_zero_or_missing_quantity() {
        assert!(matches!(
            PendingOrder::from_wire(wire("blue", Some(0))),
            Err(OrderValidationError::BadQuantity(_))
        ));
        assert!(matches!(
            PendingOrder::from_wire(wire("blue", None)),
            Err(OrderValidationError::BadQuantity(_))
        ));
    }

    #[test]
    fn rejects_blank_item_id() {
        let mut w = wire("blue", Some(1));
        w.order_item_id = "  ".into();
        assert_eq!(
            PendingOrder::from_wire(w).unwrap_err(),
            OrderValidationError::MissingItemId
        );
    }

    #[test]
    fn wire_deserializes_camel_case() {
        let raw = r#"{
            "orderItemId": "item-9",
            "orderNumber": "ORD-9",
            "color": "green",
            "designImage": null,
            "quantity": 1,
            "size": "L"
        }"#;
        let w: WireOrder = serde_json::from_str(raw).unwrap();
        let order = PendingOrder::from_wire(w).unwrap();
        assert_eq!(order.order_number, "ORD-9");
        assert_eq!(order.design_image, None);
    }
}
