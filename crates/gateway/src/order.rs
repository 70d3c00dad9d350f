//! Destination-specific payloads built from uploaded rows.

use serde::Serialize;

use crate::adapter::Operation;
use crate::iso::{PlainVirtual, ercot, miso, neiso, nyiso, pjmiso};
use crate::{Destination, OrderKind};

/// A fully typed order. Serializes to exactly the destination's JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedOrder {
    ErcotVirtual(ercot::VirtualOrder),
    ErcotSpread(ercot::SpreadOrder),
    PjmisoVirtual(pjmiso::VirtualOrder),
    PjmisoSpread(pjmiso::SpreadOrder),
    NeisoVirtual(neiso::VirtualOrder),
    CaisoVirtual(PlainVirtual),
    MisoVirtual(PlainVirtual),
    NyisoVirtual(PlainVirtual),
    SppisoVirtual(PlainVirtual),
}

impl TypedOrder {
    pub const fn destination(&self) -> Destination {
        match self {
            Self::ErcotVirtual(_) | Self::ErcotSpread(_) => Destination::Ercot,
            Self::PjmisoVirtual(_) | Self::PjmisoSpread(_) => Destination::Pjmiso,
            Self::NeisoVirtual(_) => Destination::Neiso,
            Self::CaisoVirtual(_) => Destination::Caiso,
            Self::MisoVirtual(_) => Destination::Miso,
            Self::NyisoVirtual(_) => Destination::Nyiso,
            Self::SppisoVirtual(_) => Destination::Sppiso,
        }
    }

    pub const fn kind(&self) -> OrderKind {
        match self {
            Self::ErcotSpread(_) | Self::PjmisoSpread(_) => OrderKind::Spread,
            _ => OrderKind::Virtual,
        }
    }
}

/// Identifies previously submitted orders to withdraw.
///
/// Only destinations that withdraw order by order have a variant here; the
/// rest withdraw their whole book for the trade date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WithdrawalOrder {
    PjmisoVirtual(pjmiso::VirtualWithdrawal),
    PjmisoSpread(pjmiso::SpreadWithdrawal),
    NeisoVirtual(neiso::VirtualWithdrawal),
    MisoVirtual(miso::VirtualWithdrawal),
    NyisoVirtual(nyiso::VirtualWithdrawal),
}

impl WithdrawalOrder {
    pub const fn destination(&self) -> Destination {
        match self {
            Self::PjmisoVirtual(_) | Self::PjmisoSpread(_) => Destination::Pjmiso,
            Self::NeisoVirtual(_) => Destination::Neiso,
            Self::MisoVirtual(_) => Destination::Miso,
            Self::NyisoVirtual(_) => Destination::Nyiso,
        }
    }

    pub const fn kind(&self) -> OrderKind {
        match self {
            Self::PjmisoSpread(_) => OrderKind::Spread,
            _ => OrderKind::Virtual,
        }
    }
}

/// Body of a validation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidationRequest {
    /// `{bids?, offers?}`
    Virtuals {
        #[serde(skip_serializing_if = "Option::is_none")]
        bids: Option<Vec<TypedOrder>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        offers: Option<Vec<TypedOrder>>,
    },
    /// A bare array.
    Spreads(Vec<TypedOrder>),
}

impl ValidationRequest {
    pub const fn bids(orders: Vec<TypedOrder>) -> Self {
        Self::Virtuals {
            bids: Some(orders),
            offers: None,
        }
    }

    pub const fn offers(orders: Vec<TypedOrder>) -> Self {
        Self::Virtuals {
            bids: None,
            offers: Some(orders),
        }
    }

    pub const fn operation(&self) -> Operation {
        match self {
            Self::Virtuals { .. } => Operation::ValidateVirtuals,
            Self::Spreads(_) => Operation::ValidateSpreads,
        }
    }

    pub fn orders(&self) -> impl Iterator<Item = &TypedOrder> {
        let (first, second): (&[TypedOrder], &[TypedOrder]) = match self {
            Self::Virtuals { bids, offers } => (
                bids.as_deref().unwrap_or_default(),
                offers.as_deref().unwrap_or_default(),
            ),
            Self::Spreads(orders) => (orders.as_slice(), &[]),
        };
        first.iter().chain(second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn caiso(node: &str) -> TypedOrder {
        TypedOrder::CaisoVirtual(PlainVirtual {
            node: node.to_string(),
            he: "14".to_string(),
            tranche: 1,
            mw: 5.0,
            price: 30.5,
        })
    }

    #[test]
    fn test_typed_order_serializes_without_tag() {
        assert_eq!(
            serde_json::to_value(caiso("SP15")).unwrap(),
            json!({"node": "SP15", "he": "14", "tranche": 1, "mw": 5.0, "price": 30.5})
        );
    }

    #[test]
    fn test_typed_order_destination_and_kind() {
        let order = caiso("NP15");
        assert_eq!(order.destination(), Destination::Caiso);
        assert_eq!(order.kind(), OrderKind::Virtual);

        let spread = TypedOrder::ErcotSpread(ercot::SpreadOrder {
            source: "HB_WEST".to_string(),
            sink: "HB_NORTH".to_string(),
            he: "10".to_string(),
            tranche: 1,
            mw: 10.0,
            price: 25.3,
            is_block: false,
        });
        assert_eq!(spread.destination(), Destination::Ercot);
        assert_eq!(spread.kind(), OrderKind::Spread);
    }

    #[test]
    fn test_validation_request_bids_only() {
        let request = ValidationRequest::bids(vec![caiso("SP15")]);
        assert_eq!(request.operation(), Operation::ValidateVirtuals);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"bids": [{"node": "SP15", "he": "14", "tranche": 1, "mw": 5.0, "price": 30.5}]})
        );
    }

    #[test]
    fn test_validation_request_orders_chains_both_sides() {
        let request = ValidationRequest::Virtuals {
            bids: Some(vec![caiso("A")]),
            offers: Some(vec![caiso("B"), caiso("C")]),
        };
        assert_eq!(request.orders().count(), 3);

        let empty = ValidationRequest::Virtuals {
            bids: None,
            offers: None,
        };
        assert_eq!(empty.orders().count(), 0);
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({}));
    }

    #[test]
    fn test_validation_request_spreads_is_bare_array() {
        let request = ValidationRequest::Spreads(vec![]);
        assert_eq!(request.operation(), Operation::ValidateSpreads);
        assert_eq!(serde_json::to_value(&request).unwrap(), json!([]));
    }

    #[test]
    fn test_withdrawal_serializes_identifiers_only() {
        let withdrawal = WithdrawalOrder::MisoVirtual(miso::VirtualWithdrawal {
            node: "ALTW.WELLS1".to_string(),
        });
        assert_eq!(withdrawal.destination(), Destination::Miso);
        assert_eq!(
            serde_json::to_value(&withdrawal).unwrap(),
            json!({"node": "ALTW.WELLS1"})
        );
    }
}
