//! Raw CSV rows to typed destination payloads.

use crate::iso::{caiso, ercot, miso, neiso, nyiso, pjmiso, sppiso};
use crate::order::{TypedOrder, WithdrawalOrder};
use crate::row::{RawRow, RowError, RowReader, convert_all};
use crate::{Destination, OrderKind};

type OrderConverter = fn(&RowReader<'_>) -> Result<TypedOrder, RowError>;
type WithdrawalConverter = fn(&RowReader<'_>) -> Result<WithdrawalOrder, RowError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    #[error("No serializer registered for {destination} {kind}")]
    Unsupported {
        destination: Destination,
        kind: OrderKind,
    },
    #[error(transparent)]
    Row(#[from] RowError),
}

const ORDERS: &[(Destination, OrderKind, OrderConverter)] = &[
    (Destination::Ercot, OrderKind::Virtual, ercot::virtual_order),
    (Destination::Ercot, OrderKind::Spread, ercot::spread_order),
    (Destination::Pjmiso, OrderKind::Virtual, pjmiso::virtual_order),
    (Destination::Pjmiso, OrderKind::Spread, pjmiso::spread_order),
    (Destination::Neiso, OrderKind::Virtual, neiso::virtual_order),
    (Destination::Caiso, OrderKind::Virtual, caiso::virtual_order),
    (Destination::Miso, OrderKind::Virtual, miso::virtual_order),
    (Destination::Nyiso, OrderKind::Virtual, nyiso::virtual_order),
    (Destination::Sppiso, OrderKind::Virtual, sppiso::virtual_order),
];

const WITHDRAWALS: &[(Destination, OrderKind, WithdrawalConverter)] = &[
    (Destination::Pjmiso, OrderKind::Virtual, pjmiso::virtual_withdrawal),
    (Destination::Pjmiso, OrderKind::Spread, pjmiso::spread_withdrawal),
    (Destination::Neiso, OrderKind::Virtual, neiso::virtual_withdrawal),
    (Destination::Miso, OrderKind::Virtual, miso::virtual_withdrawal),
    (Destination::Nyiso, OrderKind::Virtual, nyiso::virtual_withdrawal),
];

fn order_converter(destination: Destination, kind: OrderKind) -> Option<OrderConverter> {
    ORDERS
        .iter()
        .find(|(d, k, _)| *d == destination && *k == kind)
        .map(|(_, _, convert)| *convert)
}

/// Whether withdrawals on this destination name individual orders.
pub fn takes_withdrawal_identifiers(destination: Destination, kind: OrderKind) -> bool {
    WITHDRAWALS
        .iter()
        .any(|(d, k, _)| *d == destination && *k == kind)
}

pub fn serialize(
    destination: Destination,
    kind: OrderKind,
    rows: &[RawRow],
) -> Result<Vec<TypedOrder>, SerializeError> {
    let convert = order_converter(destination, kind)
        .ok_or(SerializeError::Unsupported { destination, kind })?;
    Ok(convert_all(rows, convert)?)
}

/// `None` when the destination withdraws its whole book rather than named orders.
pub fn serialize_withdrawals(
    destination: Destination,
    kind: OrderKind,
    rows: &[RawRow],
) -> Result<Option<Vec<WithdrawalOrder>>, SerializeError> {
    if order_converter(destination, kind).is_none() {
        return Err(SerializeError::Unsupported { destination, kind });
    }

    let Some((_, _, convert)) = WITHDRAWALS
        .iter()
        .find(|(d, k, _)| *d == destination && *k == kind)
    else {
        return Ok(None);
    };

    Ok(Some(convert_all(rows, convert)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use serde_json::json;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_ercot_virtual_row() {
        let rows = vec![row(&[
            ("node", "HB_WEST"),
            ("he", "16"),
            ("tranche", "1"),
            ("mw", "10.5"),
            ("price", "25.3"),
            ("is_block", "false"),
        ])];

        let orders = serialize(Destination::Ercot, OrderKind::Virtual, &rows).unwrap();
        assert_eq!(
            serde_json::to_value(&orders).unwrap(),
            json!([{
                "node": "HB_WEST",
                "he": "16",
                "tranche": 1,
                "mw": 10.5,
                "price": 25.3,
                "is_block": false
            }])
        );
    }

    #[test]
    fn test_ercot_spread_row() {
        let rows = vec![row(&[
            ("source", "HB_WEST"),
            ("sink", "HB_NORTH"),
            ("he", "10"),
            ("tranche", "1"),
            ("mw", "10"),
            ("price", "25.3"),
            ("is_block", "false"),
        ])];

        let orders = serialize(Destination::Ercot, OrderKind::Spread, &rows).unwrap();
        assert_eq!(
            serde_json::to_value(&orders).unwrap(),
            json!([{
                "source": "HB_WEST",
                "sink": "HB_NORTH",
                "he": "10",
                "tranche": 1,
                "mw": 10.0,
                "price": 25.3,
                "is_block": false
            }])
        );
    }

    #[test]
    fn test_headers_matched_case_insensitively() {
        let rows = vec![row(&[
            ("Node", "NP15"),
            ("HE", "1"),
            ("Tranche", "1"),
            ("MW", "1"),
            ("Price", "1"),
        ])];
        assert_eq!(
            serialize(Destination::Caiso, OrderKind::Virtual, &rows)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_bad_number_fails_whole_batch() {
        let good = row(&[
            ("node", "N1"),
            ("he", "1"),
            ("tranche", "1"),
            ("mw", "1"),
            ("price", "1"),
        ]);
        let mut bad = good.clone();
        bad.insert("tranche".to_string(), "10abc".to_string());

        let error = serialize(Destination::Miso, OrderKind::Virtual, &[good, bad]).unwrap_err();
        assert_eq!(
            error,
            SerializeError::Row(RowError::InvalidNumber {
                row: 2,
                column: "tranche".to_string(),
                value: "10abc".to_string(),
                expected: "an integer",
            })
        );
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        assert!(
            serialize(Destination::Nyiso, OrderKind::Virtual, &[])
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_unknown_pair_is_unsupported() {
        assert_eq!(
            serialize(Destination::Caiso, OrderKind::Spread, &[]).unwrap_err(),
            SerializeError::Unsupported {
                destination: Destination::Caiso,
                kind: OrderKind::Spread
            }
        );
        assert!(serialize_withdrawals(Destination::Miso, OrderKind::Spread, &[]).is_err());
    }

    #[test]
    fn test_book_withdrawal_destinations_take_no_identifiers() {
        for destination in [Destination::Ercot, Destination::Caiso, Destination::Sppiso] {
            assert_eq!(
                serialize_withdrawals(destination, OrderKind::Virtual, &[]).unwrap(),
                None,
                "{destination}"
            );
            assert!(!takes_withdrawal_identifiers(destination, OrderKind::Virtual));
        }
        assert_eq!(
            serialize_withdrawals(Destination::Ercot, OrderKind::Spread, &[]).unwrap(),
            None
        );
    }

    #[test]
    fn test_nyiso_withdrawal_rows() {
        let rows = vec![row(&[("node", "N.Y.C."), ("he", "ignored")])];
        let withdrawals = serialize_withdrawals(Destination::Nyiso, OrderKind::Virtual, &rows)
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::to_value(&withdrawals).unwrap(),
            json!([{"node": "N.Y.C."}])
        );
    }

    #[test]
    fn test_every_serializer_has_a_schema() {
        for (destination, kind, _) in ORDERS {
            assert!(
                schema::lookup(*destination, *kind).is_ok(),
                "{destination} {kind}"
            );
        }
        for (destination, kind, _) in WITHDRAWALS {
            assert!(order_converter(*destination, *kind).is_some());
        }
    }

    #[test]
    fn test_schema_rows_always_serialize() {
        for destination in Destination::ALL {
            for kind in [OrderKind::Virtual, OrderKind::Spread] {
                let Ok(columns) = schema::lookup(destination, kind) else {
                    continue;
                };
                let rows = vec![
                    columns
                        .iter()
                        .map(|column| {
                            let value = match *column {
                                "node" | "source" | "sink" | "he" => "X1",
                                "is_block" => "true",
                                _ => "7",
                            };
                            ((*column).to_string(), value.to_string())
                        })
                        .collect::<RawRow>(),
                ];
                let orders = serialize(destination, kind, &rows).unwrap();
                assert_eq!(orders[0].destination(), destination);
                assert_eq!(orders[0].kind(), kind);
            }
        }
    }
}
