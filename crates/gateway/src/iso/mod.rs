//! One module per destination: wire types, row conversion and the adapter.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::Destination;
use crate::adapter::{Adapter, Operation};
use crate::row::{RowError, RowReader};
use crate::transport::Transport;

pub mod caiso;
pub mod ercot;
pub mod miso;
pub mod neiso;
pub mod nyiso;
pub mod pjmiso;
pub mod sppiso;

pub use caiso::Caiso;
pub use ercot::Ercot;
pub use miso::Miso;
pub use neiso::Neiso;
pub use nyiso::Nyiso;
pub use pjmiso::Pjmiso;
pub use sppiso::Sppiso;

pub(crate) const VIRTUAL_OPERATIONS: &[Operation] = &[
    Operation::ValidateVirtuals,
    Operation::SubmitBids,
    Operation::SubmitOffers,
    Operation::WithdrawBids,
    Operation::WithdrawOffers,
];

pub(crate) const VIRTUAL_AND_SPREAD_OPERATIONS: &[Operation] = &[
    Operation::ValidateVirtuals,
    Operation::ValidateSpreads,
    Operation::SubmitBids,
    Operation::SubmitOffers,
    Operation::SubmitSpreads,
    Operation::WithdrawBids,
    Operation::WithdrawOffers,
    Operation::WithdrawSpreads,
];

/// The virtual order shape shared by CAISO, MISO, NYISO and SPPISO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlainVirtual {
    pub node: String,
    pub he: String,
    pub tranche: i64,
    pub mw: f64,
    pub price: f64,
}

impl PlainVirtual {
    pub fn from_row(row: &RowReader<'_>) -> Result<Self, RowError> {
        Ok(Self {
            node: row.text("node")?,
            he: row.text("he")?,
            tranche: row.int("tranche")?,
            mw: row.float("mw")?,
            price: row.float("price")?,
        })
    }
}

/// Operations the destination's API exposes.
pub const fn operations(destination: Destination) -> &'static [Operation] {
    match destination {
        Destination::Ercot => ercot::OPERATIONS,
        Destination::Pjmiso => pjmiso::OPERATIONS,
        Destination::Neiso => neiso::OPERATIONS,
        Destination::Caiso => caiso::OPERATIONS,
        Destination::Miso => miso::OPERATIONS,
        Destination::Nyiso => nyiso::OPERATIONS,
        Destination::Sppiso => sppiso::OPERATIONS,
    }
}

pub fn adapter(destination: Destination, transport: Arc<dyn Transport>) -> Arc<dyn Adapter> {
    match destination {
        Destination::Ercot => Arc::new(Ercot::new(transport)),
        Destination::Pjmiso => Arc::new(Pjmiso::new(transport)),
        Destination::Neiso => Arc::new(Neiso::new(transport)),
        Destination::Caiso => Arc::new(Caiso::new(transport)),
        Destination::Miso => Arc::new(Miso::new(transport)),
        Destination::Nyiso => Arc::new(Nyiso::new(transport)),
        Destination::Sppiso => Arc::new(Sppiso::new(transport)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RawRow;

    #[test]
    fn test_spread_operations_only_where_supported() {
        for destination in Destination::ALL {
            let has_spreads = operations(destination)
                .iter()
                .any(|operation| operation.kind() == crate::OrderKind::Spread);
            assert_eq!(has_spreads, destination.supports_spreads(), "{destination}");
        }
    }

    #[test]
    fn test_plain_virtual_from_row() {
        let row: RawRow = [
            ("node", "SP15"),
            ("he", "14"),
            ("tranche", "2"),
            ("mw", "5"),
            ("price", "30.5"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let order = PlainVirtual::from_row(&RowReader::new(&row, 1)).unwrap();
        assert_eq!(
            order,
            PlainVirtual {
                node: "SP15".to_string(),
                he: "14".to_string(),
                tranche: 2,
                mw: 5.0,
                price: 30.5,
            }
        );
    }
}
