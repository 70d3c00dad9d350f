//! Required CSV columns per destination and order kind.
//!
//! Column names are stored in their lower-case canonical form. Case-insensitive
//! comparison is the caller's job (see [`crate::headers`]).

use crate::{Destination, OrderKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("No schema registered for {destination} {kind}")]
pub struct SchemaNotFound {
    pub destination: Destination,
    pub kind: OrderKind,
}

const VIRTUAL_BLOCK: &[&str] = &["node", "he", "tranche", "mw", "price", "is_block"];
const VIRTUAL_PLAIN: &[&str] = &["node", "he", "tranche", "mw", "price"];
const VIRTUAL_WITH_NODE_ID: &[&str] = &["node", "node_id", "he", "tranche", "mw", "price"];

const ERCOT_SPREAD: &[&str] = &["source", "sink", "he", "tranche", "mw", "price", "is_block"];
const PJMISO_SPREAD: &[&str] = &[
    "source",
    "source_id",
    "sink",
    "sink_id",
    "he",
    "tranche",
    "mw",
    "price",
];

const REGISTRY: &[(Destination, OrderKind, &[&str])] = &[
    (Destination::Ercot, OrderKind::Virtual, VIRTUAL_BLOCK),
    (Destination::Ercot, OrderKind::Spread, ERCOT_SPREAD),
    (Destination::Pjmiso, OrderKind::Virtual, VIRTUAL_WITH_NODE_ID),
    (Destination::Pjmiso, OrderKind::Spread, PJMISO_SPREAD),
    (Destination::Sppiso, OrderKind::Virtual, VIRTUAL_BLOCK),
    (Destination::Miso, OrderKind::Virtual, VIRTUAL_PLAIN),
    (Destination::Caiso, OrderKind::Virtual, VIRTUAL_PLAIN),
    (Destination::Nyiso, OrderKind::Virtual, VIRTUAL_PLAIN),
    (Destination::Neiso, OrderKind::Virtual, VIRTUAL_WITH_NODE_ID),
];

pub fn lookup(
    destination: Destination,
    kind: OrderKind,
) -> Result<&'static [&'static str], SchemaNotFound> {
    REGISTRY
        .iter()
        .find(|(d, k, _)| *d == destination && *k == kind)
        .map(|(_, _, columns)| *columns)
        .ok_or(SchemaNotFound { destination, kind })
}
