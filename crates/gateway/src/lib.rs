use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod adapter;
pub mod error;
pub mod headers;
pub mod iso;
pub mod normalize;
pub mod order;
pub mod row;
pub mod schema;
pub mod serializer;
pub mod submission;
pub mod transport;

pub use adapter::{Adapter, AdapterError, AdapterSet, Credentials, Operation};
pub use error::{ErrorKind, PolicyError, SubmissionError};
pub use headers::{HeaderCheck, HeaderDiagnostic};
pub use normalize::{ApiResponse, SubmissionResult};
pub use order::{TypedOrder, ValidationRequest, WithdrawalOrder};
pub use row::{RawRow, RowError};
pub use submission::{Attempt, SubmissionContext, SubmissionState, Submitter};
pub use transport::{GatewayEnv, HttpReply, ReqwestTransport, Transport, TransportError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid destination: {0}")]
pub struct InvalidDestinationError(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid product: {0}. Expected one of: Virtual Bid, Virtual Offer, UTC/Spread")]
pub struct InvalidProductError(String);

/// Regional grid operators accepting order submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Destination {
    Ercot,
    Pjmiso,
    Neiso,
    Caiso,
    Miso,
    Nyiso,
    Sppiso,
}

impl Destination {
    pub const ALL: [Self; 7] = [
        Self::Ercot,
        Self::Pjmiso,
        Self::Neiso,
        Self::Caiso,
        Self::Miso,
        Self::Nyiso,
        Self::Sppiso,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ercot => "ERCOT",
            Self::Pjmiso => "PJMISO",
            Self::Neiso => "NEISO",
            Self::Caiso => "CAISO",
            Self::Miso => "MISO",
            Self::Nyiso => "NYISO",
            Self::Sppiso => "SPPISO",
        }
    }

    /// Lower-case prefix of every API path for this destination.
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Ercot => "ercot",
            Self::Pjmiso => "pjmiso",
            Self::Neiso => "neiso",
            Self::Caiso => "caiso",
            Self::Miso => "miso",
            Self::Nyiso => "nyiso",
            Self::Sppiso => "sppiso",
        }
    }

    pub const fn supports_spreads(self) -> bool {
        matches!(self, Self::Ercot | Self::Pjmiso)
    }

    /// Whether the destination authenticates submissions with an account password.
    pub const fn requires_password(self) -> bool {
        matches!(self, Self::Pjmiso | Self::Nyiso)
    }

    /// Whether `action` sends `X-Account-Password`. NYISO skips it on validation.
    pub const fn requires_password_for(self, action: Action) -> bool {
        self.requires_password() && !matches!((self, action), (Self::Nyiso, Action::Validate))
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Destination {
    type Err = InvalidDestinationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|destination| destination.as_str() == normalized)
            .ok_or_else(|| InvalidDestinationError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Virtual,
    Spread,
}

impl OrderKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Virtual => "VIRTUAL",
            Self::Spread => "SPREAD",
        }
    }
}

impl Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the trader picked to trade: a virtual bid, a virtual offer or a spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    VirtualBid,
    VirtualOffer,
    Spread,
}

impl Product {
    pub const ALL: [Self; 3] = [Self::VirtualBid, Self::VirtualOffer, Self::Spread];

    pub const fn kind(self) -> OrderKind {
        match self {
            Self::VirtualBid | Self::VirtualOffer => OrderKind::Virtual,
            Self::Spread => OrderKind::Spread,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VirtualBid => "Virtual Bid",
            Self::VirtualOffer => "Virtual Offer",
            Self::Spread => "UTC/Spread",
        }
    }
}

impl Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Product {
    type Err = InvalidProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "virtual bid" | "virtualbid" => Ok(Self::VirtualBid),
            "virtual offer" | "virtualoffer" => Ok(Self::VirtualOffer),
            "utc/spread" | "spread" | "utc spread" => Ok(Self::Spread),
            _ => Err(InvalidProductError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Submit,
    Withdraw,
    Validate,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit => write!(f, "submit"),
            Self::Withdraw => write!(f, "withdraw"),
            Self::Validate => write!(f, "validate"),
        }
    }
}
