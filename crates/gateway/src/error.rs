use serde::{Deserialize, Serialize};

use crate::adapter::{AdapterError, Operation};
use crate::headers::HeaderDiagnostic;
use crate::row::RowError;
use crate::serializer::SerializeError;
use crate::transport::TransportError;
use crate::{Action, Destination, OrderKind, Product};

/// Failure category carried on every unsuccessful [`crate::SubmissionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Configuration,
    Validation,
    Parse,
    Transport,
    Policy,
}

/// Reasons an attempt is refused before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Select a destination ISO")]
    MissingDestination,
    #[error("Select a product")]
    MissingProduct,
    #[error("Select an account")]
    MissingAccount,
    #[error("Account name must be printable ASCII")]
    InvalidAccountName,
    #[error("Select a trade date")]
    MissingTradeDate,
    #[error("Trade date {trade_date} must be after {today}")]
    TradeDateNotInFuture {
        trade_date: chrono::NaiveDate,
        today: chrono::NaiveDate,
    },
    #[error("Password is required for {destination} submissions")]
    PasswordRequired { destination: Destination },
    #[error("Password must be printable ASCII")]
    InvalidPassword,
    #[error("Account credentials cannot be sent as request headers")]
    InvalidCredentials,
    #[error("Upload at least one row")]
    NoRows,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Configuration(String),
    #[error("Header validation failed: {}", .0.summary())]
    Validation(HeaderDiagnostic),
    #[error(transparent)]
    Parse(#[from] RowError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl SubmissionError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Policy(_) => ErrorKind::Policy,
        }
    }

    pub fn unsupported_route(destination: Destination, product: Product, action: Action) -> Self {
        Self::Configuration(format!(
            "{action} {product} is not supported by {destination}"
        ))
    }

    pub fn no_rules(destination: Destination, kind: OrderKind) -> Self {
        Self::Configuration(format!(
            "No validation rules are registered for {destination} {kind}"
        ))
    }

    pub fn unsupported_operation(destination: Destination, operation: Operation) -> Self {
        Self::Configuration(format!("{operation} is not supported by {destination}"))
    }
}

impl From<SerializeError> for SubmissionError {
    fn from(error: SerializeError) -> Self {
        match error {
            SerializeError::Unsupported { destination, kind } => Self::no_rules(destination, kind),
            SerializeError::Row(row) => Self::Parse(row),
        }
    }
}

impl From<AdapterError> for SubmissionError {
    fn from(error: AdapterError) -> Self {
        match error {
            AdapterError::Unsupported {
                destination,
                operation,
            } => Self::unsupported_operation(destination, operation),
            AdapterError::PasswordRequired { destination } => {
                Self::Policy(PolicyError::PasswordRequired { destination })
            }
            AdapterError::InvalidHeader(_) => Self::Policy(PolicyError::InvalidCredentials),
            AdapterError::PayloadMismatch { .. }
            | AdapterError::InvalidReply { .. }
            | AdapterError::JsonSerialization(_) => Self::Configuration(error.to_string()),
            AdapterError::Transport(transport) => Self::Transport(transport),
        }
    }
}
