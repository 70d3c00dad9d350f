use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info};

use crate::iso::{PlainVirtual, miso};
use crate::order::{TypedOrder, ValidationRequest, WithdrawalOrder};
use crate::transport::{HttpReply, Transport, TransportError};
use crate::{Destination, OrderKind, iso};

pub const ACCOUNT_NAME_HEADER: &str = "x-account-name";
pub const ACCOUNT_PASSWORD_HEADER: &str = "x-account-password";
pub const TRADE_DATE_HEADER: &str = "x-trade-date";

/// A single API call a destination may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ValidateVirtuals,
    ValidateSpreads,
    SubmitBids,
    SubmitOffers,
    SubmitSpreads,
    WithdrawBids,
    WithdrawOffers,
    WithdrawSpreads,
    SplitSubmission,
    SplitWithdrawal,
}

impl Operation {
    /// Path tail after `{destination}/v1/`.
    pub const fn path(self) -> &'static str {
        match self {
            Self::ValidateVirtuals => "validation/virtuals",
            Self::ValidateSpreads => "validation/spreads",
            Self::SubmitBids => "submit/virtual-bids",
            Self::SubmitOffers => "submit/virtual-offers",
            Self::SubmitSpreads => "submit/spreads",
            Self::WithdrawBids => "withdraw/virtual-bids",
            Self::WithdrawOffers => "withdraw/virtual-offers",
            Self::WithdrawSpreads => "withdraw/spreads",
            Self::SplitSubmission => "submit/split-transactions",
            Self::SplitWithdrawal => "withdraw/split-transactions",
        }
    }

    pub const fn kind(self) -> OrderKind {
        match self {
            Self::ValidateSpreads | Self::SubmitSpreads | Self::WithdrawSpreads => {
                OrderKind::Spread
            }
            _ => OrderKind::Virtual,
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Header-carried identity of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub account_name: String,
    pub password: Option<String>,
    pub trade_date: NaiveDate,
}

/// Whether a destination sends `X-Account-Password` on a given call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPolicy {
    Required,
    NotUsed,
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("{operation} is not supported by {destination}")]
    Unsupported {
        destination: Destination,
        operation: Operation,
    },
    #[error("Password is required for {destination} submissions")]
    PasswordRequired { destination: Destination },
    #[error("{operation} payload does not belong to {destination}")]
    PayloadMismatch {
        destination: Destination,
        operation: Operation,
    },
    #[error("{destination} {operation} reply has an unexpected shape: {source}")]
    InvalidReply {
        destination: Destination,
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to create header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
    #[error("JSON serialization failed: {0}")]
    JsonSerialization(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Uniform capability surface of one destination API.
///
/// Every method issues at most one POST. Spread and split-transaction methods
/// are unsupported unless a destination overrides them.
#[async_trait]
pub trait Adapter: Send + Sync + std::fmt::Debug {
    fn destination(&self) -> Destination;

    async fn validate(
        &self,
        credentials: &Credentials,
        request: &ValidationRequest,
    ) -> Result<HttpReply, AdapterError>;

    async fn submit_bids(
        &self,
        credentials: &Credentials,
        orders: &[TypedOrder],
    ) -> Result<HttpReply, AdapterError>;

    async fn submit_offers(
        &self,
        credentials: &Credentials,
        orders: &[TypedOrder],
    ) -> Result<HttpReply, AdapterError>;

    async fn submit_spreads(
        &self,
        _credentials: &Credentials,
        _orders: &[TypedOrder],
    ) -> Result<HttpReply, AdapterError> {
        Err(AdapterError::Unsupported {
            destination: self.destination(),
            operation: Operation::SubmitSpreads,
        })
    }

    async fn withdraw_bids(
        &self,
        credentials: &Credentials,
        identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError>;

    async fn withdraw_offers(
        &self,
        credentials: &Credentials,
        identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError>;

    async fn withdraw_spreads(
        &self,
        _credentials: &Credentials,
        _identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError> {
        Err(AdapterError::Unsupported {
            destination: self.destination(),
            operation: Operation::WithdrawSpreads,
        })
    }

    /// Asks the destination how it would batch `orders`. Nothing is submitted.
    async fn split_submission(
        &self,
        _credentials: &Credentials,
        _orders: &[TypedOrder],
    ) -> Result<Vec<Vec<PlainVirtual>>, AdapterError> {
        Err(AdapterError::Unsupported {
            destination: self.destination(),
            operation: Operation::SplitSubmission,
        })
    }

    async fn split_withdrawal(
        &self,
        _credentials: &Credentials,
        _identifiers: &[WithdrawalOrder],
    ) -> Result<Vec<Vec<miso::VirtualWithdrawal>>, AdapterError> {
        Err(AdapterError::Unsupported {
            destination: self.destination(),
            operation: Operation::SplitWithdrawal,
        })
    }
}

/// Shared request plumbing for the per-destination adapters.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    transport: Arc<dyn Transport>,
    destination: Destination,
}

impl Endpoint {
    pub(crate) fn new(transport: Arc<dyn Transport>, destination: Destination) -> Self {
        Self {
            transport,
            destination,
        }
    }

    pub(crate) const fn unsupported(&self, operation: Operation) -> AdapterError {
        AdapterError::Unsupported {
            destination: self.destination,
            operation,
        }
    }

    fn headers(
        &self,
        policy: PasswordPolicy,
        credentials: &Credentials,
    ) -> Result<HeaderMap, AdapterError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(ACCOUNT_NAME_HEADER),
            HeaderValue::from_str(&credentials.account_name)?,
        );

        if policy == PasswordPolicy::Required {
            let password = credentials
                .password
                .as_deref()
                .filter(|password| !password.is_empty())
                .ok_or(AdapterError::PasswordRequired {
                    destination: self.destination,
                })?;
            let mut value = HeaderValue::from_str(password)?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(ACCOUNT_PASSWORD_HEADER), value);
        }

        headers.insert(
            HeaderName::from_static(TRADE_DATE_HEADER),
            HeaderValue::from_str(&credentials.trade_date.format("%Y-%m-%d").to_string())?,
        );

        Ok(headers)
    }

    async fn send<B: Serialize + Sync + ?Sized>(
        &self,
        operation: Operation,
        policy: PasswordPolicy,
        credentials: &Credentials,
        body: &B,
    ) -> Result<HttpReply, AdapterError> {
        if !iso::operations(self.destination).contains(&operation) {
            return Err(self.unsupported(operation));
        }

        let headers = self.headers(policy, credentials)?;
        let body = serde_json::to_value(body)?;
        let path = format!("{}/v1/{}", self.destination.path_segment(), operation.path());

        info!(
            destination = %self.destination,
            account = %credentials.account_name,
            trade_date = %credentials.trade_date,
            "Sending {operation}"
        );

        let reply = self.transport.post(&path, body, headers).await?;
        debug!("{} {operation} answered with status {}", self.destination, reply.status);
        Ok(reply)
    }

    fn ensure_orders<'a>(
        &self,
        operation: Operation,
        orders: impl IntoIterator<Item = &'a TypedOrder>,
    ) -> Result<(), AdapterError> {
        let kind = operation.kind();
        if orders
            .into_iter()
            .all(|order| order.destination() == self.destination && order.kind() == kind)
        {
            Ok(())
        } else {
            Err(AdapterError::PayloadMismatch {
                destination: self.destination,
                operation,
            })
        }
    }

    pub(crate) async fn send_orders(
        &self,
        operation: Operation,
        policy: PasswordPolicy,
        credentials: &Credentials,
        orders: &[TypedOrder],
    ) -> Result<HttpReply, AdapterError> {
        self.ensure_orders(operation, orders)?;
        self.send(operation, policy, credentials, orders).await
    }

    pub(crate) async fn send_validation(
        &self,
        policy: PasswordPolicy,
        credentials: &Credentials,
        request: &ValidationRequest,
    ) -> Result<HttpReply, AdapterError> {
        let operation = request.operation();
        self.ensure_orders(operation, request.orders())?;
        self.send(operation, policy, credentials, request).await
    }

    /// Withdrawal naming individual orders; no identifiers sends an empty list.
    pub(crate) async fn send_identifiers(
        &self,
        operation: Operation,
        policy: PasswordPolicy,
        credentials: &Credentials,
        identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError> {
        let identifiers = identifiers.unwrap_or_default();
        self.ensure_identifiers(operation, identifiers)?;
        self.send(operation, policy, credentials, identifiers).await
    }

    fn ensure_identifiers(
        &self,
        operation: Operation,
        identifiers: &[WithdrawalOrder],
    ) -> Result<(), AdapterError> {
        let kind = operation.kind();
        if identifiers
            .iter()
            .all(|id| id.destination() == self.destination && id.kind() == kind)
        {
            Ok(())
        } else {
            Err(AdapterError::PayloadMismatch {
                destination: self.destination,
                operation,
            })
        }
    }

    /// Split request for orders; the reply lists the batches the destination
    /// would submit.
    pub(crate) async fn split_orders<T: DeserializeOwned>(
        &self,
        operation: Operation,
        credentials: &Credentials,
        orders: &[TypedOrder],
    ) -> Result<Vec<Vec<T>>, AdapterError> {
        self.ensure_orders(operation, orders)?;
        let reply = self
            .send(operation, PasswordPolicy::NotUsed, credentials, orders)
            .await?;
        self.batches(operation, reply)
    }

    pub(crate) async fn split_identifiers<T: DeserializeOwned>(
        &self,
        operation: Operation,
        credentials: &Credentials,
        identifiers: &[WithdrawalOrder],
    ) -> Result<Vec<Vec<T>>, AdapterError> {
        self.ensure_identifiers(operation, identifiers)?;
        let reply = self
            .send(operation, PasswordPolicy::NotUsed, credentials, identifiers)
            .await?;
        self.batches(operation, reply)
    }

    fn batches<T: DeserializeOwned>(
        &self,
        operation: Operation,
        reply: HttpReply,
    ) -> Result<Vec<Vec<T>>, AdapterError> {
        let batches: Vec<Vec<T>> =
            serde_json::from_value(reply.body).map_err(|source| AdapterError::InvalidReply {
                destination: self.destination,
                operation,
                source,
            })?;
        debug!("{} {operation} proposed {} batches", self.destination, batches.len());
        Ok(batches)
    }

    /// Withdrawal of a whole book: the body is always `{}`.
    pub(crate) async fn send_book_withdrawal(
        &self,
        operation: Operation,
        credentials: &Credentials,
    ) -> Result<HttpReply, AdapterError> {
        self.send(
            operation,
            PasswordPolicy::NotUsed,
            credentials,
            &serde_json::Map::new(),
        )
        .await
    }
}

/// One adapter per destination, all sharing a transport.
#[derive(Debug, Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<Destination, Arc<dyn Adapter>>,
}

impl AdapterSet {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Destination::ALL
            .into_iter()
            .map(|destination| iso::adapter(destination, transport.clone()))
            .fold(Self::default(), Self::with)
    }

    /// Registers `adapter` for its destination, replacing any previous one.
    #[must_use]
    pub fn with(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapters.insert(adapter.destination(), adapter);
        self
    }

    pub fn get(&self, destination: Destination) -> Option<&Arc<dyn Adapter>> {
        self.adapters.get(&destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::RecordingTransport;

    fn credentials(password: Option<&str>) -> Credentials {
        Credentials {
            account_name: "TRADER1".to_string(),
            password: password.map(str::to_string),
            trade_date: NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(),
        }
    }

    #[test]
    fn test_operation_paths() {
        assert_eq!(Operation::SubmitBids.path(), "submit/virtual-bids");
        assert_eq!(Operation::WithdrawOffers.path(), "withdraw/virtual-offers");
        assert_eq!(Operation::ValidateSpreads.path(), "validation/spreads");
        assert_eq!(Operation::SubmitSpreads.kind(), OrderKind::Spread);
        assert_eq!(Operation::WithdrawBids.kind(), OrderKind::Virtual);
        assert_eq!(Operation::SplitSubmission.path(), "submit/split-transactions");
        assert_eq!(Operation::SplitWithdrawal.kind(), OrderKind::Virtual);
    }

    #[test]
    fn test_headers_without_password() {
        let endpoint = Endpoint::new(Arc::new(RecordingTransport::ok()), Destination::Caiso);
        let headers = endpoint
            .headers(PasswordPolicy::NotUsed, &credentials(Some("ignored")))
            .unwrap();

        assert_eq!(headers.get(ACCOUNT_NAME_HEADER).unwrap(), "TRADER1");
        assert_eq!(headers.get(TRADE_DATE_HEADER).unwrap(), "2030-01-15");
        assert!(headers.get(ACCOUNT_PASSWORD_HEADER).is_none());
    }

    #[test]
    fn test_headers_with_required_password() {
        let endpoint = Endpoint::new(Arc::new(RecordingTransport::ok()), Destination::Pjmiso);
        let headers = endpoint
            .headers(PasswordPolicy::Required, &credentials(Some("hunter2")))
            .unwrap();

        let password = headers.get(ACCOUNT_PASSWORD_HEADER).unwrap();
        assert_eq!(password, "hunter2");
        assert!(password.is_sensitive());
    }

    #[test]
    fn test_headers_missing_required_password() {
        let endpoint = Endpoint::new(Arc::new(RecordingTransport::ok()), Destination::Nyiso);
        for password in [None, Some("")] {
            assert!(matches!(
                endpoint
                    .headers(PasswordPolicy::Required, &credentials(password))
                    .unwrap_err(),
                AdapterError::PasswordRequired {
                    destination: Destination::Nyiso
                }
            ));
        }
    }

    #[test]
    fn test_headers_reject_invalid_account_name() {
        let endpoint = Endpoint::new(Arc::new(RecordingTransport::ok()), Destination::Miso);
        let mut creds = credentials(None);
        creds.account_name = "bad\nname".to_string();
        assert!(matches!(
            endpoint
                .headers(PasswordPolicy::NotUsed, &creds)
                .unwrap_err(),
            AdapterError::InvalidHeader(_)
        ));
    }

    #[tokio::test]
    async fn test_book_withdrawal_sends_empty_object() {
        let transport = Arc::new(RecordingTransport::ok());
        let endpoint = Endpoint::new(transport.clone(), Destination::Sppiso);

        endpoint
            .send_book_withdrawal(Operation::WithdrawBids, &credentials(None))
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "sppiso/v1/withdraw/virtual-bids");
        assert_eq!(calls[0].body, serde_json::json!({}));
    }

    #[test]
    fn test_adapter_set_covers_every_destination() {
        let set = AdapterSet::new(Arc::new(RecordingTransport::ok()));
        for destination in Destination::ALL {
            assert_eq!(set.get(destination).unwrap().destination(), destination);
        }
    }

    #[tokio::test]
    async fn test_split_transactions_only_on_miso() {
        let transport = Arc::new(RecordingTransport::ok());
        let set = AdapterSet::new(transport.clone());

        for destination in Destination::ALL {
            if destination == Destination::Miso {
                continue;
            }
            let adapter = set.get(destination).unwrap();
            assert!(matches!(
                adapter.split_submission(&credentials(None), &[]).await.unwrap_err(),
                AdapterError::Unsupported {
                    operation: Operation::SplitSubmission,
                    ..
                }
            ));
            assert!(matches!(
                adapter.split_withdrawal(&credentials(None), &[]).await.unwrap_err(),
                AdapterError::Unsupported {
                    operation: Operation::SplitWithdrawal,
                    ..
                }
            ));
        }
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_empty_adapter_set() {
        assert!(AdapterSet::default().get(Destination::Ercot).is_none());
    }
}
