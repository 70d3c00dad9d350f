use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use super::{PlainVirtual, VIRTUAL_OPERATIONS};
use crate::Destination;
use crate::adapter::{Adapter, AdapterError, Credentials, Endpoint, Operation, PasswordPolicy};
use crate::order::{TypedOrder, ValidationRequest, WithdrawalOrder};
use crate::row::{RowError, RowReader};
use crate::transport::{HttpReply, Transport};

pub(crate) const OPERATIONS: &[Operation] = VIRTUAL_OPERATIONS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualWithdrawal {
    pub node: String,
}

pub(crate) fn virtual_order(row: &RowReader<'_>) -> Result<TypedOrder, RowError> {
    PlainVirtual::from_row(row).map(TypedOrder::NyisoVirtual)
}

pub(crate) fn virtual_withdrawal(row: &RowReader<'_>) -> Result<WithdrawalOrder, RowError> {
    Ok(WithdrawalOrder::NyisoVirtual(VirtualWithdrawal {
        node: row.text("node")?,
    }))
}

/// NYISO virtuals. Submissions and withdrawals need the account password;
/// validation does not send it.
#[derive(Debug, Clone)]
pub struct Nyiso {
    endpoint: Endpoint,
}

impl Nyiso {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: Endpoint::new(transport, Destination::Nyiso),
        }
    }
}

#[async_trait]
impl Adapter for Nyiso {
    fn destination(&self) -> Destination {
        Destination::Nyiso
    }

    async fn validate(
        &self,
        credentials: &Credentials,
        request: &ValidationRequest,
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_validation(PasswordPolicy::NotUsed, credentials, request)
            .await
    }

    async fn submit_bids(
        &self,
        credentials: &Credentials,
        orders: &[TypedOrder],
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_orders(
                Operation::SubmitBids,
                PasswordPolicy::Required,
                credentials,
                orders,
            )
            .await
    }

    async fn submit_offers(
        &self,
        credentials: &Credentials,
        orders: &[TypedOrder],
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_orders(
                Operation::SubmitOffers,
                PasswordPolicy::Required,
                credentials,
                orders,
            )
            .await
    }

    async fn withdraw_bids(
        &self,
        credentials: &Credentials,
        identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_identifiers(
                Operation::WithdrawBids,
                PasswordPolicy::Required,
                credentials,
                identifiers,
            )
            .await
    }

    async fn withdraw_offers(
        &self,
        credentials: &Credentials,
        identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_identifiers(
                Operation::WithdrawOffers,
                PasswordPolicy::Required,
                credentials,
                identifiers,
            )
            .await
    }
}
