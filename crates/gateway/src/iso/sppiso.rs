use async_trait::async_trait;
use std::sync::Arc;

use super::{PlainVirtual, VIRTUAL_OPERATIONS};
use crate::Destination;
use crate::adapter::{Adapter, AdapterError, Credentials, Endpoint, Operation, PasswordPolicy};
use crate::order::{TypedOrder, ValidationRequest, WithdrawalOrder};
use crate::row::{RowError, RowReader};
use crate::transport::{HttpReply, Transport};

pub(crate) const OPERATIONS: &[Operation] = VIRTUAL_OPERATIONS;

/// SPP uploads carry an `is_block` column, but the API has no such field.
pub(crate) fn virtual_order(row: &RowReader<'_>) -> Result<TypedOrder, RowError> {
    PlainVirtual::from_row(row).map(TypedOrder::SppisoVirtual)
}

/// SPPISO virtuals. Withdrawals clear the whole book for the trade date.
#[derive(Debug, Clone)]
pub struct Sppiso {
    endpoint: Endpoint,
}

impl Sppiso {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: Endpoint::new(transport, Destination::Sppiso),
        }
    }
}

#[async_trait]
impl Adapter for Sppiso {
    fn destination(&self) -> Destination {
        Destination::Sppiso
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
                PasswordPolicy::NotUsed,
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
                PasswordPolicy::NotUsed,
                credentials,
                orders,
            )
            .await
    }

    async fn withdraw_bids(
        &self,
        credentials: &Credentials,
        _identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_book_withdrawal(Operation::WithdrawBids, credentials)
            .await
    }

    async fn withdraw_offers(
        &self,
        credentials: &Credentials,
        _identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_book_withdrawal(Operation::WithdrawOffers, credentials)
            .await
    }
}
