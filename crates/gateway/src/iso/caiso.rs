use async_trait::async_trait;
use std::sync::Arc;

use super::{PlainVirtual, VIRTUAL_OPERATIONS};
use crate::Destination;
use crate::adapter::{Adapter, AdapterError, Credentials, Endpoint, Operation, PasswordPolicy};
use crate::order::{TypedOrder, ValidationRequest, WithdrawalOrder};
use crate::row::{RowError, RowReader};
use crate::transport::{HttpReply, Transport};

pub(crate) const OPERATIONS: &[Operation] = VIRTUAL_OPERATIONS;

pub(crate) fn virtual_order(row: &RowReader<'_>) -> Result<TypedOrder, RowError> {
    PlainVirtual::from_row(row).map(TypedOrder::CaisoVirtual)
}

/// CAISO virtuals. Withdrawals clear the whole book for the trade date.
#[derive(Debug, Clone)]
pub struct Caiso {
    endpoint: Endpoint,
}

impl Caiso {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: Endpoint::new(transport, Destination::Caiso),
        }
    }
}

#[async_trait]
impl Adapter for Caiso {
    fn destination(&self) -> Destination {
        Destination::Caiso
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
