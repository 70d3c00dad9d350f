use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use super::VIRTUAL_OPERATIONS;
use crate::Destination;
use crate::adapter::{Adapter, AdapterError, Credentials, Endpoint, Operation, PasswordPolicy};
use crate::order::{TypedOrder, ValidationRequest, WithdrawalOrder};
use crate::row::{RowError, RowReader};
use crate::transport::{HttpReply, Transport};

pub(crate) const OPERATIONS: &[Operation] = VIRTUAL_OPERATIONS;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualOrder {
    pub node: String,
    pub node_id: i64,
    pub he: String,
    pub tranche: i64,
    pub mw: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualWithdrawal {
    pub node: String,
    pub node_id: i64,
}

pub(crate) fn virtual_order(row: &RowReader<'_>) -> Result<TypedOrder, RowError> {
    Ok(TypedOrder::NeisoVirtual(VirtualOrder {
        node: row.text("node")?,
        node_id: row.int("node_id")?,
        he: row.text("he")?,
        tranche: row.int("tranche")?,
        mw: row.float("mw")?,
        price: row.float("price")?,
    }))
}

pub(crate) fn virtual_withdrawal(row: &RowReader<'_>) -> Result<WithdrawalOrder, RowError> {
    Ok(WithdrawalOrder::NeisoVirtual(VirtualWithdrawal {
        node: row.text("node")?,
        node_id: row.int("node_id")?,
    }))
}

#[derive(Debug, Clone)]
pub struct Neiso {
    endpoint: Endpoint,
}

impl Neiso {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: Endpoint::new(transport, Destination::Neiso),
        }
    }
}

#[async_trait]
impl Adapter for Neiso {
    fn destination(&self) -> Destination {
        Destination::Neiso
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
        identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_identifiers(
                Operation::WithdrawBids,
                PasswordPolicy::NotUsed,
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
                PasswordPolicy::NotUsed,
                credentials,
                identifiers,
            )
            .await
    }
}
