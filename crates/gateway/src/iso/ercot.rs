use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use super::VIRTUAL_AND_SPREAD_OPERATIONS;
use crate::Destination;
use crate::adapter::{Adapter, AdapterError, Credentials, Endpoint, Operation, PasswordPolicy};
use crate::order::{TypedOrder, ValidationRequest, WithdrawalOrder};
use crate::row::{RowError, RowReader};
use crate::transport::{HttpReply, Transport};

pub(crate) const OPERATIONS: &[Operation] = VIRTUAL_AND_SPREAD_OPERATIONS;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualOrder {
    pub node: String,
    pub he: String,
    pub tranche: i64,
    pub mw: f64,
    pub price: f64,
    pub is_block: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadOrder {
    pub source: String,
    pub sink: String,
    pub he: String,
    pub tranche: i64,
    pub mw: f64,
    pub price: f64,
    pub is_block: bool,
}

pub(crate) fn virtual_order(row: &RowReader<'_>) -> Result<TypedOrder, RowError> {
    Ok(TypedOrder::ErcotVirtual(VirtualOrder {
        node: row.text("node")?,
        he: row.text("he")?,
        tranche: row.int("tranche")?,
        mw: row.float("mw")?,
        price: row.float("price")?,
        is_block: row.flag("is_block")?,
    }))
}

pub(crate) fn spread_order(row: &RowReader<'_>) -> Result<TypedOrder, RowError> {
    Ok(TypedOrder::ErcotSpread(SpreadOrder {
        source: row.text("source")?,
        sink: row.text("sink")?,
        he: row.text("he")?,
        tranche: row.int("tranche")?,
        mw: row.float("mw")?,
        price: row.float("price")?,
        is_block: row.flag("is_block")?,
    }))
}

/// ERCOT virtuals and spreads. Withdrawals clear the whole book for the trade date.
#[derive(Debug, Clone)]
pub struct Ercot {
    endpoint: Endpoint,
}

impl Ercot {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: Endpoint::new(transport, Destination::Ercot),
        }
    }
}

#[async_trait]
impl Adapter for Ercot {
    fn destination(&self) -> Destination {
        Destination::Ercot
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

    async fn submit_spreads(
        &self,
        credentials: &Credentials,
        orders: &[TypedOrder],
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_orders(
                Operation::SubmitSpreads,
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

    async fn withdraw_spreads(
        &self,
        credentials: &Credentials,
        _identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_book_withdrawal(Operation::WithdrawSpreads, credentials)
            .await
    }
}
