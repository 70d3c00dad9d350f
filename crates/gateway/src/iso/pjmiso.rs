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

/// Every PJM call carries the account password, validation included.
const POLICY: PasswordPolicy = PasswordPolicy::Required;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualOrder {
    pub node: String,
    /// PJM pnode ids are sent as text.
    pub node_id: String,
    pub he: String,
    pub tranche: i64,
    pub mw: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadOrder {
    pub source: String,
    pub source_id: i64,
    pub sink: String,
    pub sink_id: i64,
    pub he: String,
    pub tranche: i64,
    pub mw: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualWithdrawal {
    pub node: String,
    pub node_id: String,
    pub he: String,
    pub tranche: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpreadWithdrawal {
    pub source: String,
    pub source_id: i64,
    pub sink: String,
    pub sink_id: i64,
    pub he: String,
    pub tranche: i64,
}

pub(crate) fn virtual_order(row: &RowReader<'_>) -> Result<TypedOrder, RowError> {
    Ok(TypedOrder::PjmisoVirtual(VirtualOrder {
        node: row.text("node")?,
        node_id: row.text("node_id")?,
        he: row.text("he")?,
        tranche: row.int("tranche")?,
        mw: row.float("mw")?,
        price: row.float("price")?,
    }))
}

pub(crate) fn spread_order(row: &RowReader<'_>) -> Result<TypedOrder, RowError> {
    Ok(TypedOrder::PjmisoSpread(SpreadOrder {
        source: row.text("source")?,
        source_id: row.int("source_id")?,
        sink: row.text("sink")?,
        sink_id: row.int("sink_id")?,
        he: row.text("he")?,
        tranche: row.int("tranche")?,
        mw: row.float("mw")?,
        price: row.float("price")?,
    }))
}

pub(crate) fn virtual_withdrawal(row: &RowReader<'_>) -> Result<WithdrawalOrder, RowError> {
    Ok(WithdrawalOrder::PjmisoVirtual(VirtualWithdrawal {
        node: row.text("node")?,
        node_id: row.text("node_id")?,
        he: row.text("he")?,
        tranche: row.int("tranche")?,
    }))
}

pub(crate) fn spread_withdrawal(row: &RowReader<'_>) -> Result<WithdrawalOrder, RowError> {
    Ok(WithdrawalOrder::PjmisoSpread(SpreadWithdrawal {
        source: row.text("source")?,
        source_id: row.int("source_id")?,
        sink: row.text("sink")?,
        sink_id: row.int("sink_id")?,
        he: row.text("he")?,
        tranche: row.int("tranche")?,
    }))
}

#[derive(Debug, Clone)]
pub struct Pjmiso {
    endpoint: Endpoint,
}

impl Pjmiso {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: Endpoint::new(transport, Destination::Pjmiso),
        }
    }
}

#[async_trait]
impl Adapter for Pjmiso {
    fn destination(&self) -> Destination {
        Destination::Pjmiso
    }

    async fn validate(
        &self,
        credentials: &Credentials,
        request: &ValidationRequest,
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_validation(POLICY, credentials, request)
            .await
    }

    async fn submit_bids(
        &self,
        credentials: &Credentials,
        orders: &[TypedOrder],
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_orders(Operation::SubmitBids, POLICY, credentials, orders)
            .await
    }

    async fn submit_offers(
        &self,
        credentials: &Credentials,
        orders: &[TypedOrder],
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_orders(Operation::SubmitOffers, POLICY, credentials, orders)
            .await
    }

    async fn submit_spreads(
        &self,
        credentials: &Credentials,
        orders: &[TypedOrder],
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_orders(Operation::SubmitSpreads, POLICY, credentials, orders)
            .await
    }

    async fn withdraw_bids(
        &self,
        credentials: &Credentials,
        identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_identifiers(Operation::WithdrawBids, POLICY, credentials, identifiers)
            .await
    }

    async fn withdraw_offers(
        &self,
        credentials: &Credentials,
        identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_identifiers(Operation::WithdrawOffers, POLICY, credentials, identifiers)
            .await
    }

    async fn withdraw_spreads(
        &self,
        credentials: &Credentials,
        identifiers: Option<&[WithdrawalOrder]>,
    ) -> Result<HttpReply, AdapterError> {
        self.endpoint
            .send_identifiers(Operation::WithdrawSpreads, POLICY, credentials, identifiers)
            .await
    }
}
