use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::PlainVirtual;
use crate::Destination;
use crate::adapter::{Adapter, AdapterError, Credentials, Endpoint, Operation, PasswordPolicy};
use crate::order::{TypedOrder, ValidationRequest, WithdrawalOrder};
use crate::row::{RowError, RowReader};
use crate::transport::{HttpReply, Transport};

pub(crate) const OPERATIONS: &[Operation] = &[
    Operation::ValidateVirtuals,
    Operation::SubmitBids,
    Operation::SubmitOffers,
    Operation::WithdrawBids,
    Operation::WithdrawOffers,
    Operation::SplitSubmission,
    Operation::SplitWithdrawal,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualWithdrawal {
    pub node: String,
}

pub(crate) fn virtual_order(row: &RowReader<'_>) -> Result<TypedOrder, RowError> {
    PlainVirtual::from_row(row).map(TypedOrder::MisoVirtual)
}

pub(crate) fn virtual_withdrawal(row: &RowReader<'_>) -> Result<WithdrawalOrder, RowError> {
    Ok(WithdrawalOrder::MisoVirtual(VirtualWithdrawal {
        node: row.text("node")?,
    }))
}

#[derive(Debug, Clone)]
pub struct Miso {
    endpoint: Endpoint,
}

impl Miso {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: Endpoint::new(transport, Destination::Miso),
        }
    }
}

#[async_trait]
impl Adapter for Miso {
    fn destination(&self) -> Destination {
        Destination::Miso
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

    async fn split_submission(
        &self,
        credentials: &Credentials,
        orders: &[TypedOrder],
    ) -> Result<Vec<Vec<PlainVirtual>>, AdapterError> {
        self.endpoint
            .split_orders(Operation::SplitSubmission, credentials, orders)
            .await
    }

    async fn split_withdrawal(
        &self,
        credentials: &Credentials,
        identifiers: &[WithdrawalOrder],
    ) -> Result<Vec<Vec<VirtualWithdrawal>>, AdapterError> {
        self.endpoint
            .split_identifiers(Operation::SplitWithdrawal, credentials, identifiers)
            .await
    }
}
