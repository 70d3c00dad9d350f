//! One submission attempt, from selection snapshot to [`SubmissionResult`].

use chrono::{NaiveDate, Utc};
use lazy_static::lazy_static;
use reqwest::header::HeaderValue;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapter::{Adapter, AdapterError, AdapterSet, Credentials, Operation};
use crate::error::{PolicyError, SubmissionError};
use crate::headers::{self, HeaderCheck};
use crate::normalize::{SubmissionResult, normalize};
use crate::order::{TypedOrder, ValidationRequest, WithdrawalOrder};
use crate::row::RawRow;
use crate::transport::HttpReply;
use crate::{Action, Destination, Product, iso, serializer};

type RouteKey = (Destination, Product, Action);

const fn operation_for(product: Product, action: Action) -> Operation {
    match (action, product) {
        (Action::Submit, Product::VirtualBid) => Operation::SubmitBids,
        (Action::Submit, Product::VirtualOffer) => Operation::SubmitOffers,
        (Action::Submit, Product::Spread) => Operation::SubmitSpreads,
        (Action::Withdraw, Product::VirtualBid) => Operation::WithdrawBids,
        (Action::Withdraw, Product::VirtualOffer) => Operation::WithdrawOffers,
        (Action::Withdraw, Product::Spread) => Operation::WithdrawSpreads,
        (Action::Validate, Product::VirtualBid | Product::VirtualOffer) => {
            Operation::ValidateVirtuals
        }
        (Action::Validate, Product::Spread) => Operation::ValidateSpreads,
    }
}

lazy_static! {
    static ref ROUTES: HashMap<RouteKey, Operation> = Destination::ALL
        .into_iter()
        .flat_map(|destination| {
            Product::ALL.into_iter().flat_map(move |product| {
                [Action::Submit, Action::Withdraw, Action::Validate]
                    .into_iter()
                    .map(move |action| {
                        ((destination, product, action), operation_for(product, action))
                    })
            })
        })
        .filter(|((destination, _, _), operation)| {
            iso::operations(*destination).contains(operation)
        })
        .collect();
}

/// The single adapter operation serving a selection, if the destination has one.
pub fn route(destination: Destination, product: Product, action: Action) -> Option<Operation> {
    ROUTES.get(&(destination, product, action)).copied()
}

/// Immutable snapshot of the trader's selections, taken when they hit submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionContext {
    pub destination: Option<Destination>,
    pub product: Option<Product>,
    pub action: Action,
    pub account_name: Option<String>,
    pub password: Option<String>,
    pub trade_date: Option<NaiveDate>,
    /// Uploaded header row, as written in the file.
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl SubmissionState {
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Validating)
                | (Self::Validating, Self::Submitting | Self::Failed)
                | (Self::Submitting, Self::Succeeded | Self::Failed)
        )
    }
}

impl Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validating => write!(f, "validating"),
            Self::Submitting => write!(f, "submitting"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Illegal submission state transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: SubmissionState,
    pub to: SubmissionState,
}

impl From<TransitionError> for SubmissionError {
    fn from(error: TransitionError) -> Self {
        Self::Configuration(error.to_string())
    }
}

/// Tracks the state of one attempt. A fresh attempt gets a fresh lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lifecycle {
    state: SubmissionState,
}

impl Lifecycle {
    pub const fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn transition(&mut self, next: SubmissionState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }

        debug!("Submission attempt {} -> {next}", self.state);
        self.state = next;
        Ok(())
    }
}

/// A settled attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub state: SubmissionState,
    pub result: SubmissionResult,
}

#[derive(Debug)]
enum Call {
    Validate(ValidationRequest),
    Submit(Operation, Vec<TypedOrder>),
    Withdraw(Operation, Option<Vec<WithdrawalOrder>>),
}

#[derive(Debug)]
struct Plan {
    destination: Destination,
    credentials: Credentials,
    call: Call,
}

fn is_header_safe(value: &str) -> bool {
    HeaderValue::from_str(value).is_ok()
}

fn required_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Everything that can be decided without the network.
fn plan(context: &SubmissionContext, today: NaiveDate) -> Result<Plan, SubmissionError> {
    let destination = context.destination.ok_or(PolicyError::MissingDestination)?;
    let product = context.product.ok_or(PolicyError::MissingProduct)?;
    let account_name =
        required_text(context.account_name.as_deref()).ok_or(PolicyError::MissingAccount)?;
    if !is_header_safe(&account_name) {
        return Err(PolicyError::InvalidAccountName.into());
    }
    let trade_date = context.trade_date.ok_or(PolicyError::MissingTradeDate)?;
    if trade_date <= today {
        return Err(PolicyError::TradeDateNotInFuture { trade_date, today }.into());
    }

    let action = context.action;
    let password = context.password.clone().filter(|p| !p.is_empty());
    if destination.requires_password_for(action) {
        match password.as_deref() {
            None => return Err(PolicyError::PasswordRequired { destination }.into()),
            Some(password) if !is_header_safe(password) => {
                return Err(PolicyError::InvalidPassword.into());
            }
            Some(_) => {}
        }
    }

    let kind = product.kind();
    let rows_required =
        action != Action::Withdraw || serializer::takes_withdrawal_identifiers(destination, kind);
    if rows_required && context.rows.is_empty() {
        return Err(PolicyError::NoRows.into());
    }

    let operation = route(destination, product, action)
        .ok_or_else(|| SubmissionError::unsupported_route(destination, product, action))?;

    let call = if action == Action::Withdraw {
        Call::Withdraw(
            operation,
            serializer::serialize_withdrawals(destination, kind, &context.rows)?,
        )
    } else {
        match headers::check(destination, kind, &context.columns) {
            HeaderCheck::NoUpload => return Err(PolicyError::NoRows.into()),
            HeaderCheck::NoRules { destination, kind } => {
                return Err(SubmissionError::no_rules(destination, kind));
            }
            HeaderCheck::Checked(diagnostic) if !diagnostic.ok => {
                return Err(SubmissionError::Validation(diagnostic));
            }
            HeaderCheck::Checked(_) => {}
        }

        let orders = serializer::serialize(destination, kind, &context.rows)?;
        match (action, product) {
            (Action::Validate, Product::VirtualBid) => {
                Call::Validate(ValidationRequest::bids(orders))
            }
            (Action::Validate, Product::VirtualOffer) => {
                Call::Validate(ValidationRequest::offers(orders))
            }
            (Action::Validate, Product::Spread) => {
                Call::Validate(ValidationRequest::Spreads(orders))
            }
            _ => Call::Submit(operation, orders),
        }
    };

    Ok(Plan {
        destination,
        credentials: Credentials {
            account_name,
            password,
            trade_date,
        },
        call,
    })
}

async fn invoke(adapter: &dyn Adapter, plan: &Plan) -> Result<HttpReply, AdapterError> {
    let credentials = &plan.credentials;
    match &plan.call {
        Call::Validate(request) => adapter.validate(credentials, request).await,
        Call::Submit(Operation::SubmitBids, orders) => {
            adapter.submit_bids(credentials, orders).await
        }
        Call::Submit(Operation::SubmitOffers, orders) => {
            adapter.submit_offers(credentials, orders).await
        }
        Call::Submit(Operation::SubmitSpreads, orders) => {
            adapter.submit_spreads(credentials, orders).await
        }
        Call::Withdraw(Operation::WithdrawBids, identifiers) => {
            adapter.withdraw_bids(credentials, identifiers.as_deref()).await
        }
        Call::Withdraw(Operation::WithdrawOffers, identifiers) => {
            adapter.withdraw_offers(credentials, identifiers.as_deref()).await
        }
        Call::Withdraw(Operation::WithdrawSpreads, identifiers) => {
            adapter.withdraw_spreads(credentials, identifiers.as_deref()).await
        }
        Call::Submit(operation, _) | Call::Withdraw(operation, _) => {
            Err(AdapterError::Unsupported {
                destination: plan.destination,
                operation: *operation,
            })
        }
    }
}

/// Runs submission attempts against a set of destination adapters.
#[derive(Debug, Clone)]
pub struct Submitter {
    adapters: AdapterSet,
}

impl Submitter {
    pub const fn new(adapters: AdapterSet) -> Self {
        Self { adapters }
    }

    fn adapter(&self, destination: Destination) -> Result<&Arc<dyn Adapter>, SubmissionError> {
        self.adapters.get(destination).ok_or_else(|| {
            SubmissionError::Configuration(format!("No adapter registered for {destination}"))
        })
    }

    async fn drive(
        &self,
        lifecycle: &mut Lifecycle,
        context: &SubmissionContext,
    ) -> Result<HttpReply, SubmissionError> {
        lifecycle.transition(SubmissionState::Validating)?;

        let plan = plan(context, Utc::now().date_naive())?;
        let adapter = self.adapter(plan.destination)?;

        lifecycle.transition(SubmissionState::Submitting)?;
        info!(
            destination = %plan.destination,
            action = %context.action,
            account = %plan.credentials.account_name,
            trade_date = %plan.credentials.trade_date,
            rows = context.rows.len(),
            "Submitting"
        );

        Ok(invoke(adapter.as_ref(), &plan).await?)
    }

    /// Runs one attempt to completion. Never fails: every error becomes the result.
    pub async fn run(&self, context: SubmissionContext) -> Attempt {
        let mut lifecycle = Lifecycle::default();

        let result = match self.drive(&mut lifecycle, &context).await {
            Ok(reply) => normalize(Ok(reply)),
            Err(error) => {
                warn!("Submission failed ({:?}): {error}", error.kind());
                SubmissionResult::from(error)
            }
        };

        let terminal = if result.success {
            SubmissionState::Succeeded
        } else {
            SubmissionState::Failed
        };
        if let Err(error) = lifecycle.transition(terminal) {
            warn!("{error}");
        }

        Attempt {
            state: lifecycle.state(),
            result,
        }
    }

    pub async fn submit(&self, context: SubmissionContext) -> SubmissionResult {
        self.run(context).await.result
    }
}
