use crate::{CoreError, Course, CourseId, SessionLedger};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CURRENCY: &str = "usd";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    Open,
    Paid,
    Failed,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub id: String,
    pub course_id: CourseId,
    pub amount: u64,
    pub currency: String,
    pub status: CheckoutStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub checkout_id: String,
    pub course_id: CourseId,
    pub amount: u64,
    pub paid_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Paid(PaymentReceipt),
    AlreadyPaid,
}

/// Card-payment processor (Stripe in production).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout(&self, course: &Course) -> Result<CheckoutSession, CoreError>;
    async fn confirm(&self, session: &CheckoutSession) -> Result<PaymentReceipt, CoreError>;
}

/// Approves every checkout. Stands in for the card processor in development.
#[derive(Clone, Debug, Default)]
pub struct SimulatedGateway;

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn create_checkout(&self, course: &Course) -> Result<CheckoutSession, CoreError> {
        Ok(CheckoutSession {
            id: format!("cs_sim_{}", Uuid::new_v4().simple()),
            course_id: course.id.clone(),
            amount: course.price,
            currency: DEFAULT_CURRENCY.to_string(),
            status: CheckoutStatus::Open,
            created_at: Utc::now(),
        })
    }

    async fn confirm(&self, session: &CheckoutSession) -> Result<PaymentReceipt, CoreError> {
        if session.status != CheckoutStatus::Open {
            return Err(CoreError::Conflict("checkout session is not open"));
        }
        Ok(PaymentReceipt {
            checkout_id: session.id.clone(),
            course_id: session.course_id.clone(),
            amount: session.amount,
            paid_at: Utc::now(),
        })
    }
}

/// Charges for a premium course and records it in the session ledger.
pub async fn purchase(
    gateway: &dyn PaymentGateway,
    ledger: &SessionLedger,
    course: &Course,
) -> Result<PurchaseOutcome, CoreError> {
    if !course.is_premium && course.is_free() {
        return Err(CoreError::Invalid("course is free"));
    }
    if ledger.has_paid(&course.id) {
        return Ok(PurchaseOutcome::AlreadyPaid);
    }
    let checkout = gateway.create_checkout(course).await?;
    let receipt = gateway.confirm(&checkout).await?;
    ledger.record_payment(&course.id).await?;
    tracing::info!(course = %course.id, amount = receipt.amount, checkout = %receipt.checkout_id, "payment recorded");
    Ok(PurchaseOutcome::Paid(receipt))
}
