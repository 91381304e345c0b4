//! # Payment Gateway Trait
//!
//! Boundary between the booking lifecycle and the external payment provider.
//! The service only ever needs one call: create an order for an amount. The
//! real HTTP client lives outside this crate; tests substitute a mock.
//!
//! Gateway failures are never papered over. A booking can degrade to a
//! synthetic record when storage is down, but money movement either succeeds
//! for real or the operation fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use utsav_core::money::Money;

// =============================================================================
// Types
// =============================================================================

/// Order created at the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Provider-side order identifier.
    pub order_id: String,
    /// Amount the order was created for.
    pub amount_paise: i64,
    /// ISO currency code, "INR" in production.
    pub currency: String,
}

/// Payment gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Provider rejected the order request.
    #[error("Gateway rejected order: {0}")]
    Rejected(String),

    /// Provider could not be reached or returned a transport failure.
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    /// Provider did not answer within the collaborator timeout.
    #[error("Gateway call timed out")]
    Timeout,
}

// =============================================================================
// Trait
// =============================================================================

/// Creates payment orders at an external provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates an order for `amount`, tagged with `receipt` for provider-side
    /// reconciliation (we pass the booking ID).
    async fn create_order(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;
}
