//! Explicit request context and store settings
//!
//! Every core operation receives the acting staff member and the store
//! settings as parameters instead of reading them from shared global state.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::identifiers::StaffId;
use crate::temporal::Timezone;

/// Default commission applied to products with no explicit rule (5%)
pub const DEFAULT_COMMISSION_PERCENTAGE: Decimal = dec!(5);

/// The staff member performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub staff_id: Option<StaffId>,
    pub name: String,
}

impl Actor {
    pub fn staff(staff_id: StaffId, name: impl Into<String>) -> Self {
        Self {
            staff_id: Some(staff_id),
            name: name.into(),
        }
    }

    /// Actor used for automated writes (gateway webhooks, migrations)
    pub fn system() -> Self {
        Self {
            staff_id: None,
            name: "system".to_string(),
        }
    }

    /// Label recorded as `receivedBy` on payments
    pub fn label(&self) -> String {
        match self.staff_id {
            Some(id) => id.to_string(),
            None => self.name.clone(),
        }
    }
}

/// Per-request context passed into every service call
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor: Actor,
    /// Correlation ID for tracing across systems
    pub correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn system() -> Self {
        Self::new(Actor::system())
    }
}

/// Store-wide settings that influence financial calculations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    pub timezone: Timezone,
    /// Upper bound on installments when no line item imposes a lower one
    pub max_installments: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            timezone: Timezone::default(),
            max_installments: 24,
        }
    }
}
