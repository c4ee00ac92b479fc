use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    catalog::{normalize_tag, LeadTime, PaymentMethod, PolicyCatalog, RefundMethod},
    error::{PolicyError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundEvent {
    ReturnAccepted,
    OrderCancelled,
}

impl fmt::Display for RefundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefundEvent::ReturnAccepted => write!(f, "return accepted"),
            RefundEvent::OrderCancelled => write!(f, "order cancelled"),
        }
    }
}

impl FromStr for RefundEvent {
    type Err = PolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "return_accepted" | "returnaccepted" | "return" => Ok(RefundEvent::ReturnAccepted),
            "order_cancelled" | "ordercancelled" | "order_canceled" | "cancelled" | "canceled" => {
                Ok(RefundEvent::OrderCancelled)
            }
            _ => Err(PolicyError::InvalidRequest(format!("unknown refund event '{}'", s))),
        }
    }
}

/// How the customer paid for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    /// The 1 Points applied as a discount alongside `method`.
    pub loyalty_points: Option<u64>,
}

impl Payment {
    pub fn new(method: PaymentMethod) -> Self {
        Self { method, loyalty_points: None }
    }

    pub fn with_loyalty_points(mut self, points: u64) -> Self {
        self.loyalty_points = Some(points);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefundPortion {
    Full,
    LoyaltyPoints { points: u64 },
    Remainder,
}

impl fmt::Display for RefundPortion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefundPortion::Full => write!(f, "full amount"),
            RefundPortion::LoyaltyPoints { points } => write!(f, "{} points", points),
            RefundPortion::Remainder => write!(f, "remaining amount"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundStep {
    pub portion: RefundPortion,
    pub method: RefundMethod,
    pub lead_time: LeadTime,
}

/// Ordered refund steps. Steps are paid out in sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPlan {
    pub event: RefundEvent,
    pub payment: Payment,
    pub steps: Vec<RefundStep>,
}

impl RefundPlan {
    pub fn is_split(&self) -> bool {
        self.steps.len() > 1
    }
}

pub struct RefundScheduler {
    catalog: Arc<PolicyCatalog>,
}

impl RefundScheduler {
    pub fn new(catalog: Arc<PolicyCatalog>) -> Self {
        Self { catalog }
    }

    /// Build the refund plan for a payment.
    ///
    /// Accepted returns and cancelled orders are refunded the same way. Points used
    /// as a discount go back to the loyalty account first; the rest follows the
    /// original payment method's route.
    pub fn schedule(&self, payment: &Payment, event: RefundEvent) -> Result<RefundPlan> {
        let route = self.catalog.refund_route(payment.method)?;

        let steps = match payment.loyalty_points {
            Some(points) if points > 0 && payment.method != PaymentMethod::LoyaltyPoints => {
                let loyalty = self.catalog.loyalty_route();
                debug!(
                    "Splitting {} refund: {} points first, remainder via {}",
                    payment.method, points, route.method
                );
                vec![
                    RefundStep {
                        portion: RefundPortion::LoyaltyPoints { points },
                        method: loyalty.method,
                        lead_time: loyalty.lead_time,
                    },
                    RefundStep {
                        portion: RefundPortion::Remainder,
                        method: route.method,
                        lead_time: route.lead_time,
                    },
                ]
            }
            _ => vec![RefundStep {
                portion: RefundPortion::Full,
                method: route.method,
                lead_time: route.lead_time,
            }],
        };

        Ok(RefundPlan { event, payment: *payment, steps })
    }
}
