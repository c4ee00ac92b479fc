use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::returns::{Decision, OrderItem, RefundPlan};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: i64,
    pub evaluated_at: DateTime<Utc>,
    pub category: String,
    pub subcategory: Option<String>,
    pub reason: String,
    pub delivered_on: NaiveDate,
    pub eligible: bool,
    pub decision: Decision,
}

impl EvaluationRecord {
    /// A record ready to insert; the id is assigned by the database.
    pub fn new(item: &OrderItem, decision: &Decision) -> Self {
        Self {
            id: 0,
            evaluated_at: Utc::now(),
            category: item.category.tag().to_string(),
            subcategory: item.subcategory.clone(),
            reason: decision.return_reason().to_string(),
            delivered_on: item.delivered_on,
            eligible: decision.is_eligible(),
            decision: decision.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub payment_method: String,
    pub event: String,
    pub plan: RefundPlan,
}

impl RefundRecord {
    pub fn new(plan: &RefundPlan) -> Self {
        Self {
            id: 0,
            created_at: Utc::now(),
            payment_method: plan.payment.method.to_string(),
            event: plan.event.to_string(),
            plan: plan.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseStats {
    pub total_evaluations: usize,
    pub eligible: usize,
    pub ineligible: usize,
    pub refund_plans: usize,
    pub split_refunds: usize,
}
