use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, Condition, ReturnReason, RuleOrigin, RuleSet};

/// Observed state of the returned item. Each flag is `true` when the condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCondition {
    pub sealed_intact: bool,
    pub new_condition: bool,
    pub accessories_complete: bool,
    pub tags_attached: bool,
    pub hygienic_strip_intact: bool,
}

impl Default for ItemCondition {
    fn default() -> Self {
        Self {
            sealed_intact: true,
            new_condition: true,
            accessories_complete: true,
            tags_attached: true,
            hygienic_strip_intact: true,
        }
    }
}

impl ItemCondition {
    pub fn satisfies(&self, condition: Condition) -> bool {
        match condition {
            Condition::SealedIntact => self.sealed_intact,
            Condition::NewCondition => self.new_condition,
            Condition::AccessoriesComplete => self.accessories_complete,
            Condition::TagsAttached => self.tags_attached,
            Condition::HygienicStripIntact => self.hygienic_strip_intact,
        }
    }
}

/// One order line the customer wants to send back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub category: Category,
    pub subcategory: Option<String>,
    pub reason: ReturnReason,
    pub delivered_on: NaiveDate,
    #[serde(default)]
    pub condition: ItemCondition,
}

impl OrderItem {
    pub fn new(category: Category, reason: ReturnReason, delivered_on: NaiveDate) -> Self {
        Self {
            category,
            subcategory: None,
            reason,
            delivered_on,
            condition: ItemCondition::default(),
        }
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_condition(mut self, condition: ItemCondition) -> Self {
        self.condition = condition;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IneligibleReason {
    CategoryNotReturnable { category: Category },
    NonReturnable { subcategory: String },
    WindowExpired { days_elapsed: i64, window_days: u32 },
    UnmetCondition { condition: Condition, origin: RuleOrigin },
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::CategoryNotReturnable { category } => {
                write!(f, "non-returnable category ({})", category)
            }
            IneligibleReason::NonReturnable { subcategory } => {
                write!(f, "non-returnable category ({})", subcategory)
            }
            IneligibleReason::WindowExpired { days_elapsed, window_days } => write!(
                f,
                "window expired ({} days since delivery, limit {} days)",
                days_elapsed, window_days
            ),
            IneligibleReason::UnmetCondition { condition, origin: RuleOrigin::Matrix } => {
                write!(f, "unmet: {}", condition)
            }
            IneligibleReason::UnmetCondition { condition, origin: RuleOrigin::CategoryOverride } => {
                write!(f, "unmet: {} (category rule)", condition)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Eligible {
        reason: ReturnReason,
        window_closes_on: NaiveDate,
        rules: RuleSet,
    },
    Ineligible {
        reason: ReturnReason,
        reasons: Vec<IneligibleReason>,
    },
}

impl Decision {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Decision::Eligible { .. })
    }

    /// The return reason the decision was made for.
    pub fn return_reason(&self) -> ReturnReason {
        match self {
            Decision::Eligible { reason, .. } | Decision::Ineligible { reason, .. } => *reason,
        }
    }

    pub fn ineligible_reasons(&self) -> &[IneligibleReason] {
        match self {
            Decision::Eligible { .. } => &[],
            Decision::Ineligible { reasons, .. } => reasons,
        }
    }

    pub fn unmet_conditions(&self) -> Vec<Condition> {
        self.ineligible_reasons()
            .iter()
            .filter_map(|r| match r {
                IneligibleReason::UnmetCondition { condition, .. } => Some(*condition),
                _ => None,
            })
            .collect()
    }

    pub fn summary(&self) -> String {
        match self {
            Decision::Eligible { window_closes_on, .. } => {
                format!("Eligible (return by {})", window_closes_on.format("%Y-%m-%d"))
            }
            Decision::Ineligible { reasons, .. } => {
                let parts: Vec<String> = reasons.iter().map(ToString::to_string).collect();
                format!("Ineligible: {}", parts.join("; "))
            }
        }
    }
}
