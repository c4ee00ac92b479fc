use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::{
    catalog::{PolicyCatalog, ReturnReason, RuleSet},
    error::{PolicyError, Result},
    returns::item::{Decision, IneligibleReason, OrderItem},
};

pub struct EligibilityChecker {
    catalog: Arc<PolicyCatalog>,
}

impl EligibilityChecker {
    pub fn new(catalog: Arc<PolicyCatalog>) -> Self {
        Self { catalog }
    }

    /// Evaluate against today's local date.
    pub fn evaluate(&self, item: &OrderItem) -> Result<Decision> {
        self.evaluate_on(item, Local::now().date_naive())
    }

    /// Decide whether `item` may be returned on `today`.
    ///
    /// Checks run in order and the first two short-circuit:
    /// 1. non-returnable category, then non-returnable subcategory
    /// 2. return window, counted from the delivery date
    /// 3. every required condition of the (category, reason) rule set, with
    ///    category overrides layered on top
    ///
    /// Ineligibility is a normal result. Errors are reserved for requests the
    /// catalog cannot answer.
    pub fn evaluate_on(&self, item: &OrderItem, today: NaiveDate) -> Result<Decision> {
        let subcategory = item.subcategory.as_deref();

        if self.catalog.is_excluded(item.category)? {
            debug!("{} is non-returnable", item.category);
            return Ok(Decision::Ineligible {
                reason: item.reason,
                reasons: vec![IneligibleReason::CategoryNotReturnable { category: item.category }],
            });
        }

        if let Some(entry) = self.catalog.non_returnable(item.category, subcategory)? {
            debug!("{} / {} is non-returnable", item.category, entry);
            return Ok(Decision::Ineligible {
                reason: item.reason,
                reasons: vec![IneligibleReason::NonReturnable {
                    subcategory: subcategory.unwrap_or(entry).to_string(),
                }],
            });
        }

        let days_elapsed = (today - item.delivered_on).num_days();
        if days_elapsed < 0 {
            return Err(PolicyError::InvalidRequest(format!(
                "delivery date {} is after {}",
                item.delivered_on, today
            )));
        }

        let window = self.catalog.return_window(item.category)?;
        if !window.is_open(item.delivered_on, today) {
            debug!(
                "{} delivered {} days ago, window is {} days",
                item.category, days_elapsed, window.days
            );
            return Ok(Decision::Ineligible {
                reason: item.reason,
                reasons: vec![IneligibleReason::WindowExpired {
                    days_elapsed,
                    window_days: window.days,
                }],
            });
        }

        let rules = self.rules_for(item)?;

        let unmet: Vec<IneligibleReason> = rules
            .required()
            .filter(|(condition, _)| !item.condition.satisfies(*condition))
            .map(|(condition, requirement)| IneligibleReason::UnmetCondition {
                condition,
                origin: requirement.origin,
            })
            .collect();

        if unmet.is_empty() {
            Ok(Decision::Eligible {
                reason: item.reason,
                window_closes_on: window.closes_on(item.delivered_on)?,
                rules,
            })
        } else {
            debug!("{} unmet conditions for {} / {}", unmet.len(), item.category, item.reason);
            Ok(Decision::Ineligible { reason: item.reason, reasons: unmet })
        }
    }

    /// Evaluate an item whose return could be filed under several reasons
    /// (e.g. both expired and defective). The most permissive outcome wins:
    /// the first eligible reason in `reasons` order, otherwise the decision with
    /// the fewest unmet conditions. Reasons the category does not map are skipped;
    /// `UnmappedReason` is returned only when none of them is mapped.
    pub fn evaluate_ambiguous(
        &self,
        item: &OrderItem,
        reasons: &[ReturnReason],
        today: NaiveDate,
    ) -> Result<Decision> {
        let mut best: Option<Decision> = None;
        let mut unmapped: Option<PolicyError> = None;

        for reason in reasons {
            let candidate = OrderItem { reason: *reason, ..item.clone() };
            let decision = match self.evaluate_on(&candidate, today) {
                Ok(decision) => decision,
                Err(err @ PolicyError::UnmappedReason { .. }) => {
                    debug!("Skipping candidate reason {}: {}", reason, err);
                    unmapped.get_or_insert(err);
                    continue;
                }
                Err(err) => return Err(err),
            };
            if decision.is_eligible() {
                return Ok(decision);
            }
            let better = match &best {
                Some(current) => {
                    decision.ineligible_reasons().len() < current.ineligible_reasons().len()
                }
                None => true,
            };
            if better {
                best = Some(decision);
            }
        }

        match (best, unmapped) {
            (Some(decision), _) => Ok(decision),
            (None, Some(err)) => Err(err),
            (None, None) => {
                Err(PolicyError::InvalidRequest("no candidate return reasons".to_string()))
            }
        }
    }

    fn rules_for(&self, item: &OrderItem) -> Result<RuleSet> {
        let subcategory = item.subcategory.as_deref();
        match self.catalog.lookup_for(item.category, subcategory, item.reason)? {
            Some(rules) => Ok(rules),
            None if item.reason == ReturnReason::ChangeOfMind => {
                debug!("{} falls back to the Change of mind defaults", item.category);
                self.catalog.change_of_mind_default(item.category, subcategory)
            }
            None => Err(PolicyError::UnmappedReason {
                category: item.category.to_string(),
                reason: item.reason.to_string(),
            }),
        }
    }
}
