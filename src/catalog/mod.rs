pub mod file;
pub mod types;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{PolicyError, Result};
pub use types::{
    normalize_tag, Category, Condition, LeadTime, LeadTimeAnchor, PaymentMethod, RefundMethod,
    RefundRoute, Requirement, RequirementLevel, ReturnReason, ReturnWindow, RuleOrigin, RuleSet,
};

const BUILTIN_CATALOG: &str = include_str!("../../config/catalog.toml");

/// Per-category settings: return window, excluded subcategories and the reasons it maps.
#[derive(Debug, Clone)]
pub struct CategoryPolicy {
    pub window: ReturnWindow,
    /// The whole category can never be returned.
    pub excluded: bool,
    /// Normalized subcategory tags that can never be returned.
    pub non_returnable: Vec<String>,
    /// `None` maps every reason of the general matrix.
    pub reasons: Option<BTreeSet<ReturnReason>>,
}

/// A category-specific requirement layered on top of the general matrix.
#[derive(Debug, Clone)]
pub struct Override {
    pub category: Category,
    /// Empty applies to every subcategory.
    pub subcategories: Vec<String>,
    /// Empty applies to every reason.
    pub reasons: Vec<ReturnReason>,
    pub condition: Condition,
    pub level: RequirementLevel,
}

impl Override {
    fn applies(&self, category: Category, subcategory: Option<&str>, reason: ReturnReason) -> bool {
        if self.category != category {
            return false;
        }
        if !self.reasons.is_empty() && !self.reasons.contains(&reason) {
            return false;
        }
        if self.subcategories.is_empty() {
            return true;
        }
        subcategory
            .map(normalize_tag)
            .map(|sub| self.subcategories.iter().any(|s| *s == sub))
            .unwrap_or(false)
    }
}

/// Immutable rule catalog. Loaded once, shared read-only.
#[derive(Debug, Clone)]
pub struct PolicyCatalog {
    categories: BTreeMap<Category, CategoryPolicy>,
    matrix: BTreeMap<ReturnReason, RuleSet>,
    overrides: Vec<Override>,
    refunds: BTreeMap<PaymentMethod, RefundRoute>,
    loyalty: RefundRoute,
}

impl PolicyCatalog {
    /// The catalog shipped with the binary.
    pub fn builtin() -> Result<Self> {
        file::parse(BUILTIN_CATALOG)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        file::parse(text)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let catalog = file::parse(&text)?;
        info!(
            "Loaded policy catalog from {} ({} categories)",
            path.display(),
            catalog.categories.len()
        );
        Ok(catalog)
    }

    pub fn categories(&self) -> impl Iterator<Item = (Category, &CategoryPolicy)> {
        self.categories.iter().map(|(c, p)| (*c, p))
    }

    pub fn category(&self, category: Category) -> Result<&CategoryPolicy> {
        self.categories
            .get(&category)
            .ok_or_else(|| PolicyError::UnknownCategory(category.to_string()))
    }

    pub fn reasons(&self) -> impl Iterator<Item = ReturnReason> + '_ {
        self.matrix.keys().copied()
    }

    pub fn return_window(&self, category: Category) -> Result<ReturnWindow> {
        Ok(self.category(category)?.window)
    }

    /// Whether every item in the category is non-returnable.
    pub fn is_excluded(&self, category: Category) -> Result<bool> {
        Ok(self.category(category)?.excluded)
    }

    /// The matching non-returnable entry for this subcategory, if any.
    pub fn non_returnable(
        &self,
        category: Category,
        subcategory: Option<&str>,
    ) -> Result<Option<&str>> {
        let policy = self.category(category)?;
        let Some(sub) = subcategory.map(normalize_tag) else {
            return Ok(None);
        };
        Ok(policy
            .non_returnable
            .iter()
            .find(|entry| **entry == sub)
            .map(String::as_str))
    }

    /// Rule set for a (category, reason) pair, ignoring subcategory overrides.
    pub fn lookup(&self, category: Category, reason: ReturnReason) -> Result<Option<RuleSet>> {
        self.lookup_for(category, None, reason)
    }

    /// Rule set for a (category, subcategory, reason) triple.
    ///
    /// Fails with `UnknownCategory` when the category is not in the catalog and with
    /// `UnknownReason` when the general matrix has no row for the reason. Returns `None`
    /// when the category restricts its reasons and this one is not mapped.
    pub fn lookup_for(
        &self,
        category: Category,
        subcategory: Option<&str>,
        reason: ReturnReason,
    ) -> Result<Option<RuleSet>> {
        let policy = self.category(category)?;
        let base = self
            .matrix
            .get(&reason)
            .ok_or_else(|| PolicyError::UnknownReason(reason.to_string()))?;

        if let Some(mapped) = &policy.reasons {
            if !mapped.contains(&reason) {
                debug!("{} has no mapping for reason {}", category, reason);
                return Ok(None);
            }
        }

        Ok(Some(self.layer_overrides(base.clone(), category, subcategory, reason)))
    }

    /// The Change of mind rule set with this category's overrides applied.
    pub fn change_of_mind_default(
        &self,
        category: Category,
        subcategory: Option<&str>,
    ) -> Result<RuleSet> {
        self.category(category)?;
        let base = self.matrix.get(&ReturnReason::ChangeOfMind).ok_or_else(|| {
            PolicyError::InvalidCatalog("matrix has no Change of mind row".to_string())
        })?;
        Ok(self.layer_overrides(base.clone(), category, subcategory, ReturnReason::ChangeOfMind))
    }

    fn layer_overrides(
        &self,
        mut rules: RuleSet,
        category: Category,
        subcategory: Option<&str>,
        reason: ReturnReason,
    ) -> RuleSet {
        for rule in self
            .overrides
            .iter()
            .filter(|o| o.applies(category, subcategory, reason))
        {
            rules.apply_override(rule.condition, rule.level);
        }
        rules
    }

    pub fn refund_route(&self, method: PaymentMethod) -> Result<RefundRoute> {
        if method == PaymentMethod::LoyaltyPoints {
            return Ok(self.loyalty);
        }
        self.refunds
            .get(&method)
            .copied()
            .ok_or_else(|| PolicyError::UnknownPaymentMethod(method.to_string()))
    }

    pub fn loyalty_route(&self) -> RefundRoute {
        self.loyalty
    }

    pub fn refund_routes(&self) -> impl Iterator<Item = (PaymentMethod, RefundRoute)> + '_ {
        self.refunds.iter().map(|(m, r)| (*m, *r))
    }
}
