//! On-disk catalog format and the validation that turns it into a [`PolicyCatalog`].

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use tracing::debug;

use crate::catalog::types::{
    normalize_tag, Category, Condition, LeadTime, PaymentMethod, RefundMethod, RefundRoute,
    RequirementLevel, ReturnReason, ReturnWindow, RuleSet,
};
use crate::catalog::{CategoryPolicy, Override, PolicyCatalog};
use crate::error::{PolicyError, Result};

const DEFAULT_WINDOW_DAYS: u32 = 14;
/// Longest return window a catalog may declare.
pub const MAX_WINDOW_DAYS: u32 = 3650;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default = "default_window_days")]
    default_window_days: u32,
    #[serde(default)]
    categories: Vec<CategoryRow>,
    #[serde(default)]
    matrix: Vec<MatrixRow>,
    #[serde(default)]
    overrides: Vec<OverrideRow>,
    #[serde(default)]
    refunds: Vec<RefundRow>,
    loyalty: Option<RouteRow>,
}

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CategoryRow {
    category: String,
    window_days: Option<u32>,
    #[serde(default)]
    non_returnable: Vec<String>,
    #[serde(default)]
    non_returnable_category: bool,
    reasons: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MatrixRow {
    reason: String,
    sealed_intact: Option<String>,
    new_condition: Option<String>,
    accessories_complete: Option<String>,
    tags_attached: Option<String>,
    hygienic_strip_intact: Option<String>,
}

impl MatrixRow {
    fn column(&self, condition: Condition) -> Option<&str> {
        match condition {
            Condition::SealedIntact => self.sealed_intact.as_deref(),
            Condition::NewCondition => self.new_condition.as_deref(),
            Condition::AccessoriesComplete => self.accessories_complete.as_deref(),
            Condition::TagsAttached => self.tags_attached.as_deref(),
            Condition::HygienicStripIntact => self.hygienic_strip_intact.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OverrideRow {
    category: String,
    #[serde(default)]
    subcategories: Vec<String>,
    #[serde(default)]
    reasons: Vec<String>,
    condition: String,
    requirement: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RefundRow {
    payment: String,
    method: String,
    lead_time: LeadTime,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteRow {
    method: String,
    lead_time: LeadTime,
}

fn invalid(msg: impl Into<String>) -> PolicyError {
    PolicyError::InvalidCatalog(msg.into())
}

fn route(method: &str, lead_time: LeadTime, at: &str) -> Result<RefundRoute> {
    let method: RefundMethod = method.parse().map_err(|e| invalid(format!("{at}: {e}")))?;
    if let LeadTime::Days { min, max, .. } = lead_time {
        if min > max {
            return Err(invalid(format!("{at}: lead time range {min}-{max} is inverted")));
        }
    }
    Ok(RefundRoute { method, lead_time })
}

pub(crate) fn parse(text: &str) -> Result<PolicyCatalog> {
    let file: CatalogFile = toml::from_str(text).map_err(|e| invalid(e.to_string()))?;

    if !(1..=MAX_WINDOW_DAYS).contains(&file.default_window_days) {
        return Err(invalid(format!(
            "default_window_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
            file.default_window_days
        )));
    }

    let mut matrix: BTreeMap<ReturnReason, RuleSet> = BTreeMap::new();
    for (idx, row) in file.matrix.iter().enumerate() {
        let at = format!("matrix[{idx}]");
        let reason: ReturnReason = row.reason.parse().map_err(|e| invalid(format!("{at}: {e}")))?;
        let mut levels = Vec::new();
        for condition in Condition::BASE {
            let raw = row.column(condition).ok_or_else(|| {
                invalid(format!("{at} ({reason}): missing requirement for {condition}"))
            })?;
            let level: RequirementLevel =
                raw.parse().map_err(|e| invalid(format!("{at} ({reason}): {e}")))?;
            levels.push((condition, level));
        }
        if let Some(raw) = row.column(Condition::HygienicStripIntact) {
            let level: RequirementLevel =
                raw.parse().map_err(|e| invalid(format!("{at} ({reason}): {e}")))?;
            levels.push((Condition::HygienicStripIntact, level));
        }
        if matrix.insert(reason, RuleSet::from_matrix(levels)).is_some() {
            return Err(invalid(format!("{at}: duplicate row for reason {reason}")));
        }
    }
    if !matrix.contains_key(&ReturnReason::ChangeOfMind) {
        return Err(invalid("matrix has no Change of mind row"));
    }

    let mut categories: BTreeMap<Category, CategoryPolicy> = BTreeMap::new();
    for (idx, row) in file.categories.iter().enumerate() {
        let at = format!("categories[{idx}]");
        let category: Category =
            row.category.parse().map_err(|e| invalid(format!("{at}: {e}")))?;
        let days = row.window_days.unwrap_or(file.default_window_days);
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(invalid(format!(
                "{at} ({category}): window_days must be between 1 and {MAX_WINDOW_DAYS}, got {days}"
            )));
        }
        let mut non_returnable = Vec::with_capacity(row.non_returnable.len());
        for sub in &row.non_returnable {
            let tag = normalize_tag(sub);
            if tag.is_empty() {
                return Err(invalid(format!("{at} ({category}): empty non_returnable entry")));
            }
            non_returnable.push(tag);
        }
        let reasons = match &row.reasons {
            Some(list) => {
                let mut set = BTreeSet::new();
                for raw in list {
                    let reason: ReturnReason =
                        raw.parse().map_err(|e| invalid(format!("{at} ({category}): {e}")))?;
                    if !matrix.contains_key(&reason) {
                        return Err(invalid(format!(
                            "{at} ({category}): reason {reason} has no matrix row"
                        )));
                    }
                    set.insert(reason);
                }
                Some(set)
            }
            None => None,
        };
        let policy = CategoryPolicy {
            window: ReturnWindow::new(days),
            excluded: row.non_returnable_category,
            non_returnable,
            reasons,
        };
        if categories.insert(category, policy).is_some() {
            return Err(invalid(format!("{at}: duplicate category {category}")));
        }
    }

    let mut overrides = Vec::with_capacity(file.overrides.len());
    for (idx, row) in file.overrides.iter().enumerate() {
        let at = format!("overrides[{idx}]");
        let category: Category =
            row.category.parse().map_err(|e| invalid(format!("{at}: {e}")))?;
        if !categories.contains_key(&category) {
            return Err(invalid(format!("{at}: category {category} is not listed in categories")));
        }
        let reasons = row
            .reasons
            .iter()
            .map(|r| r.parse::<ReturnReason>())
            .collect::<Result<Vec<_>>>()
            .map_err(|e| invalid(format!("{at}: {e}")))?;
        let condition: Condition =
            row.condition.parse().map_err(|e| invalid(format!("{at}: {e}")))?;
        let level: RequirementLevel =
            row.requirement.parse().map_err(|e| invalid(format!("{at}: {e}")))?;
        overrides.push(Override {
            category,
            subcategories: row.subcategories.iter().map(|s| normalize_tag(s)).collect(),
            reasons,
            condition,
            level,
        });
    }

    let mut refunds = BTreeMap::new();
    for (idx, row) in file.refunds.iter().enumerate() {
        let at = format!("refunds[{idx}]");
        let payment: PaymentMethod =
            row.payment.parse().map_err(|e| invalid(format!("{at}: {e}")))?;
        let route = route(&row.method, row.lead_time, &at)?;
        if refunds.insert(payment, route).is_some() {
            return Err(invalid(format!("{at}: duplicate route for {payment}")));
        }
    }

    let loyalty = match &file.loyalty {
        Some(row) => route(&row.method, row.lead_time, "loyalty")?,
        None => return Err(invalid("missing [loyalty] refund route")),
    };

    debug!(
        "Parsed catalog: {} categories, {} matrix rows, {} overrides, {} refund routes",
        categories.len(),
        matrix.len(),
        overrides.len(),
        refunds.len()
    );

    Ok(PolicyCatalog {
        categories,
        matrix,
        overrides,
        refunds,
        loyalty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[[categories]]
category = "pets"

[[matrix]]
reason = "change_of_mind"
sealed_intact = "required"
new_condition = "required"
accessories_complete = "required"
tags_attached = "required"

[loyalty]
method = "loyalty_account"
lead_time = { kind = "days", min = 1, max = 3, after = "refund_approval" }
"#;

    fn expect_invalid(text: &str, needle: &str) {
        match parse(text) {
            Err(PolicyError::InvalidCatalog(msg)) => {
                assert!(msg.contains(needle), "'{msg}' should mention '{needle}'")
            }
            other => panic!("expected InvalidCatalog, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_minimal_catalog_uses_default_window() {
        let catalog = parse(MINIMAL).unwrap();
        assert_eq!(catalog.return_window(Category::Pets).unwrap().days, DEFAULT_WINDOW_DAYS);
    }

    #[test]
    fn test_window_out_of_range_fails_load() {
        let text = MINIMAL.replace("category = \"pets\"", "category = \"pets\"\nwindow_days = 100000000");
        expect_invalid(&text, "window_days must be between 1 and 3650");

        let text = MINIMAL.replace("category = \"pets\"", "category = \"pets\"\nwindow_days = 0");
        expect_invalid(&text, "window_days must be between");

        let text = format!("default_window_days = 3651\n{MINIMAL}");
        expect_invalid(&text, "default_window_days");

        let text = MINIMAL.replace("category = \"pets\"", "category = \"pets\"\nwindow_days = 3650");
        assert_eq!(parse(&text).unwrap().return_window(Category::Pets).unwrap().days, MAX_WINDOW_DAYS);
    }

    #[test]
    fn test_unknown_category_fails_load() {
        let text = MINIMAL.replace("category = \"pets\"", "category = \"groceries\"");
        expect_invalid(&text, "groceries");
    }

    #[test]
    fn test_missing_matrix_column_fails_load() {
        let text = MINIMAL.replace("tags_attached = \"required\"\n", "");
        expect_invalid(&text, "tags and labels attached");
    }

    #[test]
    fn test_malformed_requirement_fails_load() {
        let text = MINIMAL.replace("sealed_intact = \"required\"", "sealed_intact = \"maybe\"");
        expect_invalid(&text, "maybe");
    }

    #[test]
    fn test_missing_change_of_mind_row_fails_load() {
        let text = MINIMAL.replace("reason = \"change_of_mind\"", "reason = \"defective\"");
        expect_invalid(&text, "Change of mind");
    }

    #[test]
    fn test_duplicate_category_fails_load() {
        let text = format!("[[categories]]\ncategory = \"Pets\"\n{MINIMAL}");
        expect_invalid(&text, "duplicate category");
    }

    #[test]
    fn test_override_on_unlisted_category_fails_load() {
        let text = format!(
            "[[overrides]]\ncategory = \"fashion\"\ncondition = \"tags\"\nrequirement = \"required\"\n{MINIMAL}"
        );
        expect_invalid(&text, "not listed");
    }

    #[test]
    fn test_inverted_lead_time_fails_load() {
        let text = MINIMAL.replace("min = 1, max = 3", "min = 5, max = 3");
        expect_invalid(&text, "inverted");
    }

    #[test]
    fn test_missing_loyalty_route_fails_load() {
        let text = MINIMAL.split("[loyalty]").next().unwrap().to_string();
        expect_invalid(&text, "loyalty");
    }

    #[test]
    fn test_unknown_field_fails_load() {
        let text = format!("colour = \"red\"\n{MINIMAL}");
        expect_invalid(&text, "colour");
    }
}
