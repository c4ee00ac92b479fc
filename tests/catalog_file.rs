use std::io::Write;

use return_policy::catalog::{Category, Condition, PaymentMethod, RefundMethod, ReturnReason};
use return_policy::{PolicyCatalog, PolicyError};

const STORE_CATALOG: &str = r#"
default_window_days = 30

[[categories]]
category = "Sports"

[[categories]]
category = "Electronics/Mobile/Tablets/Gadgets/Appliances"
window_days = 10
non_returnable = ["Gift Cards"]
reasons = ["defective", "change of mind"]

[[matrix]]
reason = "defective"
sealed_intact = "not_necessary"
new_condition = "not_necessary"
accessories_complete = "required"
tags_attached = "not_necessary"

[[matrix]]
reason = "change_of_mind"
sealed_intact = "required"
new_condition = "required"
accessories_complete = "required"
tags_attached = "required"

[[overrides]]
category = "electronics"
reasons = ["defective"]
condition = "tags_attached"
requirement = "required"

[[refunds]]
payment = "e_wallet"
method = "e_wallet_refund"
lead_time = { kind = "days", min = 1, max = 1, after = "refund_approval" }

[loyalty]
method = "loyalty_account"
lead_time = { kind = "next_billing_cycle" }
"#;

fn write_catalog(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn custom_catalog_replaces_builtin_rules() {
    let file = write_catalog(STORE_CATALOG);
    let catalog = PolicyCatalog::load(file.path()).unwrap();

    assert_eq!(catalog.categories().count(), 2);
    assert_eq!(catalog.return_window(Category::Sports).unwrap().days, 30);
    assert_eq!(catalog.return_window(Category::Electronics).unwrap().days, 10);
    assert_eq!(
        catalog.non_returnable(Category::Electronics, Some("gift-cards")).unwrap(),
        Some("gift_cards")
    );

    let rules = catalog.lookup(Category::Electronics, ReturnReason::Defective).unwrap().unwrap();
    assert!(rules.is_required(Condition::TagsAttached));
    let sports = catalog.lookup(Category::Sports, ReturnReason::Defective).unwrap().unwrap();
    assert!(!sports.is_required(Condition::TagsAttached));

    let route = catalog.refund_route(PaymentMethod::EWallet).unwrap();
    assert_eq!(route.method, RefundMethod::EWalletRefund);
    assert_eq!(route.lead_time.to_string(), "1 day after refund approval");
    assert!(matches!(
        catalog.refund_route(PaymentMethod::DebitCard),
        Err(PolicyError::UnknownPaymentMethod(_))
    ));
}

#[test]
fn whole_category_can_be_marked_non_returnable() {
    let text = STORE_CATALOG.replace(
        "category = \"Sports\"\n",
        "category = \"Sports\"\nnon_returnable_category = true\n",
    );
    let file = write_catalog(&text);
    let catalog = PolicyCatalog::load(file.path()).unwrap();

    assert!(catalog.is_excluded(Category::Sports).unwrap());
    assert!(!catalog.is_excluded(Category::Electronics).unwrap());
    assert!(matches!(
        catalog.is_excluded(Category::Fashion),
        Err(PolicyError::UnknownCategory(_))
    ));
}

#[test]
fn unlisted_category_is_unknown() {
    let file = write_catalog(STORE_CATALOG);
    let catalog = PolicyCatalog::load(file.path()).unwrap();

    assert!(matches!(
        catalog.lookup(Category::Fashion, ReturnReason::ChangeOfMind),
        Err(PolicyError::UnknownCategory(_))
    ));
}

#[test]
fn malformed_catalog_fails_with_invalid_catalog() {
    let broken = STORE_CATALOG.replace("requirement = \"required\"", "requirement = \"sometimes\"");
    let file = write_catalog(&broken);

    assert!(matches!(
        PolicyCatalog::load(file.path()),
        Err(PolicyError::InvalidCatalog(_))
    ));
}

#[test]
fn oversized_window_fails_at_load() {
    let huge = STORE_CATALOG.replace("window_days = 10", "window_days = 100000000");
    let file = write_catalog(&huge);

    assert!(matches!(
        PolicyCatalog::load(file.path()),
        Err(PolicyError::InvalidCatalog(_))
    ));
}

#[test]
fn syntax_error_fails_with_invalid_catalog() {
    let file = write_catalog("[[categories]\ncategory = ");
    assert!(matches!(
        PolicyCatalog::load(file.path()),
        Err(PolicyError::InvalidCatalog(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        PolicyCatalog::load(dir.path().join("nope.toml")),
        Err(PolicyError::Io(_))
    ));
}
