use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Lowercase a free-form tag and collapse every run of non-alphanumerics into `_`.
///
/// "Health & Beauty", "health-beauty" and "HEALTH_BEAUTY" all become `health_beauty`.
pub fn normalize_tag(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Fashion,
    HealthBeauty,
    MomKids,
    Pets,
    Sports,
    BooksGamesMusic,
    AutomotiveTools,
    OfficeEquipment,
    Electronics,
    Others,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Fashion,
        Category::HealthBeauty,
        Category::MomKids,
        Category::Pets,
        Category::Sports,
        Category::BooksGamesMusic,
        Category::AutomotiveTools,
        Category::OfficeEquipment,
        Category::Electronics,
        Category::Others,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Category::Fashion => "fashion",
            Category::HealthBeauty => "health_beauty",
            Category::MomKids => "mom_kids",
            Category::Pets => "pets",
            Category::Sports => "sports",
            Category::BooksGamesMusic => "books_games_music",
            Category::AutomotiveTools => "automotive_tools",
            Category::OfficeEquipment => "office_equipment",
            Category::Electronics => "electronics",
            Category::Others => "others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Fashion => "Fashion",
            Category::HealthBeauty => "Health & Beauty",
            Category::MomKids => "Mom & Kids",
            Category::Pets => "Pets",
            Category::Sports => "Sports",
            Category::BooksGamesMusic => "Books/Games/Music",
            Category::AutomotiveTools => "Automotive & Tools",
            Category::OfficeEquipment => "Office Equipment",
            Category::Electronics => "Electronics/Mobile/Tablets/Gadgets/Appliances",
            Category::Others => "Others",
        };
        f.write_str(label)
    }
}

impl FromStr for Category {
    type Err = PolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "fashion" => Ok(Category::Fashion),
            "health_beauty" | "health_and_beauty" => Ok(Category::HealthBeauty),
            "mom_kids" | "mom_and_kids" => Ok(Category::MomKids),
            "pets" => Ok(Category::Pets),
            "sports" => Ok(Category::Sports),
            "books_games_music" | "books" | "games" | "music" => Ok(Category::BooksGamesMusic),
            "automotive_tools" | "automotive_and_tools" => Ok(Category::AutomotiveTools),
            "office_equipment" => Ok(Category::OfficeEquipment),
            "electronics"
            | "electronics_mobile_tablets_gadgets_appliances"
            | "mobile"
            | "tablets"
            | "gadgets"
            | "appliances" => Ok(Category::Electronics),
            "others" | "other" => Ok(Category::Others),
            _ => Err(PolicyError::UnknownCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    Defective,
    Damaged,
    Expired,
    MissingItem,
    NotAsAdvertised,
    IncorrectItemDelivered,
    SizeDoesNotFit,
    ChangeOfMind,
}

impl ReturnReason {
    pub const ALL: [ReturnReason; 8] = [
        ReturnReason::Defective,
        ReturnReason::Damaged,
        ReturnReason::Expired,
        ReturnReason::MissingItem,
        ReturnReason::NotAsAdvertised,
        ReturnReason::IncorrectItemDelivered,
        ReturnReason::SizeDoesNotFit,
        ReturnReason::ChangeOfMind,
    ];
}

impl fmt::Display for ReturnReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReturnReason::Defective => "Defective",
            ReturnReason::Damaged => "Damaged",
            ReturnReason::Expired => "Expired",
            ReturnReason::MissingItem => "Missing item",
            ReturnReason::NotAsAdvertised => "Not as advertised",
            ReturnReason::IncorrectItemDelivered => "Incorrect item delivered",
            ReturnReason::SizeDoesNotFit => "Size does not fit",
            ReturnReason::ChangeOfMind => "Change of mind",
        };
        f.write_str(label)
    }
}

impl FromStr for ReturnReason {
    type Err = PolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "defective" => Ok(ReturnReason::Defective),
            "damaged" => Ok(ReturnReason::Damaged),
            "expired" => Ok(ReturnReason::Expired),
            "missing_item" | "missing" => Ok(ReturnReason::MissingItem),
            "not_as_advertised" => Ok(ReturnReason::NotAsAdvertised),
            "incorrect_item_delivered" | "incorrect_item" | "wrong_item" => {
                Ok(ReturnReason::IncorrectItemDelivered)
            }
            "size_does_not_fit" | "size" => Ok(ReturnReason::SizeDoesNotFit),
            "change_of_mind" => Ok(ReturnReason::ChangeOfMind),
            _ => Err(PolicyError::UnknownReason(s.to_string())),
        }
    }
}

/// A physical-state predicate a returned item may have to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    SealedIntact,
    NewCondition,
    AccessoriesComplete,
    TagsAttached,
    HygienicStripIntact,
}

impl Condition {
    /// Columns every matrix row must fill in.
    pub const BASE: [Condition; 4] = [
        Condition::SealedIntact,
        Condition::NewCondition,
        Condition::AccessoriesComplete,
        Condition::TagsAttached,
    ];
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Condition::SealedIntact => "sealed packaging intact",
            Condition::NewCondition => "new and unused",
            Condition::AccessoriesComplete => "all accessories and freebies included",
            Condition::TagsAttached => "tags and labels attached",
            Condition::HygienicStripIntact => "hygienic strip intact",
        };
        f.write_str(label)
    }
}

impl FromStr for Condition {
    type Err = PolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "sealed_intact" | "sealed" => Ok(Condition::SealedIntact),
            "new_condition" | "new" | "unused" => Ok(Condition::NewCondition),
            "accessories_complete" | "accessories" => Ok(Condition::AccessoriesComplete),
            "tags_attached" | "tags" => Ok(Condition::TagsAttached),
            "hygienic_strip_intact" | "hygienic_strip" => Ok(Condition::HygienicStripIntact),
            _ => Err(PolicyError::InvalidRequest(format!("unknown condition '{}'", s))),
        }
    }
}

/// Ordered so that the stricter level compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementLevel {
    NotNecessary,
    Required,
}

impl fmt::Display for RequirementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementLevel::NotNecessary => write!(f, "not necessary"),
            RequirementLevel::Required => write!(f, "required"),
        }
    }
}

impl FromStr for RequirementLevel {
    type Err = PolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "required" | "yes" => Ok(RequirementLevel::Required),
            "not_necessary" | "no" => Ok(RequirementLevel::NotNecessary),
            _ => Err(PolicyError::InvalidRequest(format!("unknown requirement level '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOrigin {
    Matrix,
    CategoryOverride,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub level: RequirementLevel,
    pub origin: RuleOrigin,
}

/// Resolved requirements for one (category, reason) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    entries: BTreeMap<Condition, Requirement>,
}

impl RuleSet {
    pub fn from_matrix(levels: impl IntoIterator<Item = (Condition, RequirementLevel)>) -> Self {
        let entries = levels
            .into_iter()
            .map(|(condition, level)| {
                (condition, Requirement { level, origin: RuleOrigin::Matrix })
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, condition: Condition) -> Option<&Requirement> {
        self.entries.get(&condition)
    }

    /// Level for `condition`; conditions absent from the row are not necessary.
    pub fn level(&self, condition: Condition) -> RequirementLevel {
        self.entries
            .get(&condition)
            .map(|r| r.level)
            .unwrap_or(RequirementLevel::NotNecessary)
    }

    pub fn is_required(&self, condition: Condition) -> bool {
        self.level(condition) == RequirementLevel::Required
    }

    pub fn required(&self) -> impl Iterator<Item = (Condition, &Requirement)> {
        self.entries
            .iter()
            .filter(|(_, r)| r.level == RequirementLevel::Required)
            .map(|(c, r)| (*c, r))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Condition, &Requirement)> {
        self.entries.iter().map(|(c, r)| (*c, r))
    }

    /// Layer a category override on top of the current entry. The stricter level wins
    /// and the entry is marked as coming from the override.
    pub fn apply_override(&mut self, condition: Condition, level: RequirementLevel) {
        let entry = self.entries.entry(condition).or_insert(Requirement {
            level: RequirementLevel::NotNecessary,
            origin: RuleOrigin::Matrix,
        });
        entry.level = entry.level.max(level);
        entry.origin = RuleOrigin::CategoryOverride;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnWindow {
    pub days: u32,
}

impl ReturnWindow {
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    /// Last day on which a return may still be requested.
    pub fn closes_on(&self, delivered_on: NaiveDate) -> Result<NaiveDate, PolicyError> {
        delivered_on
            .checked_add_days(Days::new(u64::from(self.days)))
            .ok_or_else(|| {
                PolicyError::InvalidRequest(format!(
                    "{}-day window from {} is out of range",
                    self.days, delivered_on
                ))
            })
    }

    pub fn is_open(&self, delivered_on: NaiveDate, today: NaiveDate) -> bool {
        (today - delivered_on).num_days() <= i64::from(self.days)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    CashOnDelivery,
    BankTransfer,
    EWallet,
    LoyaltyPoints,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::CreditCard => "credit card",
            PaymentMethod::DebitCard => "debit card",
            PaymentMethod::CashOnDelivery => "cash on delivery",
            PaymentMethod::BankTransfer => "bank transfer",
            PaymentMethod::EWallet => "e-wallet",
            PaymentMethod::LoyaltyPoints => "The 1 Point",
        };
        f.write_str(label)
    }
}

impl FromStr for PaymentMethod {
    type Err = PolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "credit_card" | "installment" => Ok(PaymentMethod::CreditCard),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "cash_on_delivery" | "cod" => Ok(PaymentMethod::CashOnDelivery),
            "bank_transfer" | "online_banking" => Ok(PaymentMethod::BankTransfer),
            "e_wallet" | "ewallet" | "wallet" => Ok(PaymentMethod::EWallet),
            "loyalty_points" | "the_1_point" | "the_1_points" => Ok(PaymentMethod::LoyaltyPoints),
            _ => Err(PolicyError::UnknownPaymentMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundMethod {
    CreditCardRefund,
    DebitCardRefund,
    BankTransfer,
    EWalletRefund,
    LoyaltyAccount,
}

impl fmt::Display for RefundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RefundMethod::CreditCardRefund => "credit card refund",
            RefundMethod::DebitCardRefund => "debit card refund",
            RefundMethod::BankTransfer => "bank transfer",
            RefundMethod::EWalletRefund => "e-wallet refund",
            RefundMethod::LoyaltyAccount => "The 1 Points to The 1 Account",
        };
        f.write_str(label)
    }
}

impl FromStr for RefundMethod {
    type Err = PolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "credit_card_refund" => Ok(RefundMethod::CreditCardRefund),
            "debit_card_refund" => Ok(RefundMethod::DebitCardRefund),
            "bank_transfer" => Ok(RefundMethod::BankTransfer),
            "e_wallet_refund" | "ewallet_refund" => Ok(RefundMethod::EWalletRefund),
            "loyalty_account" | "the_1_account" => Ok(RefundMethod::LoyaltyAccount),
            _ => Err(PolicyError::InvalidRequest(format!("unknown refund method '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadTimeAnchor {
    RefundApproval,
    BankDetailsReceived,
}

impl fmt::Display for LeadTimeAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadTimeAnchor::RefundApproval => write!(f, "refund approval"),
            LeadTimeAnchor::BankDetailsReceived => write!(f, "bank details received"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeadTime {
    Days { min: u32, max: u32, after: LeadTimeAnchor },
    NextBillingCycle,
}

impl fmt::Display for LeadTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadTime::Days { min: 1, max: 1, after } => write!(f, "1 day after {}", after),
            LeadTime::Days { min, max, after } if min == max => {
                write!(f, "{} days after {}", min, after)
            }
            LeadTime::Days { min, max, after } => write!(f, "{}–{} days after {}", min, max, after),
            LeadTime::NextBillingCycle => write!(f, "next billing cycle"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRoute {
    pub method: RefundMethod,
    pub lead_time: LeadTime,
}
