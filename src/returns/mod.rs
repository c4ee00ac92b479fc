pub mod eligibility;
pub mod item;
pub mod refund;

pub use eligibility::EligibilityChecker;
pub use item::{Decision, IneligibleReason, ItemCondition, OrderItem};
pub use refund::{Payment, RefundEvent, RefundPlan, RefundPortion, RefundScheduler, RefundStep};
