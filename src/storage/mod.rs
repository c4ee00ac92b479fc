pub mod db;
pub mod models;

pub use db::Database;
pub use models::{DatabaseStats, EvaluationRecord, RefundRecord};
