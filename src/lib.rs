pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod policy;
pub mod returns;
pub mod storage;
pub mod utils;

pub use catalog::PolicyCatalog;
pub use config::Config;
pub use error::{PolicyError, Result};
pub use policy::PolicyDocument;
pub use returns::{EligibilityChecker, RefundScheduler};
