//! Rating statistics over a finished batch.
//!
//! Everything here is pure: the same records always give the same
//! [`RunSummary`](types::RunSummary).

pub mod aggregate;
pub mod types;
pub mod utility;

pub use aggregate::{GRAND_TOTAL_LABEL, aggregate, grand_total_record};
pub use types::RunSummary;
