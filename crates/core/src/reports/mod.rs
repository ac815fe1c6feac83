//! Ledger report generation.
//!
//! This module provides pure business logic for the two period reports:
//! - Balance by account
//! - Monthly totals by category
//!
//! Both optionally convert every line to a single report currency.

pub mod service;
pub mod types;


pub use service::{ReportService, NATIVE_CATEGORY_FALLBACK_CURRENCY};
pub use types::*;
