//! Core business logic for Fintrack.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `currency` - Minor-unit money codec and FX rate rules
//! - `ledger` - Accounts, categories, transactions and their lifecycle guards
//! - `transfer` - Transfer planning and fee disclosure
//! - `reports` - Balance-by-account and monthly-by-category aggregation

pub mod currency;
pub mod ledger;
pub mod reports;
pub mod transfer;
