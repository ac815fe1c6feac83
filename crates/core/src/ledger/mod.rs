//! Ledger core: error taxonomy, domain types, lifecycle guards and
//! direct transaction validation.

pub mod error;
pub mod service;
pub mod types;
pub mod validation;

pub use error::{ErrorKind, LedgerError};
pub use service::{LedgerService, NewTransaction};
pub use types::{
    AccountInfo, AccountStatus, CategoryInfo, CategoryType, SystemCategory, TRANSFER_IN_NAME,
    TRANSFER_OUT_NAME,
};
pub use validation::MergeAction;
