//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every user-owned read and write is scoped by `user_id`.

pub mod account;
pub mod category;
pub mod error;
pub mod fx_rate;
pub mod report;
pub mod transaction;
pub mod transfer;

pub use account::{AccountFilter, AccountRepository, UpdateAccountInput};
pub use category::{CategoryFilter, CategoryRepository, UpdateCategoryInput};
pub use error::{RepoResult, RepositoryError};
pub use fx_rate::{FxRateRepository, RateFilter, RateLookup, UpsertOutcome};
pub use report::ReportRepository;
pub use transaction::{
    CreateTransactionInput, TransactionFilter, TransactionRecord, TransactionRepository,
    UpdateTransactionInput,
};
pub use transfer::{CreateTransferInput, CreatedTransfer, TransferRepository};
