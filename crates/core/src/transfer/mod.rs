//! Transfer engine: moves value between two accounts of the same user,
//! possibly across currencies, and discloses the implied FX fee.

pub mod disclosure;
pub mod service;
pub mod types;

pub use disclosure::FeeDisclosure;
pub use service::TransferService;
pub use types::{RateSnapshot, TransferIntent, TransferPlan, TransferRequest};
