//! `SeaORM` entity definitions.

pub mod accounts;
pub mod categories;
pub mod fx_rates;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod transfers;
