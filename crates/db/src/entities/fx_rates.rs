//! `SeaORM` Entity for fx_rates table.

use fintrack_core::currency::{parse_currency, ExchangeRate};
use fintrack_core::ledger::LedgerError;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "fx_rates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date: Date,
    pub base: String,
    pub quote: String,
    pub rate_value: Decimal,
    pub source: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts the row into a core exchange rate.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidCurrency` if a stored code is malformed.
    pub fn to_rate(&self) -> Result<ExchangeRate, LedgerError> {
        Ok(ExchangeRate::new(
            parse_currency(&self.base)?,
            parse_currency(&self.quote)?,
            self.rate_value,
            self.date,
            self.source.clone(),
        ))
    }
}
