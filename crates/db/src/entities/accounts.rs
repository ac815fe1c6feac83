//! `SeaORM` Entity for accounts table.

use fintrack_core::currency::parse_currency;
use fintrack_core::ledger::{AccountInfo, LedgerError};
use fintrack_shared::types::AccountId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AccountStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub currency: String,
    pub status: AccountStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts the row into the core view of an account.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidCurrency` if the stored code is malformed.
    pub fn to_info(&self) -> Result<AccountInfo, LedgerError> {
        Ok(AccountInfo {
            id: AccountId::from_uuid(self.id),
            name: self.name.clone(),
            currency: parse_currency(&self.currency)?,
            status: self.status.into(),
        })
    }
}
