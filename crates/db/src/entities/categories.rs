//! `SeaORM` Entity for categories table.

use fintrack_core::ledger::CategoryInfo;
use fintrack_shared::types::CategoryId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::CategoryType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[sea_orm(column_name = "type")]
    pub category_type: CategoryType,
    pub active: bool,
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
    /// Converts the row into the core view of a category.
    #[must_use]
    pub fn to_info(&self) -> CategoryInfo {
        CategoryInfo {
            id: CategoryId::from_uuid(self.id),
            name: self.name.clone(),
            category_type: self.category_type.into(),
            active: self.active,
        }
    }
}
