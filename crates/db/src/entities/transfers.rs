//! `SeaORM` Entity for transfers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub src_account_id: Uuid,
    pub dst_account_id: Uuid,
    pub src_amount_minor: i64,
    pub dst_amount_minor: i64,
    pub rate_base: String,
    pub rate_quote: String,
    pub rate_value: Decimal,
    pub occurred_at: DateTimeWithTimeZone,
    pub voided: bool,
    pub ref_rate_value: Option<Decimal>,
    pub ref_rate_date: Option<Date>,
    pub ref_rate_source: Option<String>,
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
