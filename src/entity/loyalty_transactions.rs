use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loyalty_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub delta: i64,
    pub reason: String,
    pub order_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loyalty_accounts::Entity",
        from = "Column::AccountId",
        to = "super::loyalty_accounts::Column::Id"
    )]
    LoyaltyAccounts,
}

impl Related<super::loyalty_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoyaltyAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
