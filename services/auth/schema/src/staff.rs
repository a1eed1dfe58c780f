use sea_orm::entity::prelude::*;

/// Tenant membership of a user. Unique per (tenant_id, user_id).
/// `status` is one of ACTIVE, INACTIVE, LOCKED, PASSWORD_EXPIRED.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "staff")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    /// JSON array of role ids.
    #[sea_orm(column_type = "JsonBinary")]
    pub roles: Json,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hospitals::Entity",
        from = "Column::TenantId",
        to = "super::hospitals::Column::Id"
    )]
    Hospital,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::hospitals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hospital.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
