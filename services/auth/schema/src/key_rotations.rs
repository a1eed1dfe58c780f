use sea_orm::entity::prelude::*;

/// Append-only record of PII encryption-key rotations.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "key_rotations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub key_id: String,
    pub rotated_at: chrono::DateTime<chrono::Utc>,
    pub rotated_by: Uuid,
    pub records_re_encrypted: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
