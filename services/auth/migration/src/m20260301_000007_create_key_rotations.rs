use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(KeyRotations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(KeyRotations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(KeyRotations::KeyId).string().not_null())
                    .col(
                        ColumnDef::new(KeyRotations::RotatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(KeyRotations::RotatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(KeyRotations::RecordsReEncrypted)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(KeyRotations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum KeyRotations {
    Table,
    Id,
    KeyId,
    RotatedAt,
    RotatedBy,
    RecordsReEncrypted,
}
