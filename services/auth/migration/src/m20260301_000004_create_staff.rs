use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Staff::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Staff::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Staff::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Staff::UserId).uuid().not_null())
                    .col(ColumnDef::new(Staff::Roles).json_binary().not_null())
                    .col(
                        ColumnDef::new(Staff::Status)
                            .string()
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(
                        ColumnDef::new(Staff::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Staff::Table, Staff::TenantId)
                            .to(Hospitals::Table, Hospitals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Staff::Table, Staff::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Staff::Table)
                    .col(Staff::TenantId)
                    .col(Staff::UserId)
                    .unique()
                    .name("uq_staff_tenant_user")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Staff::Table)
                    .col(Staff::UserId)
                    .name("idx_staff_user_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Staff::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Staff {
    Table,
    Id,
    TenantId,
    UserId,
    Roles,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Hospitals {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
