use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SecurityEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SecurityEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SecurityEvents::EventType).string().not_null())
                    .col(ColumnDef::new(SecurityEvents::Severity).string().not_null())
                    .col(ColumnDef::new(SecurityEvents::TenantId).uuid())
                    .col(ColumnDef::new(SecurityEvents::UserId).uuid())
                    .col(ColumnDef::new(SecurityEvents::Ip).string())
                    .col(ColumnDef::new(SecurityEvents::UserAgent).text())
                    .col(ColumnDef::new(SecurityEvents::Details).json_binary().not_null())
                    .col(
                        ColumnDef::new(SecurityEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(SecurityEvents::Table)
                    .col(SecurityEvents::TenantId)
                    .col(SecurityEvents::CreatedAt)
                    .name("idx_security_events_tenant_created")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SecurityEvents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SecurityEvents {
    Table,
    Id,
    EventType,
    Severity,
    TenantId,
    UserId,
    Ip,
    UserAgent,
    Details,
    CreatedAt,
}
