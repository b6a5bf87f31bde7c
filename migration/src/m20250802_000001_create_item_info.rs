use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // warframestat.us objects differ wildly in shape, so each one is kept
        // as a whole JSON document keyed by its uniqueName
        manager
            .create_table(
                Table::create()
                    .table(ItemInfo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ItemInfo::UniqueName)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ItemInfo::Name).text().null())
                    .col(ColumnDef::new(ItemInfo::Data).json_binary().not_null())
                    .col(
                        ColumnDef::new(ItemInfo::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItemInfo::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ItemInfo {
    Table,
    UniqueName,
    Name,
    Data,
    UpdatedAt,
}
