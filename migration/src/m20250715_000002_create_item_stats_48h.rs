use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ItemStats48h::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ItemStats48h::Id).text().not_null())
                    .col(ColumnDef::new(ItemStats48h::UrlName).text().not_null())
                    .col(
                        ColumnDef::new(ItemStats48h::Datetime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ItemStats48h::AvgPrice).decimal().null())
                    .col(ColumnDef::new(ItemStats48h::MinPrice).decimal().null())
                    .col(ColumnDef::new(ItemStats48h::MaxPrice).decimal().null())
                    .col(ColumnDef::new(ItemStats48h::Volume).integer().null())
                    // One sample per upstream statistics id and hour
                    .primary_key(
                        Index::create()
                            .col(ItemStats48h::Id)
                            .col(ItemStats48h::Datetime),
                    )
                    .to_owned(),
            )
            .await?;

        // Retention pruning filters on datetime only
        manager
            .create_index(
                Index::create()
                    .name("idx_item_stats_48h_datetime")
                    .table(ItemStats48h::Table)
                    .col(ItemStats48h::Datetime)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItemStats48h::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ItemStats48h {
    #[sea_orm(iden = "item_stats_48h")]
    Table,
    Id,
    UrlName,
    Datetime,
    AvgPrice,
    MinPrice,
    MaxPrice,
    Volume,
}
