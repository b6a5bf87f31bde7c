use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ItemStats90d::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ItemStats90d::Id).text().not_null())
                    .col(ColumnDef::new(ItemStats90d::UrlName).text().not_null())
                    .col(ColumnDef::new(ItemStats90d::Datetime).date().not_null())
                    .col(ColumnDef::new(ItemStats90d::AvgPrice).decimal().null())
                    .col(ColumnDef::new(ItemStats90d::MinPrice).decimal().null())
                    .col(ColumnDef::new(ItemStats90d::MaxPrice).decimal().null())
                    .col(ColumnDef::new(ItemStats90d::Volume).integer().null())
                    // Daily granularity: one sample per item and day
                    .primary_key(
                        Index::create()
                            .col(ItemStats90d::UrlName)
                            .col(ItemStats90d::Datetime),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_item_stats_90d_datetime")
                    .table(ItemStats90d::Table)
                    .col(ItemStats90d::Datetime)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItemStats90d::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ItemStats90d {
    #[sea_orm(iden = "item_stats_90d")]
    Table,
    Id,
    UrlName,
    Datetime,
    AvgPrice,
    MinPrice,
    MaxPrice,
    Volume,
}
