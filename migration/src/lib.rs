pub use sea_orm_migration::prelude::*;

mod m20250715_000001_create_items;
mod m20250715_000002_create_item_stats_48h;
mod m20250715_000003_create_item_stats_90d;
mod m20250717_000001_create_metadata;
mod m20250802_000001_create_item_info;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250715_000001_create_items::Migration),
            Box::new(m20250715_000002_create_item_stats_48h::Migration),
            Box::new(m20250715_000003_create_item_stats_90d::Migration),
            Box::new(m20250717_000001_create_metadata::Migration),
            Box::new(m20250802_000001_create_item_info::Migration),
        ]
    }
}
