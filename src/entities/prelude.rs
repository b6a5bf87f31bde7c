//! `SeaORM` Entity prelude

pub use super::item_info::Entity as ItemInfo;
pub use super::item_stats_48h::Entity as ItemStats48h;
pub use super::item_stats_90d::Entity as ItemStats90d;
pub use super::items::Entity as Items;
pub use super::metadata::Entity as Metadata;
