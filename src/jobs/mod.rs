pub mod stats_sync;
