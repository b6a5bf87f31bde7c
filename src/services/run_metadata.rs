//! Run metadata stored in the `metadata` key/value table

use chrono::{NaiveDateTime, SubsecRound, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Set};
use tracing::{info, warn};

use crate::entities::{metadata, prelude::*};

/// Key holding the last successful run timestamp
pub const LAST_UPDATED_KEY: &str = "last_updated";

/// Format used for timestamps: ISO-8601, UTC, no offset
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Accepts stored values with any (or no) fractional seconds
const LENIENT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Short form shown to readers, e.g. `17.07.2025 14:05`
const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Overwrite the last-updated timestamp with the current UTC instant
pub async fn record_last_updated<C: ConnectionTrait>(db: &C) -> Result<NaiveDateTime, DbErr> {
    // Stored with microsecond precision
    let now = Utc::now().naive_utc().trunc_subsecs(6);
    set_value(db, LAST_UPDATED_KEY, &now.format(TIMESTAMP_FORMAT).to_string()).await?;

    info!(last_updated = %now, "Recorded last_updated timestamp");
    Ok(now)
}

/// Read back the last-updated timestamp, if one was recorded and parses
pub async fn last_updated<C: ConnectionTrait>(db: &C) -> Result<Option<NaiveDateTime>, DbErr> {
    let record = Metadata::find_by_id(LAST_UPDATED_KEY.to_string()).one(db).await?;

    Ok(record
        .and_then(|r| r.value)
        .and_then(|raw| NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).ok()))
}

/// The last-updated value formatted for display.
///
/// A stored value that does not parse is returned as is.
pub async fn last_updated_display<C: ConnectionTrait>(db: &C) -> Result<Option<String>, DbErr> {
    let raw = Metadata::find_by_id(LAST_UPDATED_KEY.to_string())
        .one(db)
        .await?
        .and_then(|r| r.value);

    Ok(raw.map(|raw| format_for_display(&raw)))
}

fn format_for_display(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, LENIENT_FORMAT) {
        Ok(parsed) => parsed.format(DISPLAY_FORMAT).to_string(),
        Err(e) => {
            warn!(raw = %raw, error = %e, "Unparsable last_updated value");
            raw.to_string()
        }
    }
}

/// Upsert a metadata value
pub async fn set_value<C: ConnectionTrait>(db: &C, key: &str, value: &str) -> Result<(), DbErr> {
    let model = metadata::ActiveModel {
        key: Set(key.to_string()),
        value: Set(Some(value.to_string())),
    };

    Metadata::insert(model)
        .on_conflict(
            OnConflict::column(metadata::Column::Key)
                .update_column(metadata::Column::Value)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_timestamp_format_round_trips() {
        let ts = NaiveDate::from_ymd_opt(2025, 7, 17)
            .unwrap()
            .and_hms_micro_opt(14, 5, 9, 123456)
            .unwrap();
        let raw = ts.format(TIMESTAMP_FORMAT).to_string();

        assert_eq!(raw, "2025-07-17T14:05:09.123456");
        assert_eq!(NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).unwrap(), ts);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(format_for_display("2025-07-17T14:05:09.123456"), "17.07.2025 14:05");
        assert_eq!(format_for_display("2025-07-17T14:05:09"), "17.07.2025 14:05");
        assert_eq!(format_for_display("yesterday"), "yesterday");
    }
}
