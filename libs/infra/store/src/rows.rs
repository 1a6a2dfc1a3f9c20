use chrono::{DateTime, Utc};

use crate::errors::StoreError;

pub fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub fn parse_dt(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Mapping(format!("invalid timestamp {raw:?}: {e}")))
}

pub fn parse_dt_opt(raw: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    raw.map(|s| parse_dt(&s)).transpose()
}
