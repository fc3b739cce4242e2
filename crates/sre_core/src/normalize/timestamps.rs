use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::error::AppError;

/// Canonical RFC3339 UTC rendering used for every stored timestamp.
pub fn format_rfc3339_utc(dt: OffsetDateTime) -> Result<String, AppError> {
    dt.to_offset(UtcOffset::UTC).format(&Rfc3339).map_err(|e| {
        AppError::new("TIME_FORMAT_FAILED", "Failed to format timestamp")
            .with_details(e.to_string())
    })
}

pub fn now_rfc3339_utc() -> Result<String, AppError> {
    format_rfc3339_utc(OffsetDateTime::now_utc())
}

/// Compact `YYYYMMDD_HHMMSS` stamp (UTC) used as the time component of analysis ids.
pub fn compact_stamp(dt: OffsetDateTime) -> Result<String, AppError> {
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    dt.to_offset(UtcOffset::UTC).format(&fmt).map_err(|e| {
        AppError::new("TIME_FORMAT_FAILED", "Failed to format id timestamp")
            .with_details(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_are_utc() {
        let dt = datetime!(2026-03-04 05:06:07 +02:00);
        assert_eq!(format_rfc3339_utc(dt).unwrap(), "2026-03-04T03:06:07Z");
        assert_eq!(compact_stamp(dt).unwrap(), "20260304_030607");
    }
}
