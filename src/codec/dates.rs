//! Date string parsing and formatting.
//!
//! Notion sends three shapes of date string: date-only (`2023-04-01`),
//! RFC 3339 with an offset (`2023-04-01T09:30:00.000+02:00`), and naive
//! wall-clock time (`2023-04-01T09:30:00`) that is only meaningful together
//! with a `time_zone`.

use crate::error::DecodeError;
use crate::model::BoundFormat;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// A parsed date bound and the shape it was written in.
pub(crate) struct ParsedBound {
    pub value: DateTime<Tz>,
    pub format: BoundFormat,
}

/// Materializes one bound of a date payload in `zone`.
///
/// Strings with an explicit offset are converted into the zone; naive
/// strings are read as wall-clock time in it. An ambiguous wall-clock time
/// (DST fold) resolves to the earlier instant; a nonexistent one (DST gap)
/// is an error.
pub(crate) fn parse_bound(
    field: &str,
    raw: &str,
    zone: Tz,
) -> Result<ParsedBound, DecodeError> {
    let invalid = |reason: &str| DecodeError::InvalidDate {
        field: field.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| invalid("no midnight"))?;
        let value = resolve_local(&midnight, zone)
            .ok_or_else(|| invalid("midnight does not exist in this time zone"))?;
        return Ok(ParsedBound {
            value,
            format: BoundFormat::DateOnly,
        });
    }

    if let Ok(fixed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ParsedBound {
            value: fixed.with_timezone(&zone),
            format: BoundFormat::Offset(*fixed.offset()),
        });
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            let value = resolve_local(&naive, zone)
                .ok_or_else(|| invalid("wall-clock time falls in a DST gap"))?;
            return Ok(ParsedBound {
                value,
                format: BoundFormat::WallClock,
            });
        }
    }

    Err(invalid("not an ISO 8601 date or date-time"))
}

fn resolve_local(naive: &NaiveDateTime, zone: Tz) -> Option<DateTime<Tz>> {
    zone.from_local_datetime(naive).earliest()
}

/// Parses a server timestamp such as `created_time`.
pub(crate) fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|fixed| fixed.with_timezone(&Utc))
        .map_err(|e| DecodeError::InvalidDate {
            field: field.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn date_only_is_midnight_in_zone() {
        let bound = parse_bound("date.start", "2023-04-01", Tz::Europe__Berlin).unwrap();
        assert_eq!(bound.format, BoundFormat::DateOnly);
        assert_eq!(bound.value.hour(), 0);
        assert_eq!(
            bound.value.with_timezone(&Utc).to_rfc3339(),
            "2023-03-31T22:00:00+00:00"
        );
    }

    #[test]
    fn offset_strings_convert_into_zone() {
        let bound =
            parse_bound("date.start", "2023-04-01T12:00:00.000+00:00", Tz::Asia__Tokyo).unwrap();
        assert!(bound.format.includes_time());
        assert_eq!(bound.value.hour(), 21);
        assert_eq!(
            bound.format.render(&bound.value),
            "2023-04-01T12:00:00.000+00:00"
        );
    }

    #[test]
    fn naive_strings_are_wall_clock() {
        let bound =
            parse_bound("date.start", "2020-12-08T12:00:00", Tz::America__New_York).unwrap();
        assert_eq!(bound.format, BoundFormat::WallClock);
        assert_eq!(
            bound.value.with_timezone(&Utc).to_rfc3339(),
            "2020-12-08T17:00:00+00:00"
        );
    }

    #[test]
    fn dst_fold_takes_earlier_instant() {
        // 02:30 happens twice in Berlin on 2023-10-29.
        let bound =
            parse_bound("date.start", "2023-10-29T02:30:00", Tz::Europe__Berlin).unwrap();
        assert_eq!(
            bound.value.with_timezone(&Utc).to_rfc3339(),
            "2023-10-29T00:30:00+00:00"
        );
    }

    #[test]
    fn dst_gap_is_rejected() {
        let err = parse_bound("date.start", "2023-03-26T02:30:00", Tz::Europe__Berlin)
            .err()
            .unwrap();
        assert!(matches!(err, DecodeError::InvalidDate { .. }));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_bound("date.start", "April 1st", Tz::UTC).is_err());
        assert!(parse_timestamp("created_time", "yesterday").is_err());
    }

    #[test]
    fn rendering_follows_the_parsed_shape() {
        let zone = Tz::America__New_York;
        for raw in [
            "2020-12-08",
            "2020-12-08T12:00:00.000",
            "2020-12-08T12:00:00.000-05:00",
            "2020-12-08T12:00:00.000+09:00",
        ] {
            let bound = parse_bound("date.start", raw, zone).unwrap();
            assert_eq!(bound.format.render(&bound.value), raw);
        }
    }
}
