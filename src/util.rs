use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::time::Duration;

/// Parses an absolute or relative date without consulting any repository.
///
/// Accepts RFC3339, `YYYY-MM-DD` (midnight UTC), phrases such as `3 weeks ago`
/// and humantime durations such as `90d` or `2weeks`, both counted back from `now`.
pub fn parse_date(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|datetime| Utc.from_utc_datetime(&datetime));
    }

    let duration = parse_natural_duration(input)
        .or_else(|| humantime::parse_duration(input.trim()).ok())?;
    let duration = chrono::Duration::from_std(duration).ok()?;
    now.checked_sub_signed(duration)
}

fn parse_natural_duration(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();
    let units = [
        ("day", 86400u64),
        ("week", 7 * 86400),
        ("month", 30 * 86400),
        ("year", 365 * 86400),
    ];
    let rest = input.strip_suffix(" ago")?;
    let (count, unit) = rest.split_once(' ')?;
    let n: u64 = count.trim().parse().ok()?;
    let unit = unit.trim().trim_end_matches('s');
    units
        .iter()
        .find(|(name, _)| *name == unit)
        .and_then(|(_, secs)| n.checked_mul(*secs))
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_plain_dates_at_midnight_utc() {
        assert_eq!(
            parse_date("2024-01-02", now()),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        assert_eq!(
            parse_date("2024-01-02T10:00:00+02:00", now()),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn parses_relative_phrases() {
        assert_eq!(
            parse_date("2 weeks ago", now()),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date("1 day ago", now()),
            Some(Utc.with_ymd_and_hms(2024, 6, 14, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn parses_humantime_durations() {
        assert_eq!(
            parse_date("10days", now()),
            Some(Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn huge_relative_phrases_are_rejected() {
        assert_eq!(parse_date("99999999999999999 years ago", now()), None);
        assert_eq!(parse_date("5000000000 days ago", now()), None);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_date("yesterday-ish", now()), None);
        assert_eq!(parse_date("2024-13-40", now()), None);
    }
}
