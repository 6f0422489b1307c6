//! Flexible time parsing for user-supplied filter bounds, plus the narrower
//! parser used for server-returned deployment timestamps.

use std::sync::OnceLock;
use std::time::Duration as StdDuration;

use chrono::{
    DateTime, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Utc,
};
use chrono_tz::Tz;
use regex::Regex;

use crate::client::types::Deployment;
use crate::error::{Error, Result};

/// Records whose timestamps do not parse are kept by the time-range filter.
/// Fail-open: an operator investigating an incident should see a deployment
/// with a garbled timestamp rather than have it silently dropped.
pub const KEEP_UNPARSEABLE_TIMESTAMPS: bool = true;

/// Absolute formats tried in order, after RFC3339. Naive values are
/// interpreted in the caller's timezone (flexible parser) or UTC (narrow
/// parser).
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y"];

fn relative_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)\s+(second|minute|hour|day|week|month|year)s?\s+ago$")
            .expect("relative time pattern is valid")
    })
}

/// Parses a time expression in priority order: keywords (`now`, `today`,
/// `yesterday`), relative phrases (`7 days ago`), then fixed absolute
/// formats. Keyword and relative matching is case-insensitive; absolute
/// formats see the original casing because the RFC3339 `Z` suffix is
/// case-sensitive.
pub fn parse_flexible_time(input: &str, tz: Tz, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let original = input.trim();
    if original.is_empty() {
        return Err(Error::EmptyTimeString);
    }

    let lower = original.to_lowercase();
    let local_now = now.with_timezone(&tz);

    match lower.as_str() {
        "now" => return Ok(now),
        "today" => return midnight_in(tz, local_now.date_naive()),
        "yesterday" => {
            let yesterday = local_now.date_naive() - Days::new(1);
            return midnight_in(tz, yesterday);
        }
        _ => {}
    }

    if let Some(captures) = relative_pattern().captures(&lower) {
        let amount: u64 = captures[1]
            .parse()
            .map_err(|_| Error::UnparseableTime(original.to_string()))?;
        let unit = &captures[2];
        return subtract_relative(now, tz, amount, unit)
            .ok_or_else(|| Error::UnparseableTime(original.to_string()));
    }

    if let Some(parsed) = try_absolute_formats(original, |naive| naive_to_utc(tz, naive)) {
        return Ok(parsed);
    }

    Err(Error::UnparseableTime(original.to_string()))
}

/// Parses a server-returned deployment timestamp. Only the fixed absolute
/// formats apply; failure means the format is unsupported, not that the user
/// typed something wrong.
pub fn parse_deployment_timestamp(input: &str) -> Result<DateTime<Utc>> {
    try_absolute_formats(input, |naive| Ok(Utc.from_utc_datetime(&naive)))
        .ok_or_else(|| Error::UnparseableTime(input.to_string()))
}

/// Filters deployments to the given bounds. Both bounds unset passes the
/// records through untouched, without parsing anything. Boundary-equal
/// timestamps are included; unparseable timestamps follow
/// [`KEEP_UNPARSEABLE_TIMESTAMPS`].
pub fn filter_deployments_by_time(
    deployments: Vec<Deployment>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Vec<Deployment> {
    if since.is_none() && until.is_none() {
        return deployments;
    }

    deployments
        .into_iter()
        .filter(|deployment| {
            let parsed = match parse_deployment_timestamp(&deployment.timestamp) {
                Ok(parsed) => parsed,
                Err(_) => return KEEP_UNPARSEABLE_TIMESTAMPS,
            };

            if let Some(since) = since
                && parsed < since
            {
                return false;
            }
            if let Some(until) = until
                && parsed > until
            {
                return false;
            }
            true
        })
        .collect()
}

/// Parses duration strings like `30s`, `5m`, `2h` for config timeouts.
pub fn parse_std_duration(input: &str) -> Result<StdDuration> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(Error::UnparseableTime("empty duration".to_string()));
    }

    let split = compact
        .char_indices()
        .find_map(|(index, c)| (!c.is_ascii_digit()).then_some(index))
        .ok_or_else(|| Error::UnparseableTime(format!("duration missing unit: {input}")))?;

    let (value, unit) = compact.split_at(split);
    let amount: u64 = value
        .parse()
        .map_err(|_| Error::UnparseableTime(format!("invalid duration value: {input}")))?;

    let seconds = match unit.to_ascii_lowercase().as_str() {
        "ms" => return Ok(StdDuration::from_millis(amount)),
        "s" => amount,
        "m" => amount * 60,
        "h" => amount * 3600,
        "d" => amount * 86_400,
        other => {
            return Err(Error::UnparseableTime(format!(
                "unsupported duration unit: {other}"
            )));
        }
    };

    Ok(StdDuration::from_secs(seconds))
}

fn subtract_relative(
    now: DateTime<Utc>,
    tz: Tz,
    amount: u64,
    unit: &str,
) -> Option<DateTime<Utc>> {
    let exact = |duration: Duration| now.checked_sub_signed(duration);
    let local_now = now.with_timezone(&tz);
    // Amounts beyond the unit's representable range fall through to None
    // rather than wrapping in a cast.
    let signed = i64::try_from(amount).ok();
    let months = u32::try_from(amount).ok();

    match unit {
        "second" => exact(Duration::try_seconds(signed?)?),
        "minute" => exact(Duration::try_minutes(signed?)?),
        "hour" => exact(Duration::try_hours(signed?)?),
        // Day and larger units use calendar arithmetic in the caller's
        // timezone, so DST transitions shift the wall clock, not the date.
        "day" => local_now
            .checked_sub_days(Days::new(amount))
            .map(|local| local.with_timezone(&Utc)),
        "week" => local_now
            .checked_sub_days(Days::new(amount.checked_mul(7)?))
            .map(|local| local.with_timezone(&Utc)),
        "month" => local_now
            .checked_sub_months(Months::new(months?))
            .map(|local| local.with_timezone(&Utc)),
        "year" => local_now
            .checked_sub_months(Months::new(months?.checked_mul(12)?))
            .map(|local| local.with_timezone(&Utc)),
        _ => None,
    }
}

fn try_absolute_formats<F>(input: &str, naive_to_instant: F) -> Option<DateTime<Utc>>
where
    F: Fn(NaiveDateTime) -> Result<DateTime<Utc>>,
{
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return naive_to_instant(naive).ok();
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return naive_to_instant(NaiveDateTime::new(date, NaiveTime::MIN)).ok();
        }
    }

    None
}

fn midnight_in(tz: Tz, date: NaiveDate) -> Result<DateTime<Utc>> {
    naive_to_utc(tz, NaiveDateTime::new(date, NaiveTime::MIN))
}

fn naive_to_utc(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(zoned) => Ok(zoned.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, _) => Ok(first.with_timezone(&Utc)),
        LocalResult::None => Err(Error::UnparseableTime(format!(
            "{naive} does not exist in timezone due to DST transition"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
    use chrono_tz::America::New_York;
    use chrono_tz::Tz;

    use crate::client::types::Deployment;
    use crate::error::Error;
    use crate::time::{
        filter_deployments_by_time, parse_deployment_timestamp, parse_flexible_time,
        parse_std_duration,
    };

    const UTC_TZ: Tz = chrono_tz::UTC;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 20, 30, 45)
            .single()
            .expect("fixed timestamp")
    }

    fn deployment(timestamp: &str) -> Deployment {
        Deployment {
            timestamp: timestamp.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_input_fails_before_any_strategy() {
        let error = parse_flexible_time("   ", UTC_TZ, fixed_now()).expect_err("must fail");
        assert_eq!(error.to_string(), "empty time string");
    }

    #[test]
    fn unrecognized_input_names_the_original_string() {
        let error = parse_flexible_time("not a date", UTC_TZ, fixed_now()).expect_err("must fail");
        assert_eq!(error.to_string(), "unable to parse time: not a date");
    }

    #[test]
    fn now_returns_the_evaluation_instant() {
        let now = fixed_now();
        assert_eq!(parse_flexible_time("now", UTC_TZ, now).expect("valid"), now);
        assert_eq!(parse_flexible_time("NOW", UTC_TZ, now).expect("valid"), now);
    }

    #[test]
    fn today_is_midnight_of_the_current_date() {
        let result = parse_flexible_time("today", UTC_TZ, fixed_now()).expect("valid");
        assert_eq!((result.year(), result.month(), result.day()), (2025, 6, 15));
        assert_eq!((result.hour(), result.minute(), result.second()), (0, 0, 0));
    }

    #[test]
    fn yesterday_is_one_calendar_day_before_today() {
        let today = parse_flexible_time("today", UTC_TZ, fixed_now()).expect("valid");
        let yesterday = parse_flexible_time("yesterday", UTC_TZ, fixed_now()).expect("valid");
        assert_eq!(today - yesterday, Duration::days(1));
        assert_eq!(yesterday.day(), 14);
    }

    #[test]
    fn today_respects_the_caller_timezone() {
        // 20:30 UTC on June 15 is 16:30 the same day in New York.
        let result = parse_flexible_time("today", New_York, fixed_now()).expect("valid");
        let local = result.with_timezone(&New_York);
        assert_eq!((local.year(), local.month(), local.day()), (2025, 6, 15));
        assert_eq!(local.hour(), 0);
    }

    #[test]
    fn days_ago_uses_calendar_days() {
        let result = parse_flexible_time("7 days ago", UTC_TZ, fixed_now()).expect("valid");
        assert_eq!((result.year(), result.month(), result.day()), (2025, 6, 8));
    }

    #[test]
    fn hours_ago_subtracts_an_exact_duration() {
        let result = parse_flexible_time("2 hours ago", UTC_TZ, fixed_now()).expect("valid");
        assert_eq!(fixed_now() - result, Duration::hours(2));
    }

    #[test]
    fn weeks_months_and_years_ago_parse() {
        let now = fixed_now();
        let week = parse_flexible_time("1 week ago", UTC_TZ, now).expect("valid");
        assert_eq!((week.month(), week.day()), (6, 8));

        let month = parse_flexible_time("1 month ago", UTC_TZ, now).expect("valid");
        assert_eq!(month.month(), 5);

        let year = parse_flexible_time("2 years ago", UTC_TZ, now).expect("valid");
        assert_eq!(year.year(), 2023);
    }

    #[test]
    fn out_of_range_relative_amounts_fail_instead_of_wrapping() {
        let now = fixed_now();
        for input in [
            "99999999999 months ago",
            "99999999999 years ago",
            "99999999999999999999 seconds ago",
            "18446744073709551615 weeks ago",
        ] {
            let error = parse_flexible_time(input, UTC_TZ, now).expect_err("out of range");
            assert!(matches!(error, Error::UnparseableTime(_)), "{input}");
        }
    }

    #[test]
    fn singular_units_and_mixed_case_match() {
        let result = parse_flexible_time("1 Day Ago", UTC_TZ, fixed_now()).expect("valid");
        assert_eq!(result.day(), 14);
    }

    #[test]
    fn rfc3339_parses_with_and_without_fractional_seconds() {
        let plain = parse_flexible_time("2025-01-15T14:30:00Z", UTC_TZ, fixed_now()).expect("ok");
        assert_eq!((plain.year(), plain.month(), plain.day()), (2025, 1, 15));
        assert_eq!(plain.hour(), 14);

        let fractional =
            parse_flexible_time("2025-01-15T14:30:00.250Z", UTC_TZ, fixed_now()).expect("ok");
        assert_eq!(fractional.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn date_only_formats_parse_as_midnight() {
        for input in ["2025-01-15", "01/15/2025", "Jan 15, 2025"] {
            let result = parse_flexible_time(input, UTC_TZ, fixed_now()).expect(input);
            assert_eq!((result.year(), result.month(), result.day()), (2025, 1, 15));
            assert_eq!(result.hour(), 0);
        }
    }

    #[test]
    fn naive_datetime_formats_parse() {
        for input in ["2025-01-15T08:00:00", "2025-01-15 08:00:00"] {
            let result = parse_flexible_time(input, UTC_TZ, fixed_now()).expect(input);
            assert_eq!(result.hour(), 8);
        }
    }

    #[test]
    fn deployment_parser_rejects_keywords_and_relative_forms() {
        assert!(parse_deployment_timestamp("2025-01-15T14:30:00Z").is_ok());
        assert!(parse_deployment_timestamp("yesterday").is_err());
        assert!(parse_deployment_timestamp("7 days ago").is_err());
    }

    #[test]
    fn filter_passes_through_when_both_bounds_are_unset() {
        let deployments = vec![deployment("garbage"), deployment("also garbage")];
        let filtered = filter_deployments_by_time(deployments, None, None);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn filter_keeps_records_with_unparseable_timestamps() {
        let since = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).single();
        let deployments = vec![deployment("garbage"), deployment("2025-05-01T00:00:00Z")];
        let filtered = filter_deployments_by_time(deployments, since, None);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].timestamp, "garbage");
    }

    #[test]
    fn filter_boundaries_are_inclusive() {
        let since = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).single();
        let until = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).single();
        let deployments = vec![
            deployment("2025-06-01T00:00:00Z"),
            deployment("2025-06-30T00:00:00Z"),
            deployment("2025-05-31T23:59:59Z"),
            deployment("2025-06-30T00:00:01Z"),
        ];

        let filtered = filter_deployments_by_time(deployments, since, until);
        let timestamps: Vec<&str> = filtered.iter().map(|d| d.timestamp.as_str()).collect();
        assert_eq!(
            timestamps,
            vec!["2025-06-01T00:00:00Z", "2025-06-30T00:00:00Z"]
        );
    }

    #[test]
    fn std_durations_parse_common_units() {
        use std::time::Duration as StdDuration;

        assert_eq!(
            parse_std_duration("30s").expect("valid"),
            StdDuration::from_secs(30)
        );
        assert_eq!(
            parse_std_duration("5m").expect("valid"),
            StdDuration::from_secs(300)
        );
        assert_eq!(
            parse_std_duration("250ms").expect("valid"),
            StdDuration::from_millis(250)
        );
        assert!(parse_std_duration("30").is_err());
        assert!(parse_std_duration("s").is_err());
    }
}
