//! Scalar grammars used by the status pages.
//!
//! Parsers return the failure reason as a `String`; callers attach the
//! sub-action and field names.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// e.g. `Jan 3 10:11:12 2023`, after the leading weekday is dropped
pub const SYSTEM_TIME_FORMAT: &str = "%b %d %H:%M:%S %Y";

/// e.g. `24/12/2022 09:05:01` once date and time columns are joined
pub const LOG_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

pub const HZ_SUFFIX: &str = " Hz";
pub const DBMV_SUFFIX: &str = " dBmV";
pub const DB_SUFFIX: &str = " dB";

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Strip `suffix` if present, then surrounding whitespace
pub fn strip_unit<'a>(value: &'a str, suffix: &str) -> &'a str {
    value.strip_suffix(suffix).unwrap_or(value).trim()
}

/// Parse a number with an optional unit suffix
pub fn parse_number<T>(value: &str, suffix: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    let stripped = strip_unit(value, suffix);
    stripped
        .parse::<T>()
        .map_err(|e| format!("unable to convert {stripped:?} to a number: {e}"))
}

pub fn parse_frequency_hz(value: &str) -> Result<u32, String> {
    parse_number(value, HZ_SUFFIX)
}

pub fn parse_power_dbmv(value: &str) -> Result<i32, String> {
    parse_number(value, DBMV_SUFFIX)
}

pub fn parse_snr_db(value: &str) -> Result<i32, String> {
    parse_number(value, DB_SUFFIX)
}

pub fn parse_channel_id(value: &str) -> Result<u8, String> {
    parse_number(value, "")
}

pub fn parse_error_count(value: &str) -> Result<u64, String> {
    parse_number(value, "")
}

fn localize(naive: NaiveDateTime, input: &str) -> Result<DateTime<Local>, String> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("{input:?} does not exist in the local time zone"))
}

/// Parse the device clock, interpreted in the local time zone.
///
/// The leading weekday (`Tue Jan 3 10:11:12 2023`) is required but not
/// checked against the date; device clocks sometimes report a stale one.
pub fn parse_system_time(value: &str) -> Result<DateTime<Local>, String> {
    let dated = match value.trim().split_once(char::is_whitespace) {
        Some((weekday, rest)) if !weekday.is_empty() && weekday.chars().all(|c| c.is_ascii_alphabetic()) => rest,
        _ => return Err(format!("expected a leading weekday in timestamp {value:?}")),
    };
    let naive = NaiveDateTime::parse_from_str(dated.trim(), SYSTEM_TIME_FORMAT)
        .map_err(|e| format!("error parsing timestamp {value:?}: {e}"))?;
    localize(naive, value)
}

/// Parse the separate date and time columns of a log row
pub fn parse_log_timestamp(date: &str, time: &str) -> Result<DateTime<Local>, String> {
    let joined = format!("{} {}", date.trim(), time.trim());
    let naive = NaiveDateTime::parse_from_str(&joined, LOG_TIME_FORMAT)
        .map_err(|e| format!("error parsing log timestamp {joined:?}: {e}"))?;
    localize(naive, &joined)
}

/// Parse an uptime such as `3 days 14h:15m:33s` or `0:05:09`.
///
/// The days prefix is optional; the unit letter after each clock group is
/// accepted but not required.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let split = value
        .split_once(" days ")
        .or_else(|| value.split_once(" day "));
    let (days, clock) = match split {
        Some((days, clock)) => {
            let days = days
                .trim()
                .parse::<u32>()
                .map_err(|e| format!("unable to parse days {days:?} in duration {value:?}: {e}"))?;
            (days, clock)
        }
        None => (0, value),
    };

    let groups: Vec<&str> = clock.trim().split(':').collect();
    let [hours, mins, secs] = groups.as_slice() else {
        return Err(format!(
            "unable to split hours:mins:secs in duration {value:?}, found {} groups",
            groups.len()
        ));
    };
    let hours = parse_clock_group(hours, 'h').map_err(|e| format!("hours in {value:?}: {e}"))?;
    let mins = parse_clock_group(mins, 'm').map_err(|e| format!("minutes in {value:?}: {e}"))?;
    let secs = parse_clock_group(secs, 's').map_err(|e| format!("seconds in {value:?}: {e}"))?;

    // 32-bit inputs keep the total far below u64::MAX
    Ok(Duration::from_secs(
        u64::from(days) * SECS_PER_DAY + u64::from(hours) * 60 * 60 + u64::from(mins) * 60 + u64::from(secs),
    ))
}

fn parse_clock_group(group: &str, unit: char) -> Result<u32, String> {
    let digits = group.strip_suffix(unit).unwrap_or(group);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("expected digits with optional {unit:?} suffix, got {group:?}"));
    }
    digits.parse::<u32>().map_err(|e| format!("{group:?}: {e}"))
}

/// Collapse the runs of spaces the device leaves in log messages
pub fn normalize_log_message(message: &str) -> String {
    message.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ")
}
