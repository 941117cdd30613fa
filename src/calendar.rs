//! Calendar helpers for seeding the real time clock
//!
//! The usual way to seed a clock without a user interface is to flash the
//! firmware with the build time, which compilers hand out as two strings:
//! `"Mon D YYYY"` (day space padded, `"Jan  5 2024"`) and `"HH:MM:SS"`.

use crate::ds1302::TimeReading;

/// Parse errors for date and time strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Wrong number of fields or a non numeric field
    Format,
    /// Unknown month abbreviation
    Month,
    /// A field is outside its calendar range
    Range,
}

/// Calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Date {
    /// Day of month, 1-31
    pub day: u8,
    /// Month, 1-12
    pub month: u8,
    /// Full year, 2000-2099
    pub year: u16,
}

/// Time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Time {
    /// 0-23
    pub hour: u8,
    /// 0-59
    pub minute: u8,
    /// 0-59
    pub second: u8,
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Whether `year` is a Gregorian leap year
pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`
pub fn days_in_month(month: u8, year: u16) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Day of the week for a Gregorian date, Monday = 1 through Sunday = 7.
///
/// `year` is the full year (2024, not 24). `month` is 1-12; values outside
/// that range are clamped to it, so any input yields a weekday.
pub fn day_of_week(day: u8, month: u8, year: u16) -> u8 {
    // Sakamoto's method, 0 = Sunday
    const OFFSETS: [u32; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
    let month = month.max(1).min(12);

    let y = u32::from(if month < 3 { year.saturating_sub(1) } else { year });
    let index = (y + y / 4 - y / 100 + y / 400 + OFFSETS[usize::from(month - 1)] + u32::from(day)) % 7;
    if index == 0 {
        7
    } else {
        index as u8
    }
}

fn parse_number<T: core::str::FromStr>(field: &str) -> Result<T, ParseError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::Format);
    }
    field.parse().map_err(|_| ParseError::Format)
}

/// Parse a `"Mon D YYYY"` date
pub fn parse_date(date: &str) -> Result<Date, ParseError> {
    let mut fields = date.split_whitespace();
    let (month, day, year) = match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(month), Some(day), Some(year), None) => (month, day, year),
        _ => return Err(ParseError::Format),
    };

    let month = MONTHS
        .iter()
        .position(|name| *name == month)
        .ok_or(ParseError::Month)? as u8
        + 1;
    let day: u8 = parse_number(day)?;
    let year: u16 = parse_number(year)?;

    if !(2000..=2099).contains(&year) || day == 0 || day > days_in_month(month, year) {
        return Err(ParseError::Range);
    }

    Ok(Date { day, month, year })
}

/// Parse a `"HH:MM:SS"` time
pub fn parse_time(time: &str) -> Result<Time, ParseError> {
    let mut fields = time.trim().split(':');
    let (hour, minute, second) = match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(hour), Some(minute), Some(second), None) => (hour, minute, second),
        _ => return Err(ParseError::Format),
    };

    let hour: u8 = parse_number(hour)?;
    let minute: u8 = parse_number(minute)?;
    let second: u8 = parse_number(second)?;

    if hour > 23 || minute > 59 || second > 59 {
        return Err(ParseError::Range);
    }

    Ok(Time {
        hour,
        minute,
        second,
    })
}

/// Build a [`TimeReading`] from a build date and time string pair
pub fn time_from_build_strings(date: &str, time: &str) -> Result<TimeReading, ParseError> {
    let date = parse_date(date)?;
    let time = parse_time(time)?;

    Ok(TimeReading {
        second: time.second,
        minute: time.minute,
        hour: time.hour,
        day: date.day,
        month: date.month,
        day_of_week: day_of_week(date.day, date.month, date.year),
        year: (date.year - 2000) as u8,
    })
}
