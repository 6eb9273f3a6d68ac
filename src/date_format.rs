//! Date/time formatting for date-valued fields.
//!
//! Two dialects are accepted. A pattern containing `%` is handed to chrono as
//! a strftime pattern. Any other pattern is read as a PHP `date()` style
//! pattern (`Y-m-d`, `jS F Y`, `d/m/Y H:i`, `c`, ...) with `\` escaping the
//! next character. PHP tokens that strftime cannot express (`S`, `z`, `t`,
//! `L`, `Z`) are computed from the value; tokens with no counterpart at all
//! (`B`, `I`, `X`, `x`) are rejected.

use std::fmt::{self, Write};

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, FixedOffset, NaiveDate};

use crate::value::Value;

/// Why a date value could not be rendered with a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFormatError {
    /// The pattern contains a specifier that is unknown or unsupported.
    InvalidPattern(String),
    /// The pattern asks for a component the value does not carry, e.g. an
    /// hour on a plain date.
    Unrenderable { pattern: String, kind: &'static str },
    /// The value is not a date or time.
    NotTemporal(&'static str),
}

impl fmt::Display for DateFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFormatError::InvalidPattern(pattern) => {
                write!(f, "invalid date pattern '{}'", pattern)
            }
            DateFormatError::Unrenderable { pattern, kind } => {
                write!(f, "pattern '{}' cannot be applied to a {} value", pattern, kind)
            }
            DateFormatError::NotTemporal(kind) => {
                write!(f, "expected a date or time value, got {}", kind)
            }
        }
    }
}

impl std::error::Error for DateFormatError {}

/// PHP tokens rendered from the value instead of through strftime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Computed {
    /// `S`: English ordinal suffix of the day of the month.
    OrdinalSuffix,
    /// `z`: day of the year, starting from 0.
    DayOfYear,
    /// `t`: number of days in the month.
    DaysInMonth,
    /// `L`: 1 in a leap year, 0 otherwise.
    LeapYear,
    /// `Z`: UTC offset in seconds.
    OffsetSeconds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Strftime(String),
    Computed(Computed),
}

/// A date pattern split into strftime runs and computed tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    fn parse(pattern: &str) -> Result<Self, DateFormatError> {
        if pattern.contains('%') {
            return Ok(Self {
                segments: vec![Segment::Strftime(pattern.to_string())],
            });
        }
        parse_php(pattern)
    }

    fn push_strftime(&mut self, text: &str) {
        match self.segments.last_mut() {
            Some(Segment::Strftime(run)) => run.push_str(text),
            _ => self.segments.push(Segment::Strftime(text.to_string())),
        }
    }
}

fn parse_php(pattern: &str) -> Result<Pattern, DateFormatError> {
    let mut parsed = Pattern { segments: Vec::new() };
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        let token = match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_literal(&mut parsed, escaped);
                }
                continue;
            }
            'S' | 'z' | 't' | 'L' | 'Z' => {
                let computed = match c {
                    'S' => Computed::OrdinalSuffix,
                    'z' => Computed::DayOfYear,
                    't' => Computed::DaysInMonth,
                    'L' => Computed::LeapYear,
                    _ => Computed::OffsetSeconds,
                };
                parsed.segments.push(Segment::Computed(computed));
                continue;
            }
            'B' | 'I' | 'X' | 'x' => {
                return Err(DateFormatError::InvalidPattern(pattern.to_string()));
            }
            'd' => "%d",
            'D' => "%a",
            'j' => "%-d",
            'l' => "%A",
            'N' => "%u",
            'w' => "%w",
            'W' => "%V",
            'F' => "%B",
            'm' => "%m",
            'M' => "%b",
            'n' => "%-m",
            'o' => "%G",
            'Y' => "%Y",
            'y' => "%y",
            'a' => "%P",
            'A' => "%p",
            'g' => "%-I",
            'G' => "%-H",
            'h' => "%I",
            'H' => "%H",
            'i' => "%M",
            's' => "%S",
            'u' => "%6f",
            'v' => "%3f",
            'e' | 'T' => "%Z",
            'O' => "%z",
            'P' => "%:z",
            'c' => "%Y-%m-%dT%H:%M:%S%:z",
            'r' => "%a, %d %b %Y %H:%M:%S %z",
            'U' => "%s",
            other => {
                push_literal(&mut parsed, other);
                continue;
            }
        };
        parsed.push_strftime(token);
    }

    Ok(parsed)
}

fn push_literal(pattern: &mut Pattern, c: char) {
    if c == '%' {
        pattern.push_strftime("%%");
    } else {
        let mut buf = [0u8; 4];
        pattern.push_strftime(c.encode_utf8(&mut buf));
    }
}

/// Render a date-valued [`Value`] with `pattern`.
pub fn format_value(value: &Value<'_>, pattern: &str) -> Result<String, DateFormatError> {
    if !value.is_temporal() {
        return Err(DateFormatError::NotTemporal(value.kind()));
    }

    let parsed = Pattern::parse(pattern)?;
    let unrenderable = || DateFormatError::Unrenderable {
        pattern: pattern.to_string(),
        kind: value.kind(),
    };

    let mut out = String::new();
    for segment in &parsed.segments {
        match segment {
            Segment::Strftime(run) => {
                let items: Vec<Item<'_>> = StrftimeItems::new(run).collect();
                if items.iter().any(|item| matches!(item, Item::Error)) {
                    return Err(DateFormatError::InvalidPattern(pattern.to_string()));
                }
                write_strftime(&mut out, value, &items).map_err(|_| unrenderable())?;
            }
            Segment::Computed(computed) => {
                let text = render_computed(*computed, value).ok_or_else(unrenderable)?;
                out.push_str(&text);
            }
        }
    }

    Ok(out)
}

fn write_strftime(out: &mut String, value: &Value<'_>, items: &[Item<'_>]) -> fmt::Result {
    match value {
        Value::Date(date) => write!(out, "{}", date.format_with_items(items.iter())),
        Value::Time(time) => write!(out, "{}", time.format_with_items(items.iter())),
        Value::DateTime(datetime) => write!(out, "{}", datetime.format_with_items(items.iter())),
        Value::DateTimeTz(datetime) => write!(out, "{}", datetime.format_with_items(items.iter())),
        _ => Err(fmt::Error),
    }
}

fn calendar_date(value: &Value<'_>) -> Option<NaiveDate> {
    match value {
        Value::Date(date) => Some(*date),
        Value::DateTime(datetime) => Some(datetime.date()),
        Value::DateTimeTz(datetime) => Some(datetime.date_naive()),
        _ => None,
    }
}

fn offset(value: &Value<'_>) -> Option<FixedOffset> {
    match value {
        Value::DateTimeTz(datetime) => Some(*datetime.offset()),
        _ => None,
    }
}

fn render_computed(computed: Computed, value: &Value<'_>) -> Option<String> {
    if computed == Computed::OffsetSeconds {
        return offset(value).map(|offset| offset.local_minus_utc().to_string());
    }

    let date = calendar_date(value)?;
    let text = match computed {
        Computed::OrdinalSuffix => ordinal_suffix(date.day()).to_string(),
        Computed::DayOfYear => date.ordinal0().to_string(),
        Computed::DaysInMonth => days_in_month(date.year(), date.month()).to_string(),
        Computed::LeapYear => u8::from(is_leap_year(date.year())).to_string(),
        Computed::OffsetSeconds => return None,
    };
    Some(text)
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}
