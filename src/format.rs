//! Display formatting for document fields.
//!
//! Pure functions from raw record values to the strings a template shows.
//! Timestamps are host unix seconds: zero or negative means "not set" and
//! always formats as an empty string, never as the epoch.

use jiff::Timestamp;
use jiff::tz::TimeZone;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::UnixTime;

const SECONDS_PER_DAY: i64 = 86_400;

/// Literal the templates expect for an empty count.
///
/// Only count fields use it. Money renders a formatted zero instead.
pub const ZERO_PLACEHOLDER: &str = "0 ";

/// Words and patterns for one output language.
#[derive(Debug)]
pub struct Words {
    pub decimal: &'static str,
    pub thousands: &'static str,
    pub date: &'static str,
    pub hour: &'static str,
    pub day_hour: &'static str,
    pub day: &'static str,
    pub days: &'static str,
    /// Monday first.
    pub weekdays: [&'static str; 7],
    /// Present, delayed, absent.
    pub attendance: [&'static str; 3],
    pub tab_card: &'static str,
    pub tab_events: &'static str,
    pub tab_work_stop: &'static str,
    pub tab_metadata: &'static str,
}

static FR_FR: Words = Words {
    decimal: ",",
    thousands: " ",
    date: "%d/%m/%Y",
    hour: "%H:%M",
    day_hour: "%d/%m/%Y %H:%M",
    day: "Jour",
    days: "Jours",
    weekdays: [
        "Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi", "Samedi", "Dimanche",
    ],
    attendance: ["Présent", "En retard", "Absent"],
    tab_card: "Fiche",
    tab_events: "Événements",
    tab_work_stop: "Arrêt de travail",
    tab_metadata: "Métadonnées de l'accident",
};

static EN_US: Words = Words {
    decimal: ".",
    thousands: ",",
    date: "%m/%d/%Y",
    hour: "%I:%M %p",
    day_hour: "%m/%d/%Y %I:%M %p",
    day: "Day",
    days: "Days",
    weekdays: [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ],
    attendance: ["Present", "Delayed", "Absent"],
    tab_card: "Card",
    tab_events: "Events",
    tab_work_stop: "Work stop",
    tab_metadata: "Accident metadata",
};

/// Output language plus the time zone dates are shown in.
#[derive(Debug, Clone)]
pub struct Locale {
    words: &'static Words,
    time_zone: TimeZone,
}

impl Locale {
    /// Look up a built-in language (`fr_FR`, `en_US`).
    pub fn new(language: &str, time_zone: TimeZone) -> Option<Self> {
        let words = match language {
            "fr_FR" | "fr" => &FR_FR,
            "en_US" | "en" => &EN_US,
            _ => return None,
        };
        Some(Self { words, time_zone })
    }

    pub fn fr_fr(time_zone: TimeZone) -> Self {
        Self {
            words: &FR_FR,
            time_zone,
        }
    }

    pub fn en_us(time_zone: TimeZone) -> Self {
        Self {
            words: &EN_US,
            time_zone,
        }
    }

    pub fn words(&self) -> &'static Words {
        self.words
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }
}

/// Which part of a timestamp to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    Day,
    Hour,
    DayHour,
    Weekday,
}

/// Format a timestamp in the locale's time zone.
pub fn format_date(ts: UnixTime, style: DateStyle, locale: &Locale) -> String {
    if ts <= 0 {
        return String::new();
    }
    let Ok(ts) = Timestamp::from_second(ts) else {
        return String::new();
    };
    let zoned = ts.to_zoned(locale.time_zone.clone());
    let words = locale.words;
    match style {
        DateStyle::Day => zoned.strftime(words.date).to_string(),
        DateStyle::Hour => zoned.strftime(words.hour).to_string(),
        DateStyle::DayHour => zoned.strftime(words.day_hour).to_string(),
        DateStyle::Weekday => {
            let index = usize::from(zoned.weekday().to_monday_zero_offset().unsigned_abs());
            words.weekdays[index].to_string()
        }
    }
}

/// Whole days from `start` to `end`, rounded to nearest.
///
/// Ties round away from zero, so swapping the arguments only flips the sign.
/// `None` when either timestamp is unset.
pub fn days_between(start: UnixTime, end: UnixTime) -> Option<i64> {
    if start <= 0 || end <= 0 {
        return None;
    }
    let diff = end - start;
    let quotient = diff / SECONDS_PER_DAY;
    let remainder = diff % SECONDS_PER_DAY;
    if remainder.abs() * 2 >= SECONDS_PER_DAY {
        Some(quotient + remainder.signum())
    } else {
        Some(quotient)
    }
}

/// `"{n} Day"` or `"{n} Days"`: singular when `|n| <= 1`.
pub fn format_days(n: i64, locale: &Locale) -> String {
    let unit = if n.unsigned_abs() <= 1 {
        locale.words.day
    } else {
        locale.words.days
    };
    format!("{n} {unit}")
}

/// Day count from `start` to `end`, or empty when either is unset.
pub fn format_days_between(start: UnixTime, end: UnixTime, locale: &Locale) -> String {
    days_between(start, end)
        .map(|n| format_days(n, locale))
        .unwrap_or_default()
}

/// `"{date} - {n} Days"`: a past date and how long ago it was.
pub fn format_since(ts: UnixTime, now: UnixTime, locale: &Locale) -> String {
    let Some(days) = days_between(ts, now) else {
        return String::new();
    };
    format!(
        "{} - {}",
        format_date(ts, DateStyle::Day, locale),
        format_days(days, locale)
    )
}

/// Money with two decimals and the locale's separators.
pub fn format_price(amount: Decimal, locale: &Locale) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push_str(locale.words.thousands);
        }
        grouped.push(c);
    }

    format!("{sign}{grouped}{}{frac}", locale.words.decimal)
}

/// Upper-case the first character, leave the rest alone.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"LASTNAME Firstname"`.
pub fn person_name(lastname: &str, firstname: &str) -> String {
    format!("{} {}", lastname.to_uppercase(), capitalize(firstname))
}

/// Thumbnail file name for an uploaded image: `tree.png` → `tree_medium.png`.
pub fn thumb_name(file: &str, size: &str) -> String {
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{size}.{ext}"),
        _ => format!("{file}_{size}"),
    }
}
