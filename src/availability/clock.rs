use once_cell::sync::Lazy;
use regex::Regex;

// Tried in order; the first pattern that matches anywhere in the text wins.
static HOUR_MINUTE_MERIDIEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+):(\d+)\s*(am|pm)").expect("valid regex"));
static HOUR_MERIDIEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(am|pm)").expect("valid regex"));
static HOUR_MINUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+):(\d+)").expect("valid regex"));
static HOUR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("valid regex"));

static MERIDIEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(am|pm)").expect("valid regex"));
static LEADING_HOUR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Parse a wall-clock time into minutes since midnight.
///
/// Accepts "9:00 AM", "9am", "09:00", "21:30" or a bare hour. Without an
/// AM/PM marker the value is read on a 24-hour scale.
pub fn parse_clock_time(text: &str) -> Option<u32> {
    let cleaned = text.trim().to_lowercase();
    if cleaned.is_empty() {
        return None;
    }

    let (hours, minutes, meridiem) = if let Some(caps) = HOUR_MINUTE_MERIDIEM.captures(&cleaned) {
        (
            caps[1].parse::<u32>().ok()?,
            caps[2].parse::<u32>().ok()?,
            meridiem_of(&caps[3]),
        )
    } else if let Some(caps) = HOUR_MERIDIEM.captures(&cleaned) {
        (caps[1].parse::<u32>().ok()?, 0, meridiem_of(&caps[2]))
    } else if let Some(caps) = HOUR_MINUTE.captures(&cleaned) {
        (caps[1].parse::<u32>().ok()?, caps[2].parse::<u32>().ok()?, None)
    } else if let Some(caps) = HOUR.captures(&cleaned) {
        (caps[1].parse::<u32>().ok()?, 0, None)
    } else {
        return None;
    };

    let hours = match meridiem {
        Some(Meridiem::Pm) if hours != 12 => hours + 12,
        Some(Meridiem::Am) if hours == 12 => 0,
        _ => hours,
    };

    hours.checked_mul(60)?.checked_add(minutes)
}

/// Parse both ends of an "open – close" pair.
///
/// An open time of exactly 12 with no AM/PM, paired with a close time that
/// has one, is read as noon ("12:00 – 9:00 PM").
pub fn parse_clock_range(open: &str, close: &str) -> Option<(u32, u32)> {
    let open = open.trim();
    let close = close.trim();

    let bare_noon = !has_meridiem(open) && has_meridiem(close) && leading_hour(open) == Some(12);
    let open_minutes = if bare_noon {
        parse_clock_time(&format!("{} PM", open))?
    } else {
        parse_clock_time(open)?
    };

    Some((open_minutes, parse_clock_time(close)?))
}

pub fn has_meridiem(text: &str) -> bool {
    MERIDIEM.is_match(text)
}

fn leading_hour(text: &str) -> Option<u32> {
    LEADING_HOUR
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
}

fn meridiem_of(text: &str) -> Option<Meridiem> {
    match text {
        "am" => Some(Meridiem::Am),
        "pm" => Some(Meridiem::Pm),
        _ => None,
    }
}

/// "11am", "9:30pm" style label for minutes since midnight.
pub fn format_minutes(minutes: u32) -> String {
    let hours = (minutes / 60) % 24;
    let mins = minutes % 60;
    let suffix = if hours >= 12 { "pm" } else { "am" };
    let display_hours = match hours {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };

    if mins == 0 {
        format!("{}{}", display_hours, suffix)
    } else {
        format!("{}:{:02}{}", display_hours, mins, suffix)
    }
}
