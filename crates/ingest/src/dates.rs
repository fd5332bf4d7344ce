use chrono::{DateTime, Local, NaiveDate};

/// Today in the local timezone — the total-function fallback for anything
/// the normalizer cannot read.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Normalize a raw date cell into a calendar date. Total function:
///
/// 1. empty input → today;
/// 2. ISO (`YYYY-MM-DD`, or an RFC 3339 timestamp) → that date;
/// 3. exactly three `/`- or `-`-separated parts: a 4-digit first part reads
///    as year-month-day, a 4-digit last part reads as day-month-year (the
///    source population writes day first);
/// 4. anything else → today.
///
/// Two-digit years and MM/DD-vs-DD/MM strings where neither end has 4
/// digits fall through to today. That imprecision is known and accepted;
/// guessing would be worse.
pub fn normalize(raw: &str) -> NaiveDate {
    let raw = raw.trim();
    if raw.is_empty() {
        return today();
    }

    // chrono's %Y accepts 1- and 2-digit years, which would let the ISO fast
    // path swallow ambiguous dash-separated inputs like "05-03-24". Only
    // treat the input as ISO when the leading segment is a 4-digit year.
    if is_year(raw.split('-').next().unwrap_or("")) {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return date;
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive();
    }

    let parts: Vec<&str> = raw.split(['/', '-']).collect();
    if parts.len() == 3 {
        if let (Some(a), Some(b), Some(c)) = (num(parts[0]), num(parts[1]), num(parts[2])) {
            if is_year(parts[0]) {
                return NaiveDate::from_ymd_opt(a as i32, b, c).unwrap_or_else(today);
            }
            if is_year(parts[2]) {
                return NaiveDate::from_ymd_opt(c as i32, b, a).unwrap_or_else(today);
            }
        }
    }

    today()
}

fn is_year(part: &str) -> bool {
    part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit())
}

fn num(part: &str) -> Option<u32> {
    part.parse().ok()
}
