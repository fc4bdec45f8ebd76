use time::Date;
use time::macros::format_description;

/// Parses a strict `YYYY-MM-DD` calendar day. Anything else yields `None`.
pub fn parse_day(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_day(date: Date) -> String {
    date.to_string()
}
