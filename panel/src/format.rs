//! Display formatting helpers shared by tables, pages and the CLI

use chrono::{DateTime, Utc};

/// Placeholder shown for missing values
pub const MISSING: &str = "-";

pub const FULL_DATE_FORMAT: &str = "%b %-d, %Y, %-I:%M %p";
pub const DATE_ONLY_FORMAT: &str = "%b %-d, %Y";
pub const SHORT_DATE_FORMAT: &str = "%m/%d/%Y, %-I:%M %p";

/// "Jan 15, 2024, 10:30 AM"
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    format_date_with(date, FULL_DATE_FORMAT)
}

pub fn format_date_with(date: Option<DateTime<Utc>>, format: &str) -> String {
    match date {
        Some(date) => date.format(format).to_string(),
        None => MISSING.to_string(),
    }
}

/// "5 minutes ago", "in about 2 hours"
pub fn format_relative_time(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(date) => relative_time_between(date, Utc::now()),
        None => MISSING.to_string(),
    }
}

pub fn relative_time_between(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - date).num_seconds();
    let distance = describe_distance(seconds.unsigned_abs());
    if seconds >= 0 {
        format!("{} ago", distance)
    } else {
        format!("in {}", distance)
    }
}

fn describe_distance(seconds: u64) -> String {
    const MINUTES_PER_DAY: u64 = 1440;
    const MINUTES_PER_MONTH: u64 = 43_200;
    const MINUTES_PER_YEAR: u64 = 525_600;

    let minutes = (seconds + 30) / 60;
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    match minutes {
        0 => "less than a minute".to_string(),
        1..=44 => plural(minutes, "minute"),
        45..=89 => "about 1 hour".to_string(),
        90..=1439 => format!("about {}", plural((minutes + 30) / 60, "hour")),
        1440..=2519 => "1 day".to_string(),
        2520..=43_199 => plural((minutes + MINUTES_PER_DAY / 2) / MINUTES_PER_DAY, "day"),
        43_200..=86_399 => format!(
            "about {}",
            plural((minutes + MINUTES_PER_MONTH / 2) / MINUTES_PER_MONTH, "month")
        ),
        86_400..=525_599 => plural((minutes + MINUTES_PER_MONTH / 2) / MINUTES_PER_MONTH, "month"),
        _ => format!("about {}", plural(minutes / MINUTES_PER_YEAR, "year")),
    }
}

/// Binary units with trailing zeros dropped: 1536 -> "1.5 KB"
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    const UNITS: [&str; 6] = ["Bytes", "KB", "MB", "GB", "TB", "PB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    format!("{} {}", trim_decimals(value, decimals), UNITS[exponent])
}

/// Thousands separated: 1234567 -> "1,234,567"
pub fn format_number(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn truncate(text: &str, length: usize) -> String {
    if text.chars().count() <= length {
        return text.to_string();
    }
    let head: String = text.chars().take(length).collect();
    format!("{}...", head)
}

pub fn format_ip_port(ip: &str, port: Option<u16>) -> String {
    if ip.is_empty() {
        return MISSING.to_string();
    }
    match port {
        Some(port) => format!("{}:{}", ip, port),
        None => ip.to_string(),
    }
}

pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

/// Two-letter initials for avatars
pub fn initials(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.as_slice() {
        [] => "?".to_string(),
        [single] => single.chars().take(2).collect::<String>().to_uppercase(),
        [first, .., last] => first
            .chars()
            .take(1)
            .chain(last.chars().take(1))
            .collect::<String>()
            .to_uppercase(),
    }
}

pub fn format_percentage(value: f64, total: f64, decimals: usize) -> String {
    if total == 0.0 || value == 0.0 {
        return "0%".to_string();
    }
    format!("{:.*}%", decimals, value / total * 100.0)
}

fn trim_decimals(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_date(Some(date)), "Jan 15, 2024, 10:30 AM");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(relative_time_between(now - Duration::seconds(10), now), "less than a minute ago");
        assert_eq!(relative_time_between(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(relative_time_between(now - Duration::minutes(60), now), "about 1 hour ago");
        assert_eq!(relative_time_between(now - Duration::hours(3), now), "about 3 hours ago");
        assert_eq!(relative_time_between(now - Duration::days(3), now), "3 days ago");
        assert_eq!(relative_time_between(now + Duration::minutes(2), now), "in 2 minutes");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0, 2), "0 Bytes");
        assert_eq!(format_bytes(512, 2), "512 Bytes");
        assert_eq!(format_bytes(1536, 2), "1.5 KB");
        assert_eq!(format_bytes(1_073_741_824, 2), "1 GB");
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(format_number(1_234_567), "1,234,567");
        assert_eq!(format_number(-1000), "-1,000");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
        assert_eq!(format_ip_port("10.0.0.5", Some(8080)), "10.0.0.5:8080");
        assert_eq!(format_ip_port("", Some(8080)), "-");
        assert_eq!(capitalize("cONNECTED"), "Connected");
        assert_eq!(initials("Jane Q Smith"), "JS");
        assert_eq!(initials("admin"), "AD");
        assert_eq!(format_percentage(1.0, 3.0, 1), "33.3%");
        assert_eq!(format_percentage(1.0, 0.0, 1), "0%");
    }
}
