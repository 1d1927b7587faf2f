//! Human-readable date labels used by the read views.

use chrono::{DateTime, Utc};

/// `July 04, 2025`
pub fn human_date(date: DateTime<Utc>) -> String {
    date.format("%B %d, %Y").to_string()
}

/// `Jul 04, 2025`
pub fn short_date(date: DateTime<Utc>) -> String {
    date.format("%b %d, %Y").to_string()
}

/// `today`, `yesterday` or `N days ago`, counted in whole days before `now`.
pub fn relative_day(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match (now - date).num_days() {
        d if d <= 0 => "today".to_string(),
        1 => "yesterday".to_string(),
        d => format!("{d} days ago"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn formats() {
        let d = at(2025, 7, 4, 9);
        assert_eq!(human_date(d), "July 04, 2025");
        assert_eq!(short_date(d), "Jul 04, 2025");
    }

    #[test]
    fn relative_labels() {
        let now = at(2025, 7, 10, 12);
        assert_eq!(relative_day(now - Duration::hours(5), now), "today");
        assert_eq!(relative_day(now - Duration::hours(30), now), "yesterday");
        assert_eq!(relative_day(now - Duration::days(6), now), "6 days ago");
        assert_eq!(relative_day(now + Duration::hours(1), now), "today");
    }
}
