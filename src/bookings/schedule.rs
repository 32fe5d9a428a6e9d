use time::{Date, Duration, PrimitiveDateTime, Time};

/// Parses an "HH:mm" duration. Tours with an unparsable duration are treated
/// as one hour long rather than failing the whole operation.
pub fn parse_duration(raw: &str) -> Duration {
    let mut parts = raw.split(':');
    let hours = parts.next().and_then(|h| h.parse::<i64>().ok());
    let minutes = parts.next().and_then(|m| m.parse::<i64>().ok());
    match (hours, minutes) {
        (Some(h), Some(m)) if parts.next().is_none() && h >= 0 && (0..60).contains(&m) => {
            Duration::hours(h) + Duration::minutes(m)
        }
        _ => Duration::HOUR,
    }
}

/// Half-open [start, end) occupancy interval of a scheduled tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TourWindow {
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

pub fn tour_window(date: Date, start_time: Time, duration: &str) -> TourWindow {
    let start = PrimitiveDateTime::new(date, start_time);
    TourWindow {
        start,
        end: start + parse_duration(duration),
    }
}

pub fn overlaps(a: &TourWindow, b: &TourWindow) -> bool {
    a.start < b.end && b.start < a.end
}

/// True once the tour's end has passed; the completion sweep promotes these.
pub fn has_ended(window: &TourWindow, now: time::OffsetDateTime) -> bool {
    window.end.assume_utc() < now
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    fn window(d: Date, t: Time, dur: &str) -> TourWindow {
        tour_window(d, t, dur)
    }

    #[test]
    fn parses_hh_mm() {
        assert_eq!(parse_duration("02:00"), Duration::hours(2));
        assert_eq!(parse_duration("00:45"), Duration::minutes(45));
        assert_eq!(parse_duration("10:30"), Duration::hours(10) + Duration::minutes(30));
    }

    #[test]
    fn falls_back_to_one_hour_on_garbage() {
        assert_eq!(parse_duration(""), Duration::HOUR);
        assert_eq!(parse_duration("two hours"), Duration::HOUR);
        assert_eq!(parse_duration("02"), Duration::HOUR);
        assert_eq!(parse_duration("02:99"), Duration::HOUR);
        assert_eq!(parse_duration("02:00:00"), Duration::HOUR);
        assert_eq!(parse_duration("-1:30"), Duration::HOUR);
    }

    #[test]
    fn overlapping_windows_are_detected() {
        // 10:00-12:00 vs 11:00-12:00 on the same day
        let a = window(date!(2024 - 06 - 01), time!(10:00), "02:00");
        let b = window(date!(2024 - 06 - 01), time!(11:00), "01:00");
        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
    }

    #[test]
    fn contained_window_overlaps() {
        let a = window(date!(2024 - 06 - 01), time!(09:00), "08:00");
        let b = window(date!(2024 - 06 - 01), time!(11:00), "01:00");
        assert!(overlaps(&a, &b));
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        // [10:00, 12:00) then [12:00, 13:00), back to back is allowed
        let a = window(date!(2024 - 06 - 01), time!(10:00), "02:00");
        let b = window(date!(2024 - 06 - 01), time!(12:00), "01:00");
        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&b, &a));
    }

    #[test]
    fn different_days_do_not_overlap() {
        let a = window(date!(2024 - 06 - 01), time!(10:00), "02:00");
        let b = window(date!(2024 - 06 - 02), time!(10:00), "02:00");
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn long_tour_spills_into_next_day() {
        // 22:00 + 04:00 runs until 02:00 the next day
        let a = window(date!(2024 - 06 - 01), time!(22:00), "04:00");
        let b = window(date!(2024 - 06 - 02), time!(01:00), "01:00");
        assert!(overlaps(&a, &b));
    }

    #[test]
    fn ended_window_is_past_due() {
        let w = window(date!(2024 - 06 - 01), time!(10:00), "02:00");
        let before_end = date!(2024 - 06 - 01).with_time(time!(11:59)).assume_utc();
        let at_end = date!(2024 - 06 - 01).with_time(time!(12:00)).assume_utc();
        let after_end = date!(2024 - 06 - 01).with_time(time!(12:01)).assume_utc();
        assert!(!has_ended(&w, before_end));
        assert!(!has_ended(&w, at_end));
        assert!(has_ended(&w, after_end));
    }

    #[test]
    fn unparsable_duration_books_one_hour() {
        let a = window(date!(2024 - 06 - 01), time!(10:00), "junk");
        assert_eq!(a.end, PrimitiveDateTime::new(date!(2024 - 06 - 01), time!(11:00)));
    }
}
