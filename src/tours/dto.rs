use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use crate::tours::repo::{Tour, TourStatus};

time::serde::format_description!(pub date_format, Date, "[year]-[month]-[day]");
time::serde::format_description!(pub time_format, Time, "[hour]:[minute]");

#[derive(Debug, Deserialize)]
pub struct CreateTourRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    /// HH:mm, e.g. "02:30".
    pub duration: String,
    pub max_group_size: i32,
    pub price_per_person: f64,
    #[serde(default, with = "date_format::option")]
    pub scheduled_date: Option<Date>,
    #[serde(default, with = "time_format::option")]
    pub start_time: Option<Time>,
}

#[derive(Debug, Serialize)]
pub struct TourResponse {
    pub id: Uuid,
    pub guide_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub duration: String,
    pub max_group_size: i32,
    pub available_spots: i32,
    pub price_per_person: f64,
    #[serde(with = "date_format::option")]
    pub scheduled_date: Option<Date>,
    #[serde(with = "time_format::option")]
    pub start_time: Option<Time>,
    pub status: TourStatus,
    pub rating: f64,
    pub reviews_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Tour> for TourResponse {
    fn from(t: Tour) -> Self {
        Self {
            id: t.id,
            guide_id: t.guide_id,
            title: t.title,
            description: t.description,
            location: t.location,
            duration: t.duration,
            max_group_size: t.max_group_size,
            available_spots: t.available_spots,
            price_per_person: t.price_per_person,
            scheduled_date: t.scheduled_date,
            start_time: t.start_time,
            status: t.status,
            rating: t.rating,
            reviews_count: t.reviews_count,
            created_at: t.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    #[test]
    fn create_request_parses_date_and_time() {
        let req: CreateTourRequest = serde_json::from_str(
            r#"{
                "title": "Old town walk",
                "description": "Two hours through the old town",
                "location": "Riga",
                "duration": "02:00",
                "max_group_size": 10,
                "price_per_person": 25.0,
                "scheduled_date": "2024-06-01",
                "start_time": "10:00"
            }"#,
        )
        .unwrap();
        assert_eq!(req.scheduled_date, Some(date!(2024 - 06 - 01)));
        assert_eq!(req.start_time, Some(time!(10:00)));
    }

    #[test]
    fn create_request_allows_unscheduled_tours() {
        let req: CreateTourRequest = serde_json::from_str(
            r#"{
                "title": "On demand",
                "description": "Scheduled later",
                "location": "Riga",
                "duration": "01:00",
                "max_group_size": 5,
                "price_per_person": 10.0
            }"#,
        )
        .unwrap();
        assert!(req.scheduled_date.is_none());
        assert!(req.start_time.is_none());
    }
}
