use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use crate::bookings::repo::{Booking, BookingStatus, BookingWithTour};
use crate::tours::dto::{date_format, time_format};
use crate::tours::repo::Tour;
use crate::users::repo::User;

#[derive(Debug, Deserialize)]
pub struct BookTourRequest {
    pub tour_id: Uuid,
    pub number_of_participants: i32,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub tour_title: String,
    pub tour_location: String,
    #[serde(with = "date_format::option")]
    pub tour_scheduled_date: Option<Date>,
    #[serde(with = "time_format::option")]
    pub tour_start_time: Option<Time>,
    pub number_of_participants: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub booking_date: OffsetDateTime,
    pub status: BookingStatus,
    pub price_per_person: f64,
    pub total_price: f64,
    pub customer_name: String,
}

impl From<BookingWithTour> for BookingResponse {
    fn from(b: BookingWithTour) -> Self {
        Self {
            id: b.id,
            tour_id: b.tour_id,
            tour_title: b.tour_title,
            tour_location: b.tour_location,
            tour_scheduled_date: b.scheduled_date,
            tour_start_time: b.start_time,
            number_of_participants: b.number_of_participants,
            booking_date: b.booking_date,
            status: b.status,
            price_per_person: b.price_per_person,
            total_price: b.price_per_person * b.number_of_participants as f64,
            customer_name: format!("{} {}", b.traveler_first_name, b.traveler_last_name),
        }
    }
}

impl BookingResponse {
    /// Used right after creation, when the tour and traveler are in hand.
    pub fn from_parts(booking: Booking, tour: &Tour, traveler: &User) -> Self {
        Self {
            id: booking.id,
            tour_id: tour.id,
            tour_title: tour.title.clone(),
            tour_location: tour.location.clone(),
            tour_scheduled_date: tour.scheduled_date,
            tour_start_time: tour.start_time,
            number_of_participants: booking.number_of_participants,
            booking_date: booking.booking_date,
            status: booking.status,
            price_per_person: tour.price_per_person,
            total_price: tour.price_per_person * booking.number_of_participants as f64,
            customer_name: format!("{} {}", traveler.first_name, traveler.last_name),
        }
    }
}
