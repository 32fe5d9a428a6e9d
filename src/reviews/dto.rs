use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::reviews::repo::{Review, ReviewWithReviewer};

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub booking_id: Uuid,
    pub tour_rating: i32,
    pub guide_rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub tour_id: Uuid,
    pub guide_id: Uuid,
    pub tour_rating: i32,
    pub guide_rating: i32,
    pub comment: Option<String>,
    pub reviewer_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            booking_id: r.booking_id,
            tour_id: r.tour_id,
            guide_id: r.guide_id,
            tour_rating: r.tour_rating,
            guide_rating: r.guide_rating,
            comment: r.comment,
            reviewer_name: None,
            created_at: r.created_at,
        }
    }
}

impl From<ReviewWithReviewer> for ReviewResponse {
    fn from(r: ReviewWithReviewer) -> Self {
        Self {
            id: r.id,
            booking_id: r.booking_id,
            tour_id: r.tour_id,
            guide_id: r.guide_id,
            tour_rating: r.tour_rating,
            guide_rating: r.guide_rating,
            comment: r.comment,
            reviewer_name: Some(format!("{} {}", r.reviewer_first_name, r.reviewer_last_name)),
            created_at: r.created_at,
        }
    }
}
