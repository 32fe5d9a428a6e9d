use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo::{Role, User};

/// Public part of the user returned to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_verified: bool,
    pub bio: Option<String>,
    pub rating: f64,
    pub reviews_count: i32,
    pub follower_count: i32,
    pub following_count: i32,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
            is_verified: u.is_verified,
            bio: u.bio,
            rating: u.rating,
            reviews_count: u.reviews_count,
            follower_count: u.follower_count,
            following_count: u.following_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    /// Optional password change; blank or absent keeps the current one.
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_hides_nothing_it_should_show() {
        let user = User {
            id: Uuid::new_v4(),
            email: "guide@example.com".into(),
            first_name: "Ana".into(),
            last_name: "Petrova".into(),
            password_hash: "$argon2id$...".into(),
            role: Role::Guide,
            is_verified: true,
            bio: Some("mountain trails".into()),
            rating: 4.5,
            reviews_count: 12,
            follower_count: 3,
            following_count: 1,
            created_at: time::OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("guide@example.com"));
        assert!(json.contains(r#""role":"GUIDE""#));
        assert!(!json.contains("argon2"));
    }
}
