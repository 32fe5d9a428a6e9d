use axum::extract::FromRef;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest, VerifyEmailRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{RefreshTokenRecord, VerificationCodeRecord},
    },
    error::{ApiError, ApiResult},
    state::AppState,
    users::{dto::PublicUser, repo::User},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

async fn create_code(state: &AppState, user_id: Uuid) -> ApiResult<String> {
    let code = generate_code();
    let expires_at =
        state.clock.now() + Duration::minutes(state.config.verification_code_ttl_minutes);
    VerificationCodeRecord::insert(&state.db, &code, user_id, expires_at).await?;
    Ok(code)
}

async fn issue_token_pair(state: &AppState, user: &User) -> ApiResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id, user.role)?;
    let refresh_token = keys.sign_refresh(user.id, user.role)?;
    let expires_at = state.clock.now() + Duration::minutes(state.config.jwt.refresh_ttl_minutes);
    RefreshTokenRecord::insert(&state.db, &refresh_token, user.id, expires_at).await?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(user.clone()),
    })
}

/// Creates an unverified account and sends a verification code. No tokens are
/// issued here; the account cannot log in until the email is confirmed.
pub async fn register(state: &AppState, req: RegisterRequest) -> ApiResult<PublicUser> {
    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::InvalidInput("invalid email".into()));
    }
    if req.password.trim().is_empty() {
        return Err(ApiError::InvalidInput("password must not be blank".into()));
    }
    if User::exists_by_email(&state.db, &email).await? {
        return Err(ApiError::Conflict("email already registered".into()));
    }

    let hash = hash_password(&req.password)?;
    let user = User::create(
        &state.db,
        &email,
        req.first_name.trim(),
        req.last_name.trim(),
        &hash,
        req.role,
    )
    .await?;

    let code = create_code(state, user.id).await?;
    // Delivery failure must not fail registration; the user can request a resend.
    if let Err(e) = state.mailer.send_verification_code(&user.email, &code).await {
        warn!(error = %e, user_id = %user.id, "verification mail delivery failed at registration");
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(PublicUser::from(user))
}

pub async fn login(state: &AppState, req: LoginRequest) -> ApiResult<AuthResponse> {
    let email = req.email.trim().to_lowercase();
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("account not found".into()))?;

    if !user.is_verified {
        return Err(ApiError::Unauthorized("email not verified".into()));
    }

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Unauthorized("invalid password".into()));
    }

    let response = issue_token_pair(state, &user).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(response)
}

/// Consumes a verification code. On success the account becomes verified and
/// receives its first token pair; this is the only path to tokens for an
/// unverified account.
pub async fn verify_email(state: &AppState, req: VerifyEmailRequest) -> ApiResult<AuthResponse> {
    let email = req.email.trim().to_lowercase();
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("account not found".into()))?;

    let record = VerificationCodeRecord::find_by_code(&state.db, req.code.trim())
        .await?
        .ok_or_else(|| ApiError::InvalidInput("invalid verification code".into()))?;
    if record.user_id != user.id {
        return Err(ApiError::InvalidInput("invalid verification code".into()));
    }
    if record.expires_at < state.clock.now() {
        VerificationCodeRecord::delete(&state.db, record.id).await?;
        return Err(ApiError::InvalidState("verification code expired".into()));
    }

    User::mark_verified(&state.db, user.id).await?;
    VerificationCodeRecord::delete(&state.db, record.id).await?;

    let mut user = user;
    user.is_verified = true;
    let response = issue_token_pair(state, &user).await?;
    info!(user_id = %user.id, "email verified");
    Ok(response)
}

/// Replaces any outstanding codes with a fresh one. Unlike registration,
/// delivery failure here is surfaced to the caller.
pub async fn resend_code(state: &AppState, email: &str) -> ApiResult<()> {
    let email = email.trim().to_lowercase();
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("account not found".into()))?;

    if user.is_verified {
        return Err(ApiError::InvalidState("email already verified".into()));
    }

    if let Some(latest) = VerificationCodeRecord::latest_for_user(&state.db, user.id).await? {
        let issued_at =
            latest.expires_at - Duration::minutes(state.config.verification_code_ttl_minutes);
        if state.clock.now() - issued_at < Duration::seconds(state.config.resend_cooldown_seconds)
        {
            return Err(ApiError::RateLimited(
                "verification code was just sent, try again shortly".into(),
            ));
        }
    }

    VerificationCodeRecord::delete_all_for_user(&state.db, user.id).await?;
    let code = create_code(state, user.id).await?;
    state
        .mailer
        .send_verification_code(&user.email, &code)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user.id, "verification mail delivery failed on resend");
            ApiError::DeliveryFailed("could not deliver verification email".into())
        })?;
    Ok(())
}

/// Rotates a refresh token: the presented token is deleted and a new pair is
/// issued, with delete and insert committing atomically. A token can
/// therefore be exchanged exactly once.
pub async fn refresh(state: &AppState, refresh_token: &str) -> ApiResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    keys.verify_refresh(refresh_token)
        .map_err(|_| ApiError::Unauthorized("invalid refresh token".into()))?;

    let mut tx = state.db.begin().await?;

    let record = RefreshTokenRecord::claim(&mut *tx, refresh_token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid refresh token".into()))?;

    if record.expires_at < state.clock.now() {
        // Keep the deletion of the stale row.
        tx.commit().await?;
        return Err(ApiError::Unauthorized("refresh token expired".into()));
    }

    let user = User::find_by_id(&state.db, record.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid refresh token".into()))?;

    let access_token = keys.sign_access(user.id, user.role)?;
    let new_refresh = keys.sign_refresh(user.id, user.role)?;
    let expires_at = state.clock.now() + Duration::minutes(state.config.jwt.refresh_ttl_minutes);
    RefreshTokenRecord::insert(&mut *tx, &new_refresh, user.id, expires_at).await?;

    tx.commit().await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: new_refresh,
        user: PublicUser::from(user),
    })
}

/// Revokes every refresh token the user holds.
pub async fn logout(state: &AppState, user_id: Uuid) -> ApiResult<()> {
    let revoked = RefreshTokenRecord::delete_all_for_user(&state.db, user_id).await?;
    info!(%user_id, revoked, "user logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("traveler@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }
}
