//! # Token Commands
//!
//! Mints access tokens with the counter's own secret. Used to set up a till
//! when the back office is unreachable.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use splash_engine::{Actor, Role};

/// Longest shift a locally issued token may cover.
pub const MAX_TOKEN_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues a token for `user_id` valid for `hours`.
pub fn issue_token(
    state: &AppState,
    user_id: &str,
    role: Role,
    email: &str,
    hours: i64,
) -> Result<IssuedToken, ApiError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::validation("user id is required"));
    }
    if !(1..=MAX_TOKEN_HOURS).contains(&hours) {
        return Err(ApiError::validation(format!(
            "token lifetime must be between 1 and {} hours",
            MAX_TOKEN_HOURS
        )));
    }

    let actor = Actor {
        id: user_id.to_string(),
        role,
        email: email.trim().to_string(),
    };
    let lifetime = Duration::hours(hours);
    let token = state.claims.issue(&actor, lifetime)?;

    info!(user_id = %actor.id, role = %role, hours, "Issued access token");

    Ok(IssuedToken {
        token,
        expires_at: Utc::now() + lifetime,
    })
}
