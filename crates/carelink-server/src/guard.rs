//! Authentication middleware and role guards.
//!
//! Every protected route goes through [`require_session`], which resolves
//! the bearer token once and injects the [`Session`] into request
//! extensions.  Handlers then apply [`require_role`] /
//! [`require_self_or_admin`] instead of re-implementing the check.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use carelink_shared::Role;

use crate::api::AppState;
use crate::error::ServerError;
use crate::sessions::Session;

/// Resolve `Authorization: Bearer <token>` to a [`Session`] or reject with
/// 401.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ServerError> {
    let token = bearer_token(&req)
        .ok_or_else(|| ServerError::Unauthorized("Missing bearer token".to_string()))?;

    let session = state
        .sessions
        .authenticate(&token)
        .await
        .ok_or_else(|| ServerError::Unauthorized("Invalid or expired session".to_string()))?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

fn bearer_token<B>(req: &Request<B>) -> Option<String> {
    let auth = req.headers().get("authorization")?.to_str().ok()?;
    auth.strip_prefix("Bearer ").map(|t| t.trim().to_string())
}

/// Reject with 403 unless the session's role is one of `allowed`.
pub fn require_role(session: &Session, allowed: &[Role]) -> Result<(), ServerError> {
    if allowed.contains(&session.role) {
        Ok(())
    } else {
        Err(ServerError::Forbidden(format!(
            "Requires role {}",
            allowed
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(" or ")
        )))
    }
}

/// Reject with 403 unless the session belongs to `profile_id` or to an
/// admin.
pub fn require_self_or_admin(session: &Session, profile_id: Uuid) -> Result<(), ServerError> {
    if session.role == Role::Admin || session.profile_id == profile_id {
        Ok(())
    } else {
        Err(ServerError::Forbidden(
            "Not allowed to access another user's record".to_string(),
        ))
    }
}
