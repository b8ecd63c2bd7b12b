//! Profile handlers: listing, fetch, upsert, and admin status changes.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use carelink_shared::{Role, UserStatus};
use carelink_store::{Profile, StoreError};

use crate::api::AppState;
use crate::error::ServerError;
use crate::guard::{require_role, require_self_or_admin};
use crate::sessions::Session;

#[derive(Deserialize)]
pub struct ListQuery {
    pub role: Option<Role>,
}

/// `GET /profiles` (admin).  Optional `?role=` filter.
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Profile>>, ServerError> {
    require_role(&session, &[Role::Admin])?;

    let db = state.db.lock().await;
    let profiles = match query.role {
        Some(role) => db.list_profiles_by_role(role)?,
        None => db.list_profiles()?,
    };
    Ok(Json(profiles))
}

/// `GET /profiles/:id` (self or admin).
pub async fn get_one(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ServerError> {
    require_self_or_admin(&session, id)?;

    let db = state.db.lock().await;
    Ok(Json(db.get_profile(id)?))
}

/// `PUT /profiles/:id` (self or admin).  Insert-or-replace with the full
/// record; role is immutable and status changes are reserved to the
/// dedicated admin endpoint.
pub async fn upsert(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(profile): Json<Profile>,
) -> Result<Json<Profile>, ServerError> {
    require_self_or_admin(&session, id)?;
    if profile.id != id {
        return Err(ServerError::BadRequest(
            "Profile id does not match the path".to_string(),
        ));
    }

    let db = state.db.lock().await;
    match db.get_profile(id) {
        Ok(existing) => {
            if profile.role != existing.role {
                return Err(ServerError::BadRequest(
                    "Role is immutable after registration".to_string(),
                ));
            }
            if profile.status != existing.status && session.role != Role::Admin {
                return Err(ServerError::Forbidden(
                    "Only an admin may change account status".to_string(),
                ));
            }
        }
        // Creating a fresh row via PUT is an admin-only path (e.g. seeding
        // accounts that authenticate elsewhere).
        Err(StoreError::NotFound) => require_role(&session, &[Role::Admin])?,
        Err(e) => return Err(e.into()),
    }

    db.upsert_profile(&profile)?;
    Ok(Json(db.get_profile(id)?))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: UserStatus,
}

/// `PATCH /profiles/:id/status` (admin).  Suspending or deactivating an
/// account also revokes its live sessions.
pub async fn set_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Profile>, ServerError> {
    require_role(&session, &[Role::Admin])?;

    let profile = {
        let db = state.db.lock().await;
        db.set_profile_status(id, req.status)?;
        db.get_profile(id)?
    };

    if req.status != UserStatus::Active {
        state.sessions.destroy_for_profile(id).await;
    }

    info!(profile = %id, status = %req.status, "account status changed");
    Ok(Json(profile))
}
