//! Caregiver-profile handlers: onboarding, verification, and discovery.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use carelink_shared::Role;
use carelink_store::{CaregiverProfile, StoreError};

use crate::api::AppState;
use crate::error::ServerError;
use crate::guard::{require_role, require_self_or_admin};
use crate::sessions::Session;

/// `GET /caregivers` — caregiver profiles that passed admin verification.
/// Visible to any authenticated user (this is the discovery surface a
/// patient books from).
pub async fn list_verified(
    State(state): State<AppState>,
    Extension(_session): Extension<Session>,
) -> Result<Json<Vec<CaregiverProfile>>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_verified_caregivers()?))
}

/// `GET /caregivers/:id/profile` — any authenticated user.
pub async fn get_one(
    State(state): State<AppState>,
    Extension(_session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<Json<CaregiverProfile>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(db.get_caregiver_profile(id)?))
}

/// `PUT /caregivers/:id/profile` (self or admin).  The caregiver maintains
/// bio, rate, and certifications; the verification flag is admin-owned and
/// preserved across non-admin upserts.
pub async fn upsert(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(mut cp): Json<CaregiverProfile>,
) -> Result<Json<CaregiverProfile>, ServerError> {
    require_self_or_admin(&session, id)?;
    if cp.profile_id != id {
        return Err(ServerError::BadRequest(
            "Profile id does not match the path".to_string(),
        ));
    }

    let db = state.db.lock().await;

    let identity = db.get_profile(id)?;
    if identity.role != Role::Caregiver {
        return Err(ServerError::BadRequest(
            "Profile is not a caregiver account".to_string(),
        ));
    }

    if session.role != Role::Admin {
        cp.verified = match db.get_caregiver_profile(id) {
            Ok(existing) => existing.verified,
            Err(StoreError::NotFound) => false,
            Err(e) => return Err(e.into()),
        };
    }

    db.upsert_caregiver_profile(&cp)?;
    Ok(Json(db.get_caregiver_profile(id)?))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub verified: bool,
}

/// `PATCH /caregivers/:id/verify` (admin).
pub async fn verify(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<CaregiverProfile>, ServerError> {
    require_role(&session, &[Role::Admin])?;

    let db = state.db.lock().await;
    db.set_caregiver_verified(id, req.verified)?;

    info!(caregiver = %id, verified = req.verified, "caregiver verification changed");
    Ok(Json(db.get_caregiver_profile(id)?))
}
