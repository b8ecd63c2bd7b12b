//! Patient-profile handlers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use carelink_shared::Role;
use carelink_store::PatientProfile;

use crate::api::AppState;
use crate::error::ServerError;
use crate::guard::{require_role, require_self_or_admin};
use crate::sessions::Session;

/// `GET /patients/:id/profile` — the patient themselves, an admin, or a
/// caregiver (who needs medical context for sessions).
pub async fn get_one(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<Json<PatientProfile>, ServerError> {
    if session.profile_id != id {
        require_role(&session, &[Role::Admin, Role::Caregiver])?;
    }

    let db = state.db.lock().await;
    Ok(Json(db.get_patient_profile(id)?))
}

/// `PUT /patients/:id/profile` (self or admin).  Insert-or-replace with
/// the full record.
pub async fn upsert(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(pp): Json<PatientProfile>,
) -> Result<Json<PatientProfile>, ServerError> {
    require_self_or_admin(&session, id)?;
    if pp.profile_id != id {
        return Err(ServerError::BadRequest(
            "Profile id does not match the path".to_string(),
        ));
    }

    let db = state.db.lock().await;

    let identity = db.get_profile(id)?;
    if identity.role != Role::Patient {
        return Err(ServerError::BadRequest(
            "Profile is not a patient account".to_string(),
        ));
    }

    db.upsert_patient_profile(&pp)?;
    Ok(Json(db.get_patient_profile(id)?))
}
