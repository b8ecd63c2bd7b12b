//! Review handlers: patients rate completed appointments.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use carelink_shared::{AppointmentStatus, Role};
use carelink_store::Review;

use crate::api::AppState;
use crate::error::ServerError;
use crate::guard::require_role;
use crate::sessions::Session;

#[derive(Deserialize)]
pub struct CreateRequest {
    pub appointment_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
}

/// `POST /reviews` (patient).  Only the patient of a completed appointment
/// may review it, once.
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateRequest>,
) -> Result<Json<Review>, ServerError> {
    require_role(&session, &[Role::Patient])?;

    let db = state.db.lock().await;
    let appt = db.get_appointment(req.appointment_id)?;

    if appt.patient_id != session.profile_id {
        return Err(ServerError::Forbidden(
            "Only the appointment's patient may review it".to_string(),
        ));
    }
    if appt.status != AppointmentStatus::Completed {
        return Err(ServerError::Conflict(
            "Only completed appointments can be reviewed".to_string(),
        ));
    }
    let Some(caregiver_id) = appt.caregiver_id else {
        return Err(ServerError::Conflict(
            "Appointment has no caregiver to review".to_string(),
        ));
    };

    let review = Review {
        id: Uuid::new_v4(),
        appointment_id: appt.id,
        patient_id: appt.patient_id,
        caregiver_id,
        rating: req.rating,
        comment: req.comment,
        created_at: Utc::now(),
    };
    db.insert_review(&review)?;

    Ok(Json(review))
}

#[derive(Serialize)]
pub struct CaregiverReviews {
    pub reviews: Vec<Review>,
    pub average_rating: Option<f64>,
}

/// `GET /caregivers/:id/reviews` — reviews plus the running average.
pub async fn for_caregiver(
    State(state): State<AppState>,
    Extension(_session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<Json<CaregiverReviews>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(CaregiverReviews {
        reviews: db.reviews_for_caregiver(id)?,
        average_rating: db.average_rating(id)?,
    }))
}
