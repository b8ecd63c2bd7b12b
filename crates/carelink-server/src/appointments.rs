//! Appointment handlers: booking, role-scoped listing, lifecycle moves,
//! and admin deletion.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use carelink_shared::{AppointmentStatus, Role, ServiceType};
use carelink_store::Appointment;

use crate::api::AppState;
use crate::error::ServerError;
use crate::guard::require_role;
use crate::sessions::Session;

#[derive(Deserialize)]
pub struct BookRequest {
    /// Booking directly with a chosen caregiver starts the appointment
    /// `Scheduled`; otherwise it starts `Pending` until one accepts.
    pub caregiver_id: Option<Uuid>,
    pub service_type: ServiceType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub hourly_rate: f64,
}

/// `POST /appointments` (patient).
pub async fn book(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<BookRequest>,
) -> Result<Json<Appointment>, ServerError> {
    require_role(&session, &[Role::Patient])?;

    if req.hourly_rate < 0.0 {
        return Err(ServerError::BadRequest(
            "Hourly rate cannot be negative".to_string(),
        ));
    }

    let now = Utc::now();
    let mut appt = Appointment {
        id: Uuid::new_v4(),
        patient_id: session.profile_id,
        caregiver_id: req.caregiver_id,
        service_type: req.service_type,
        start_time: req.start_time,
        end_time: req.end_time,
        status: AppointmentStatus::initial(req.caregiver_id.is_some()),
        notes: req.notes,
        address: req.address,
        city: req.city,
        state: req.state,
        zip_code: req.zip_code,
        hourly_rate: req.hourly_rate,
        total_cost: 0.0,
        created_at: now,
        updated_at: now,
    };
    appt.total_cost = appt.hourly_rate * appt.duration_hours();

    let db = state.db.lock().await;
    db.create_appointment(&appt)?;

    info!(
        appointment = %appt.id,
        patient = %appt.patient_id,
        service = %appt.service_type,
        "appointment booked"
    );
    Ok(Json(appt))
}

/// `GET /appointments` (admin) — every appointment, newest booking first.
pub async fn list_all(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Appointment>>, ServerError> {
    require_role(&session, &[Role::Admin])?;

    let db = state.db.lock().await;
    Ok(Json(db.list_appointments()?))
}

/// `GET /appointments/mine` — appointments visible to the caller's role.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Appointment>>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(
        db.appointments_for_user(session.profile_id, session.role)?,
    ))
}

/// `GET /appointments/:id` — a participant or an admin.
pub async fn get_one(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ServerError> {
    let db = state.db.lock().await;
    let appt = db.get_appointment(id)?;
    ensure_participant(&session, &appt)?;
    Ok(Json(appt))
}

/// `PUT /appointments/:id` — full-row edit (reschedule, notes, location) by
/// a participant or an admin.  The patient and status are immutable here;
/// status moves go through the status endpoint, and reassigning the
/// caregiver is admin-only.
pub async fn update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(mut appt): Json<Appointment>,
) -> Result<Json<Appointment>, ServerError> {
    if appt.id != id {
        return Err(ServerError::BadRequest(
            "Appointment id does not match the path".to_string(),
        ));
    }

    let db = state.db.lock().await;
    let existing = db.get_appointment(id)?;
    ensure_participant(&session, &existing)?;

    if existing.status.is_terminal() {
        return Err(ServerError::Conflict(
            "Completed or cancelled appointments cannot be edited".to_string(),
        ));
    }
    if appt.patient_id != existing.patient_id {
        return Err(ServerError::BadRequest(
            "The patient of an appointment cannot be changed".to_string(),
        ));
    }
    if appt.status != existing.status {
        return Err(ServerError::BadRequest(
            "Status changes go through the status endpoint".to_string(),
        ));
    }
    if appt.caregiver_id != existing.caregiver_id && session.role != Role::Admin {
        return Err(ServerError::Forbidden(
            "Only an admin may reassign the caregiver".to_string(),
        ));
    }

    appt.created_at = existing.created_at;
    appt.updated_at = Utc::now();
    appt.total_cost = appt.hourly_rate * appt.duration_hours();
    db.update_appointment(&appt)?;

    info!(appointment = %id, editor = %session.profile_id, "appointment updated");
    Ok(Json(db.get_appointment(id)?))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: AppointmentStatus,
    /// Admin-supplied assignment; caregivers accepting a pending booking
    /// are assigned implicitly.
    pub caregiver_id: Option<Uuid>,
}

/// `PATCH /appointments/:id/status` — runs the lifecycle state machine.
///
/// - Admin: any legal move, may assign a caregiver.
/// - Caregiver: accepts an unassigned `Pending` booking (becoming its
///   caregiver), or progresses an appointment already assigned to them.
/// - Patient: may only cancel their own appointment.
pub async fn set_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Appointment>, ServerError> {
    let db = state.db.lock().await;
    let appt = db.get_appointment(id)?;

    let caregiver = match session.role {
        Role::Admin => req.caregiver_id,
        Role::Caregiver => {
            let is_assigned = appt.caregiver_id == Some(session.profile_id);
            let is_accepting = appt.caregiver_id.is_none()
                && appt.status == AppointmentStatus::Pending
                && req.status == AppointmentStatus::Scheduled;
            if !is_assigned && !is_accepting {
                return Err(ServerError::Forbidden(
                    "Not the caregiver for this appointment".to_string(),
                ));
            }
            is_accepting.then_some(session.profile_id)
        }
        Role::Patient => {
            if appt.patient_id != session.profile_id {
                return Err(ServerError::Forbidden(
                    "Not the patient for this appointment".to_string(),
                ));
            }
            if req.status != AppointmentStatus::Cancelled {
                return Err(ServerError::Forbidden(
                    "Patients may only cancel appointments".to_string(),
                ));
            }
            None
        }
    };

    let updated = db.transition_appointment(id, req.status, caregiver)?;
    Ok(Json(updated))
}

/// `DELETE /appointments/:id` (admin).  The only physical delete path.
pub async fn delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServerError> {
    require_role(&session, &[Role::Admin])?;

    let db = state.db.lock().await;
    let deleted = db.delete_appointment(id)?;
    if !deleted {
        return Err(ServerError::NotFound("Record not found".to_string()));
    }

    info!(appointment = %id, admin = %session.profile_id, "appointment deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

fn ensure_participant(session: &Session, appt: &Appointment) -> Result<(), ServerError> {
    let allowed = session.role == Role::Admin
        || appt.patient_id == session.profile_id
        || appt.caregiver_id == Some(session.profile_id);
    if allowed {
        Ok(())
    } else {
        Err(ServerError::Forbidden(
            "Not a participant in this appointment".to_string(),
        ))
    }
}
