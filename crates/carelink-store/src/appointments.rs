//! CRUD and lifecycle operations for [`Appointment`] records.
//!
//! Status changes go through [`Database::transition_appointment`], which
//! runs the shared state machine so an illegal move never reaches the
//! database.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use carelink_shared::{AppointmentStatus, DomainError, Role, ServiceType};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Appointment;

const COLUMNS: &str = "id, patient_id, caregiver_id, service_type, start_time, end_time,
                       status, notes, address, city, state, zip_code, hourly_rate,
                       total_cost, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new appointment.  Rejects `end_time <= start_time`.
    pub fn create_appointment(&self, appt: &Appointment) -> Result<()> {
        validate_times(appt)?;

        self.conn().execute(
            "INSERT INTO appointments (id, patient_id, caregiver_id, service_type, start_time,
                                       end_time, status, notes, address, city, state, zip_code,
                                       hourly_rate, total_cost, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                appt.id.to_string(),
                appt.patient_id.to_string(),
                appt.caregiver_id.map(|c| c.to_string()),
                appt.service_type.as_str(),
                appt.start_time.to_rfc3339(),
                appt.end_time.to_rfc3339(),
                appt.status.as_str(),
                appt.notes,
                appt.address,
                appt.city,
                appt.state,
                appt.zip_code,
                appt.hourly_rate,
                appt.total_cost,
                appt.created_at.to_rfc3339(),
                appt.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single appointment by UUID.
    pub fn get_appointment(&self, id: Uuid) -> Result<Appointment> {
        self.conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM appointments WHERE id = ?1"),
                params![id.to_string()],
                row_to_appointment,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all appointments, newest booking first.
    pub fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM appointments ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map([], row_to_appointment)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?);
        }
        Ok(appointments)
    }

    /// List the appointments visible to a user in a given role, most recent
    /// session first.
    ///
    /// - `Patient`:   rows whose `patient_id` equals `user_id`
    /// - `Caregiver`: rows whose `caregiver_id` equals `user_id`
    /// - `Admin`:     every row
    pub fn appointments_for_user(&self, user_id: Uuid, role: Role) -> Result<Vec<Appointment>> {
        let sql = match role {
            Role::Patient => format!(
                "SELECT {COLUMNS} FROM appointments
                 WHERE patient_id = ?1 ORDER BY start_time DESC"
            ),
            Role::Caregiver => format!(
                "SELECT {COLUMNS} FROM appointments
                 WHERE caregiver_id = ?1 ORDER BY start_time DESC"
            ),
            Role::Admin => {
                format!("SELECT {COLUMNS} FROM appointments ORDER BY start_time DESC")
            }
        };

        let mut stmt = self.conn().prepare(&sql)?;
        let mut appointments = Vec::new();

        if role == Role::Admin {
            let rows = stmt.query_map([], row_to_appointment)?;
            for row in rows {
                appointments.push(row?);
            }
        } else {
            let rows = stmt.query_map(params![user_id.to_string()], row_to_appointment)?;
            for row in rows {
                appointments.push(row?);
            }
        }
        Ok(appointments)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Full-row update of an appointment, keyed by id.  Rejects
    /// `end_time <= start_time`.  The status column is written as supplied;
    /// callers that change status must use [`Database::transition_appointment`].
    pub fn update_appointment(&self, appt: &Appointment) -> Result<()> {
        validate_times(appt)?;

        let affected = self.conn().execute(
            "UPDATE appointments SET
                 patient_id   = ?2,
                 caregiver_id = ?3,
                 service_type = ?4,
                 start_time   = ?5,
                 end_time     = ?6,
                 status       = ?7,
                 notes        = ?8,
                 address      = ?9,
                 city         = ?10,
                 state        = ?11,
                 zip_code     = ?12,
                 hourly_rate  = ?13,
                 total_cost   = ?14,
                 updated_at   = ?15
             WHERE id = ?1",
            params![
                appt.id.to_string(),
                appt.patient_id.to_string(),
                appt.caregiver_id.map(|c| c.to_string()),
                appt.service_type.as_str(),
                appt.start_time.to_rfc3339(),
                appt.end_time.to_rfc3339(),
                appt.status.as_str(),
                appt.notes,
                appt.address,
                appt.city,
                appt.state,
                appt.zip_code,
                appt.hourly_rate,
                appt.total_cost,
                appt.updated_at.to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Move an appointment to a new status, enforcing the lifecycle.
    ///
    /// A caregiver supplied here is assigned before the transition is
    /// checked, which is how `Pending -> Scheduled` acceptance carries the
    /// accepting caregiver.  Scheduling without any caregiver fails with
    /// [`DomainError::CaregiverRequired`].
    ///
    /// Returns the updated row.
    pub fn transition_appointment(
        &self,
        id: Uuid,
        next: AppointmentStatus,
        caregiver: Option<Uuid>,
    ) -> Result<Appointment> {
        let mut appt = self.get_appointment(id)?;

        if let Some(cg) = caregiver {
            appt.caregiver_id = Some(cg);
        }
        if next == AppointmentStatus::Scheduled && appt.caregiver_id.is_none() {
            return Err(DomainError::CaregiverRequired.into());
        }

        appt.status = appt.status.transition_to(next)?;
        appt.updated_at = Utc::now();

        self.conn().execute(
            "UPDATE appointments SET caregiver_id = ?1, status = ?2, updated_at = ?3
             WHERE id = ?4",
            params![
                appt.caregiver_id.map(|c| c.to_string()),
                appt.status.as_str(),
                appt.updated_at.to_rfc3339(),
                id.to_string(),
            ],
        )?;

        tracing::info!(
            appointment = %id,
            status = %appt.status,
            "appointment transitioned"
        );

        Ok(appt)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Physically delete an appointment.  Only ever reached through an
    /// explicit admin action at the API layer.  Returns `true` if a row
    /// was deleted.
    pub fn delete_appointment(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM appointments WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_times(appt: &Appointment) -> Result<()> {
    if appt.end_time <= appt.start_time {
        return Err(DomainError::Validation(
            "end_time must be after start_time".to_string(),
        )
        .into());
    }
    Ok(())
}

fn row_to_appointment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Appointment> {
    let id_str: String = row.get(0)?;
    let patient_id_str: String = row.get(1)?;
    let caregiver_id_str: Option<String> = row.get(2)?;
    let service_type_str: String = row.get(3)?;
    let start_str: String = row.get(4)?;
    let end_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let notes: Option<String> = row.get(7)?;
    let address: String = row.get(8)?;
    let city: String = row.get(9)?;
    let state: String = row.get(10)?;
    let zip_code: String = row.get(11)?;
    let hourly_rate: f64 = row.get(12)?;
    let total_cost: f64 = row.get(13)?;
    let created_str: String = row.get(14)?;
    let updated_str: String = row.get(15)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conv(0, e))?;
    let patient_id = Uuid::parse_str(&patient_id_str).map_err(|e| conv(1, e))?;
    let caregiver_id = caregiver_id_str
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| conv(2, e))?;
    let service_type: ServiceType = service_type_str.parse().map_err(|e| conv(3, e))?;
    let status: AppointmentStatus = status_str.parse().map_err(|e| conv(6, e))?;

    let start_time: DateTime<Utc> = DateTime::parse_from_rfc3339(&start_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(4, e))?;
    let end_time: DateTime<Utc> = DateTime::parse_from_rfc3339(&end_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(5, e))?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(14, e))?;
    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(15, e))?;

    Ok(Appointment {
        id,
        patient_id,
        caregiver_id,
        service_type,
        start_time,
        end_time,
        status,
        notes,
        address,
        city,
        state,
        zip_code,
        hourly_rate,
        total_cost,
        created_at,
        updated_at,
    })
}

fn conv(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use carelink_shared::UserStatus;
    use chrono::TimeZone;

    fn insert_identity(db: &Database, role: Role) -> Uuid {
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone: None,
            avatar_url: None,
            role,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        db.insert_profile(&profile).unwrap();
        profile.id
    }

    fn sample_appointment(patient_id: Uuid, caregiver_id: Option<Uuid>) -> Appointment {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            patient_id,
            caregiver_id,
            service_type: ServiceType::PersonalCare,
            start_time: start,
            end_time: end,
            status: AppointmentStatus::initial(caregiver_id.is_some()),
            notes: None,
            address: "12 Cedar Lane".to_string(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            zip_code: "97201".to_string(),
            hourly_rate: 30.0,
            total_cost: 30.0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn booking_starts_pending_and_scheduling_assigns_caregiver() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let caregiver = insert_identity(&db, Role::Caregiver);

        let appt = sample_appointment(patient, None);
        db.create_appointment(&appt).unwrap();
        assert_eq!(
            db.get_appointment(appt.id).unwrap().status,
            AppointmentStatus::Pending
        );

        db.transition_appointment(appt.id, AppointmentStatus::Scheduled, Some(caregiver))
            .unwrap();

        let mine = db.appointments_for_user(caregiver, Role::Caregiver).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, appt.id);
        assert_eq!(mine[0].status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn pre_assigned_booking_starts_scheduled() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let caregiver = insert_identity(&db, Role::Caregiver);

        let appt = sample_appointment(patient, Some(caregiver));
        db.create_appointment(&appt).unwrap();
        assert_eq!(
            db.get_appointment(appt.id).unwrap().status,
            AppointmentStatus::Scheduled
        );
    }

    #[test]
    fn scheduling_without_caregiver_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let appt = sample_appointment(patient, None);
        db.create_appointment(&appt).unwrap();

        let err = db
            .transition_appointment(appt.id, AppointmentStatus::Scheduled, None)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::CaregiverRequired)
        ));
    }

    #[test]
    fn illegal_transition_fails_and_row_is_untouched() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let appt = sample_appointment(patient, None);
        db.create_appointment(&appt).unwrap();

        let err = db
            .transition_appointment(appt.id, AppointmentStatus::Completed, None)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InvalidTransition { .. })
        ));
        assert_eq!(
            db.get_appointment(appt.id).unwrap().status,
            AppointmentStatus::Pending
        );
    }

    #[test]
    fn full_lifecycle_to_completed() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let caregiver = insert_identity(&db, Role::Caregiver);
        let appt = sample_appointment(patient, None);
        db.create_appointment(&appt).unwrap();

        db.transition_appointment(appt.id, AppointmentStatus::Scheduled, Some(caregiver))
            .unwrap();
        db.transition_appointment(appt.id, AppointmentStatus::InProgress, None)
            .unwrap();
        let done = db
            .transition_appointment(appt.id, AppointmentStatus::Completed, None)
            .unwrap();
        assert!(done.status.is_terminal());

        // Terminal rows admit no further moves.
        assert!(db
            .transition_appointment(appt.id, AppointmentStatus::Scheduled, None)
            .is_err());
    }

    #[test]
    fn role_scoped_listing_filters_by_participant() {
        let db = Database::open_in_memory().unwrap();
        let p1 = insert_identity(&db, Role::Patient);
        let p2 = insert_identity(&db, Role::Patient);
        let cg = insert_identity(&db, Role::Caregiver);

        let a1 = sample_appointment(p1, Some(cg));
        let a2 = sample_appointment(p2, None);
        db.create_appointment(&a1).unwrap();
        db.create_appointment(&a2).unwrap();

        let for_p1 = db.appointments_for_user(p1, Role::Patient).unwrap();
        assert!(for_p1.iter().all(|a| a.patient_id == p1));
        assert_eq!(for_p1.len(), 1);

        let for_cg = db.appointments_for_user(cg, Role::Caregiver).unwrap();
        assert!(for_cg.iter().all(|a| a.caregiver_id == Some(cg)));
        assert_eq!(for_cg.len(), 1);

        let admin = insert_identity(&db, Role::Admin);
        assert_eq!(db.appointments_for_user(admin, Role::Admin).unwrap().len(), 2);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let mut appt = sample_appointment(patient, None);
        appt.end_time = appt.start_time;

        assert!(matches!(
            db.create_appointment(&appt),
            Err(StoreError::Domain(DomainError::Validation(_)))
        ));
    }

    #[test]
    fn full_row_update_reschedules() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let mut appt = sample_appointment(patient, None);
        db.create_appointment(&appt).unwrap();

        appt.end_time = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        appt.notes = Some("door code 4411".to_string());
        appt.total_cost = appt.hourly_rate * appt.duration_hours();
        db.update_appointment(&appt).unwrap();

        let fetched = db.get_appointment(appt.id).unwrap();
        assert_eq!(fetched.end_time, appt.end_time);
        assert_eq!(fetched.notes.as_deref(), Some("door code 4411"));
        assert_eq!(fetched.total_cost, 90.0);
    }

    #[test]
    fn update_rejects_end_before_start() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let mut appt = sample_appointment(patient, None);
        db.create_appointment(&appt).unwrap();

        appt.end_time = appt.start_time - chrono::Duration::hours(1);
        assert!(matches!(
            db.update_appointment(&appt),
            Err(StoreError::Domain(DomainError::Validation(_)))
        ));

        // The stored row keeps its original times.
        let fetched = db.get_appointment(appt.id).unwrap();
        assert!(fetched.end_time > fetched.start_time);
    }

    #[test]
    fn update_of_unknown_appointment_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let appt = sample_appointment(patient, None);

        assert!(matches!(
            db.update_appointment(&appt),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn delete_is_explicit_and_reports_outcome() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let appt = sample_appointment(patient, None);
        db.create_appointment(&appt).unwrap();

        assert!(db.delete_appointment(appt.id).unwrap());
        assert!(!db.delete_appointment(appt.id).unwrap());
        assert!(matches!(
            db.get_appointment(appt.id),
            Err(StoreError::NotFound)
        ));
    }
}
