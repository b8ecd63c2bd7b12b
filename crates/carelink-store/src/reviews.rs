//! Review persistence and rating aggregation.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use carelink_shared::constants::{MAX_RATING, MIN_RATING};
use carelink_shared::DomainError;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Review;

impl Database {
    /// Insert a review.  Ratings outside 1..=5 are rejected; the UNIQUE
    /// constraint on `appointment_id` rejects a second review of the same
    /// appointment.
    pub fn insert_review(&self, review: &Review) -> Result<()> {
        if review.rating < MIN_RATING || review.rating > MAX_RATING {
            return Err(DomainError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            ))
            .into());
        }

        self.conn().execute(
            "INSERT INTO reviews (id, appointment_id, patient_id, caregiver_id, rating,
                                  comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                review.id.to_string(),
                review.appointment_id.to_string(),
                review.patient_id.to_string(),
                review.caregiver_id.to_string(),
                review.rating,
                review.comment,
                review.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All reviews of a caregiver, newest first.
    pub fn reviews_for_caregiver(&self, caregiver_id: Uuid) -> Result<Vec<Review>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, appointment_id, patient_id, caregiver_id, rating, comment, created_at
             FROM reviews
             WHERE caregiver_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![caregiver_id.to_string()], row_to_review)?;

        let mut reviews = Vec::new();
        for row in rows {
            reviews.push(row?);
        }
        Ok(reviews)
    }

    /// Mean rating of a caregiver, or `None` with no reviews yet.
    pub fn average_rating(&self, caregiver_id: Uuid) -> Result<Option<f64>> {
        let avg: Option<f64> = self.conn().query_row(
            "SELECT AVG(rating) FROM reviews WHERE caregiver_id = ?1",
            params![caregiver_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(avg)
    }
}

fn row_to_review(row: &rusqlite::Row<'_>) -> rusqlite::Result<Review> {
    let id_str: String = row.get(0)?;
    let appointment_str: String = row.get(1)?;
    let patient_str: String = row.get(2)?;
    let caregiver_str: String = row.get(3)?;
    let rating: u8 = row.get(4)?;
    let comment: Option<String> = row.get(5)?;
    let ts_str: String = row.get(6)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conv(0, e))?;
    let appointment_id = Uuid::parse_str(&appointment_str).map_err(|e| conv(1, e))?;
    let patient_id = Uuid::parse_str(&patient_str).map_err(|e| conv(2, e))?;
    let caregiver_id = Uuid::parse_str(&caregiver_str).map_err(|e| conv(3, e))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(6, e))?;

    Ok(Review {
        id,
        appointment_id,
        patient_id,
        caregiver_id,
        rating,
        comment,
        created_at,
    })
}

fn conv(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, Profile};
    use carelink_shared::{AppointmentStatus, Role, ServiceType, UserStatus};
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

    fn insert_completed_appointment(db: &Database, patient: Uuid, caregiver: Uuid) -> Uuid {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
        let now = Utc::now();
        let appt = Appointment {
            id: Uuid::new_v4(),
            patient_id: patient,
            caregiver_id: Some(caregiver),
            service_type: ServiceType::Companionship,
            start_time: start,
            end_time: end,
            status: AppointmentStatus::Scheduled,
            notes: None,
            address: "12 Cedar Lane".to_string(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            zip_code: "97201".to_string(),
            hourly_rate: 25.0,
            total_cost: 25.0,
            created_at: now,
            updated_at: now,
        };
        db.create_appointment(&appt).unwrap();
        db.transition_appointment(appt.id, AppointmentStatus::InProgress, None)
            .unwrap();
        db.transition_appointment(appt.id, AppointmentStatus::Completed, None)
            .unwrap();
        appt.id
    }

    fn review(appointment: Uuid, patient: Uuid, caregiver: Uuid, rating: u8) -> Review {
        Review {
            id: Uuid::new_v4(),
            appointment_id: appointment,
            patient_id: patient,
            caregiver_id: caregiver,
            rating,
            comment: Some("on time, very kind".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_aggregate() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let caregiver = insert_identity(&db, Role::Caregiver);
        let a1 = insert_completed_appointment(&db, patient, caregiver);
        let a2 = insert_completed_appointment(&db, patient, caregiver);

        db.insert_review(&review(a1, patient, caregiver, 5)).unwrap();
        db.insert_review(&review(a2, patient, caregiver, 3)).unwrap();

        let reviews = db.reviews_for_caregiver(caregiver).unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(db.average_rating(caregiver).unwrap(), Some(4.0));
    }

    #[test]
    fn rating_out_of_range_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let caregiver = insert_identity(&db, Role::Caregiver);
        let appt = insert_completed_appointment(&db, patient, caregiver);

        assert!(matches!(
            db.insert_review(&review(appt, patient, caregiver, 0)),
            Err(StoreError::Domain(DomainError::Validation(_)))
        ));
        assert!(matches!(
            db.insert_review(&review(appt, patient, caregiver, 6)),
            Err(StoreError::Domain(DomainError::Validation(_)))
        ));
    }

    #[test]
    fn second_review_of_same_appointment_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let caregiver = insert_identity(&db, Role::Caregiver);
        let appt = insert_completed_appointment(&db, patient, caregiver);

        db.insert_review(&review(appt, patient, caregiver, 4)).unwrap();
        assert!(db.insert_review(&review(appt, patient, caregiver, 4)).is_err());
    }

    #[test]
    fn no_reviews_means_no_average() {
        let db = Database::open_in_memory().unwrap();
        let caregiver = insert_identity(&db, Role::Caregiver);
        assert_eq!(db.average_rating(caregiver).unwrap(), None);
    }
}
