//! CRUD operations for [`PatientProfile`] records.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;
use uuid::Uuid;

use carelink_shared::MobilityLevel;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::PatientProfile;

const COLUMNS: &str = "profile_id, date_of_birth, gender, address, city, state, zip_code,
                       emergency_contact_name, emergency_contact_phone, medical_history,
                       allergies, medications, mobility_level, care_needs,
                       insurance_provider, insurance_number, created_at, updated_at";

impl Database {
    /// Insert-or-replace a patient profile, keyed by the profile id.
    pub fn upsert_patient_profile(&self, pp: &PatientProfile) -> Result<()> {
        let allergies = serde_json::to_string(&pp.allergies)?;
        let medications = serde_json::to_string(&pp.medications)?;

        self.conn().execute(
            "INSERT INTO patient_profiles (profile_id, date_of_birth, gender, address, city,
                                           state, zip_code, emergency_contact_name,
                                           emergency_contact_phone, medical_history, allergies,
                                           medications, mobility_level, care_needs,
                                           insurance_provider, insurance_number,
                                           created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
             ON CONFLICT(profile_id) DO UPDATE SET
                 date_of_birth           = excluded.date_of_birth,
                 gender                  = excluded.gender,
                 address                 = excluded.address,
                 city                    = excluded.city,
                 state                   = excluded.state,
                 zip_code                = excluded.zip_code,
                 emergency_contact_name  = excluded.emergency_contact_name,
                 emergency_contact_phone = excluded.emergency_contact_phone,
                 medical_history         = excluded.medical_history,
                 allergies               = excluded.allergies,
                 medications             = excluded.medications,
                 mobility_level          = excluded.mobility_level,
                 care_needs              = excluded.care_needs,
                 insurance_provider      = excluded.insurance_provider,
                 insurance_number        = excluded.insurance_number,
                 updated_at              = excluded.updated_at",
            params![
                pp.profile_id.to_string(),
                pp.date_of_birth.to_string(),
                pp.gender,
                pp.address,
                pp.city,
                pp.state,
                pp.zip_code,
                pp.emergency_contact_name,
                pp.emergency_contact_phone,
                pp.medical_history,
                allergies,
                medications,
                pp.mobility_level.as_str(),
                pp.care_needs,
                pp.insurance_provider,
                pp.insurance_number,
                pp.created_at.to_rfc3339(),
                pp.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch the patient extension for a profile.  [`StoreError::NotFound`]
    /// means the patient has not completed onboarding yet.
    pub fn get_patient_profile(&self, profile_id: Uuid) -> Result<PatientProfile> {
        self.conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM patient_profiles WHERE profile_id = ?1"),
                params![profile_id.to_string()],
                row_to_patient_profile,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_patient_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientProfile> {
    let profile_id_str: String = row.get(0)?;
    let dob_str: String = row.get(1)?;
    let gender: Option<String> = row.get(2)?;
    let address: String = row.get(3)?;
    let city: String = row.get(4)?;
    let state: String = row.get(5)?;
    let zip_code: String = row.get(6)?;
    let emergency_contact_name: String = row.get(7)?;
    let emergency_contact_phone: String = row.get(8)?;
    let medical_history: Option<String> = row.get(9)?;
    let allergies_json: String = row.get(10)?;
    let medications_json: String = row.get(11)?;
    let mobility_str: String = row.get(12)?;
    let care_needs: Option<String> = row.get(13)?;
    let insurance_provider: Option<String> = row.get(14)?;
    let insurance_number: Option<String> = row.get(15)?;
    let created_str: String = row.get(16)?;
    let updated_str: String = row.get(17)?;

    let profile_id = Uuid::parse_str(&profile_id_str).map_err(|e| conv(0, e))?;
    let date_of_birth: NaiveDate = dob_str.parse().map_err(|e| conv(1, e))?;
    let allergies: Vec<String> = serde_json::from_str(&allergies_json).map_err(|e| conv(10, e))?;
    let medications: Vec<String> =
        serde_json::from_str(&medications_json).map_err(|e| conv(11, e))?;
    let mobility_level: MobilityLevel = mobility_str.parse().map_err(|e| conv(12, e))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(16, e))?;
    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(17, e))?;

    Ok(PatientProfile {
        profile_id,
        date_of_birth,
        gender,
        address,
        city,
        state,
        zip_code,
        emergency_contact_name,
        emergency_contact_phone,
        medical_history,
        allergies,
        medications,
        mobility_level,
        care_needs,
        insurance_provider,
        insurance_number,
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
    use carelink_shared::{Role, UserStatus};

    fn insert_patient_identity(db: &Database) -> Uuid {
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            first_name: "Elena".to_string(),
            last_name: "Reyes".to_string(),
            phone: None,
            avatar_url: None,
            role: Role::Patient,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        db.insert_profile(&profile).unwrap();
        profile.id
    }

    fn sample_patient_profile(profile_id: Uuid) -> PatientProfile {
        let now = Utc::now();
        PatientProfile {
            profile_id,
            date_of_birth: NaiveDate::from_ymd_opt(1948, 6, 12).unwrap(),
            gender: Some("female".to_string()),
            address: "12 Cedar Lane".to_string(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            zip_code: "97201".to_string(),
            emergency_contact_name: "Marco Reyes".to_string(),
            emergency_contact_phone: "+1-555-0123".to_string(),
            medical_history: Some("Hip replacement 2019".to_string()),
            allergies: vec!["penicillin".to_string()],
            medications: vec!["lisinopril".to_string(), "metformin".to_string()],
            mobility_level: MobilityLevel::WalkingAid,
            care_needs: None,
            insurance_provider: Some("Acme Health".to_string()),
            insurance_number: Some("AH-99201".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let id = insert_patient_identity(&db);
        let pp = sample_patient_profile(id);

        db.upsert_patient_profile(&pp).unwrap();
        let fetched = db.get_patient_profile(id).unwrap();
        assert_eq!(fetched, pp);
    }

    #[test]
    fn upsert_updates_medical_fields() {
        let db = Database::open_in_memory().unwrap();
        let id = insert_patient_identity(&db);
        let mut pp = sample_patient_profile(id);
        db.upsert_patient_profile(&pp).unwrap();

        pp.allergies.push("latex".to_string());
        pp.mobility_level = MobilityLevel::Wheelchair;
        db.upsert_patient_profile(&pp).unwrap();

        let fetched = db.get_patient_profile(id).unwrap();
        assert_eq!(fetched.allergies.len(), 2);
        assert_eq!(fetched.mobility_level, MobilityLevel::Wheelchair);
    }

    #[test]
    fn missing_extension_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let id = insert_patient_identity(&db);
        assert!(matches!(
            db.get_patient_profile(id),
            Err(StoreError::NotFound)
        ));
    }
}
