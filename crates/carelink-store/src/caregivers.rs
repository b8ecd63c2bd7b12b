//! CRUD operations for [`CaregiverProfile`] records.
//!
//! List-valued columns (specializations, languages) are stored as JSON
//! arrays in TEXT columns.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use carelink_shared::ServiceType;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::CaregiverProfile;

const COLUMNS: &str = "profile_id, license_number, specializations, experience_years,
                       hourly_rate, bio, languages, background_check, cpr_certified,
                       first_aid_certified, verified, created_at, updated_at";

impl Database {
    /// Insert-or-replace a caregiver profile, keyed by the profile id.
    pub fn upsert_caregiver_profile(&self, cp: &CaregiverProfile) -> Result<()> {
        let specializations = serde_json::to_string(&cp.specializations)?;
        let languages = serde_json::to_string(&cp.languages)?;

        self.conn().execute(
            "INSERT INTO caregiver_profiles (profile_id, license_number, specializations,
                                             experience_years, hourly_rate, bio, languages,
                                             background_check, cpr_certified,
                                             first_aid_certified, verified,
                                             created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(profile_id) DO UPDATE SET
                 license_number      = excluded.license_number,
                 specializations     = excluded.specializations,
                 experience_years    = excluded.experience_years,
                 hourly_rate         = excluded.hourly_rate,
                 bio                 = excluded.bio,
                 languages           = excluded.languages,
                 background_check    = excluded.background_check,
                 cpr_certified       = excluded.cpr_certified,
                 first_aid_certified = excluded.first_aid_certified,
                 verified            = excluded.verified,
                 updated_at          = excluded.updated_at",
            params![
                cp.profile_id.to_string(),
                cp.license_number,
                specializations,
                cp.experience_years,
                cp.hourly_rate,
                cp.bio,
                languages,
                cp.background_check,
                cp.cpr_certified,
                cp.first_aid_certified,
                cp.verified,
                cp.created_at.to_rfc3339(),
                cp.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch the caregiver extension for a profile.  [`StoreError::NotFound`]
    /// means the caregiver has not completed onboarding yet.
    pub fn get_caregiver_profile(&self, profile_id: Uuid) -> Result<CaregiverProfile> {
        self.conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM caregiver_profiles WHERE profile_id = ?1"),
                params![profile_id.to_string()],
                row_to_caregiver_profile,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Set the admin verification flag.
    pub fn set_caregiver_verified(&self, profile_id: Uuid, verified: bool) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE caregiver_profiles SET verified = ?1, updated_at = ?2 WHERE profile_id = ?3",
            params![verified, Utc::now().to_rfc3339(), profile_id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// List caregiver profiles that passed admin verification, newest first.
    pub fn list_verified_caregivers(&self) -> Result<Vec<CaregiverProfile>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM caregiver_profiles
             WHERE verified = 1
             ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map([], row_to_caregiver_profile)?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok(profiles)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_caregiver_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<CaregiverProfile> {
    let profile_id_str: String = row.get(0)?;
    let license_number: String = row.get(1)?;
    let specializations_json: String = row.get(2)?;
    let experience_years: u32 = row.get(3)?;
    let hourly_rate: f64 = row.get(4)?;
    let bio: Option<String> = row.get(5)?;
    let languages_json: String = row.get(6)?;
    let background_check: bool = row.get(7)?;
    let cpr_certified: bool = row.get(8)?;
    let first_aid_certified: bool = row.get(9)?;
    let verified: bool = row.get(10)?;
    let created_str: String = row.get(11)?;
    let updated_str: String = row.get(12)?;

    let profile_id = Uuid::parse_str(&profile_id_str).map_err(|e| conv(0, e))?;
    let specializations: Vec<ServiceType> =
        serde_json::from_str(&specializations_json).map_err(|e| conv(2, e))?;
    let languages: Vec<String> =
        serde_json::from_str(&languages_json).map_err(|e| conv(6, e))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(11, e))?;
    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(12, e))?;

    Ok(CaregiverProfile {
        profile_id,
        license_number,
        specializations,
        experience_years,
        hourly_rate,
        bio,
        languages,
        background_check,
        cpr_certified,
        first_aid_certified,
        verified,
        created_at,
        updated_at,
    })
}

fn conv(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}
