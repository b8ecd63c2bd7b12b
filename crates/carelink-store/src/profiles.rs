//! CRUD operations for [`Profile`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use carelink_shared::{Role, UserStatus};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Profile;

impl Database {
    // ------------------------------------------------------------------
    // Create / Upsert
    // ------------------------------------------------------------------

    /// Insert a new profile.  Fails on duplicate id or email.
    pub fn insert_profile(&self, profile: &Profile) -> Result<()> {
        self.conn().execute(
            "INSERT INTO profiles (id, email, first_name, last_name, phone, avatar_url,
                                   role, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                profile.id.to_string(),
                profile.email,
                profile.first_name,
                profile.last_name,
                profile.phone,
                profile.avatar_url,
                profile.role.as_str(),
                profile.status.as_str(),
                profile.created_at.to_rfc3339(),
                profile.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Insert-or-replace keyed by id.  The caller supplies the full record;
    /// every column is written.
    ///
    /// Uses `ON CONFLICT DO UPDATE` rather than `INSERT OR REPLACE` so the
    /// row id survives and `ON DELETE CASCADE` children are not dropped.
    pub fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        self.conn().execute(
            "INSERT INTO profiles (id, email, first_name, last_name, phone, avatar_url,
                                   role, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                 email      = excluded.email,
                 first_name = excluded.first_name,
                 last_name  = excluded.last_name,
                 phone      = excluded.phone,
                 avatar_url = excluded.avatar_url,
                 role       = excluded.role,
                 status     = excluded.status,
                 updated_at = excluded.updated_at",
            params![
                profile.id.to_string(),
                profile.email,
                profile.first_name,
                profile.last_name,
                profile.phone,
                profile.avatar_url,
                profile.role.as_str(),
                profile.status.as_str(),
                profile.created_at.to_rfc3339(),
                profile.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single profile by UUID.  Returns [`StoreError::NotFound`]
    /// when no such row exists; callers treat that as "no profile yet".
    pub fn get_profile(&self, id: Uuid) -> Result<Profile> {
        self.conn()
            .query_row(
                "SELECT id, email, first_name, last_name, phone, avatar_url,
                        role, status, created_at, updated_at
                 FROM profiles
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_profile,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Fetch a single profile by login email.
    pub fn get_profile_by_email(&self, email: &str) -> Result<Profile> {
        self.conn()
            .query_row(
                "SELECT id, email, first_name, last_name, phone, avatar_url,
                        role, status, created_at, updated_at
                 FROM profiles
                 WHERE email = ?1",
                params![email],
                row_to_profile,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all profiles, newest first.
    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, email, first_name, last_name, phone, avatar_url,
                    role, status, created_at, updated_at
             FROM profiles
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], row_to_profile)?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok(profiles)
    }

    /// List profiles with a given role, newest first.
    pub fn list_profiles_by_role(&self, role: Role) -> Result<Vec<Profile>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, email, first_name, last_name, phone, avatar_url,
                    role, status, created_at, updated_at
             FROM profiles
             WHERE role = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![role.as_str()], row_to_profile)?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok(profiles)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Set the account status (admin action).
    pub fn set_profile_status(&self, id: Uuid, status: UserStatus) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE profiles SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a profile by UUID.  Returns `true` if a row was deleted.
    /// Credentials, extensions, and appointments cascade.
    pub fn delete_profile(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM profiles WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Profile`].
fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
    let id_str: String = row.get(0)?;
    let email: String = row.get(1)?;
    let first_name: String = row.get(2)?;
    let last_name: String = row.get(3)?;
    let phone: Option<String> = row.get(4)?;
    let avatar_url: Option<String> = row.get(5)?;
    let role_str: String = row.get(6)?;
    let status_str: String = row.get(7)?;
    let created_str: String = row.get(8)?;
    let updated_str: String = row.get(9)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conv(0, e))?;
    let role: Role = role_str.parse().map_err(|e| conv(6, e))?;
    let status: UserStatus = status_str.parse().map_err(|e| conv(7, e))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(8, e))?;
    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(9, e))?;

    Ok(Profile {
        id,
        email,
        first_name,
        last_name,
        phone,
        avatar_url,
        role,
        status,
        created_at,
        updated_at,
    })
}

fn conv(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}
