//! Password hash storage, kept in its own table so profile reads never
//! carry credential material.

use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Store (or replace) the password hash for a profile.
    pub fn set_password_hash(&self, profile_id: Uuid, password_hash: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO credentials (profile_id, password_hash)
             VALUES (?1, ?2)
             ON CONFLICT(profile_id) DO UPDATE SET password_hash = excluded.password_hash",
            params![profile_id.to_string(), password_hash],
        )?;
        Ok(())
    }

    /// Fetch the stored password hash for a profile.
    pub fn get_password_hash(&self, profile_id: Uuid) -> Result<String> {
        self.conn()
            .query_row(
                "SELECT password_hash FROM credentials WHERE profile_id = ?1",
                params![profile_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use carelink_shared::{Role, UserStatus};
    use chrono::Utc;

    fn insert_test_profile(db: &Database) -> Uuid {
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
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

    #[test]
    fn set_then_get_hash() {
        let db = Database::open_in_memory().unwrap();
        let id = insert_test_profile(&db);

        db.set_password_hash(id, "$argon2id$v=19$m=19456,t=2,p=1$abc$def")
            .unwrap();
        let hash = db.get_password_hash(id).unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn replace_hash_overwrites() {
        let db = Database::open_in_memory().unwrap();
        let id = insert_test_profile(&db);

        db.set_password_hash(id, "first").unwrap();
        db.set_password_hash(id, "second").unwrap();
        assert_eq!(db.get_password_hash(id).unwrap(), "second");
    }

    #[test]
    fn missing_hash_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_password_hash(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }
}
