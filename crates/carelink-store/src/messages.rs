//! Direct message persistence with read-state.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Message;

impl Database {
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        self.conn().execute(
            "INSERT INTO messages (id, sender_id, recipient_id, body, read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id.to_string(),
                message.sender_id.to_string(),
                message.recipient_id.to_string(),
                message.body,
                message.read,
                message.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// The full conversation between two users, oldest first.
    pub fn conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, sender_id, recipient_id, body, read, created_at
             FROM messages
             WHERE (sender_id = ?1 AND recipient_id = ?2)
                OR (sender_id = ?2 AND recipient_id = ?1)
             ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![a.to_string(), b.to_string()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub fn get_message(&self, id: Uuid) -> Result<Message> {
        self.conn()
            .query_row(
                "SELECT id, sender_id, recipient_id, body, read, created_at
                 FROM messages WHERE id = ?1",
                params![id.to_string()],
                row_to_message,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Mark a message as read.
    pub fn mark_message_read(&self, id: Uuid) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE messages SET read = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Number of unread messages waiting for a recipient.
    pub fn unread_count(&self, recipient_id: Uuid) -> Result<u64> {
        let count: u64 = self.conn().query_row(
            "SELECT COUNT(*) FROM messages WHERE recipient_id = ?1 AND read = 0",
            params![recipient_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let sender_str: String = row.get(1)?;
    let recipient_str: String = row.get(2)?;
    let body: String = row.get(3)?;
    let read: bool = row.get(4)?;
    let ts_str: String = row.get(5)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conv(0, e))?;
    let sender_id = Uuid::parse_str(&sender_str).map_err(|e| conv(1, e))?;
    let recipient_id = Uuid::parse_str(&recipient_str).map_err(|e| conv(2, e))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(5, e))?;

    Ok(Message {
        id,
        sender_id,
        recipient_id,
        body,
        read,
        created_at,
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

    fn message(sender: Uuid, recipient: Uuid, body: &str, at: DateTime<Utc>) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: sender,
            recipient_id: recipient,
            body: body.to_string(),
            read: false,
            created_at: at,
        }
    }

    #[test]
    fn conversation_includes_both_directions_in_order() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let caregiver = insert_identity(&db, Role::Caregiver);
        let other = insert_identity(&db, Role::Patient);

        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 5, 0).unwrap();

        db.insert_message(&message(patient, caregiver, "hi", t1)).unwrap();
        db.insert_message(&message(caregiver, patient, "hello", t2)).unwrap();
        db.insert_message(&message(other, caregiver, "unrelated", t1)).unwrap();

        let convo = db.conversation(patient, caregiver).unwrap();
        assert_eq!(convo.len(), 2);
        assert_eq!(convo[0].body, "hi");
        assert_eq!(convo[1].body, "hello");
    }

    #[test]
    fn read_state_drives_unread_count() {
        let db = Database::open_in_memory().unwrap();
        let patient = insert_identity(&db, Role::Patient);
        let caregiver = insert_identity(&db, Role::Caregiver);

        let m1 = message(patient, caregiver, "one", Utc::now());
        let m2 = message(patient, caregiver, "two", Utc::now());
        db.insert_message(&m1).unwrap();
        db.insert_message(&m2).unwrap();

        assert_eq!(db.unread_count(caregiver).unwrap(), 2);

        db.mark_message_read(m1.id).unwrap();
        assert_eq!(db.unread_count(caregiver).unwrap(), 1);
        assert!(db.get_message(m1.id).unwrap().read);
    }

    #[test]
    fn marking_unknown_message_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.mark_message_read(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }
}
