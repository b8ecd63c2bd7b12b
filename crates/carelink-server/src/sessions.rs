//! Session issuance and lookup.
//!
//! Sessions are explicit state owned by the [`SessionManager`] in the
//! application state.  One is created on login, destroyed on logout, and
//! expires after the configured TTL.  Nothing else may write to it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use carelink_shared::constants::SESSION_TOKEN_SIZE;
use carelink_shared::Role;

/// An authenticated session, injected into request extensions by the auth
/// middleware.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub profile_id: Uuid,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Issues, resolves, and revokes bearer-token sessions.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Create a session for a freshly authenticated profile.
    pub async fn create(&self, profile_id: Uuid, role: Role) -> Session {
        let mut bytes = [0u8; SESSION_TOKEN_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);

        let session = Session {
            token: hex::encode(bytes),
            profile_id,
            role,
            expires_at: Utc::now() + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Resolve a bearer token to its session.  Expired sessions are removed
    /// on the spot and treated as absent.
    pub async fn authenticate(&self, token: &str) -> Option<Session> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(s) if !s.is_expired() => return Some(s.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // The token was found but expired; drop it.
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
        None
    }

    /// Destroy a session (logout).  Returns `true` if one existed.
    pub async fn destroy(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token).is_some()
    }

    /// Destroy every session of a profile.  Used when an admin suspends or
    /// deactivates an account.
    pub async fn destroy_for_profile(&self, profile_id: Uuid) {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.profile_id != profile_id);
    }

    /// Evict expired sessions.
    pub async fn purge_expired(&self) {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "Purged expired sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_authenticate() {
        let manager = SessionManager::new(60);
        let id = Uuid::new_v4();

        let session = manager.create(id, Role::Patient).await;
        assert_eq!(session.token.len(), SESSION_TOKEN_SIZE * 2);

        let resolved = manager.authenticate(&session.token).await.unwrap();
        assert_eq!(resolved.profile_id, id);
        assert_eq!(resolved.role, Role::Patient);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let manager = SessionManager::new(60);
        assert!(manager.authenticate("deadbeef").await.is_none());
    }

    #[tokio::test]
    async fn destroy_invalidates_token() {
        let manager = SessionManager::new(60);
        let session = manager.create(Uuid::new_v4(), Role::Admin).await;

        assert!(manager.destroy(&session.token).await);
        assert!(manager.authenticate(&session.token).await.is_none());
        assert!(!manager.destroy(&session.token).await);
    }

    #[tokio::test]
    async fn expired_session_is_treated_as_absent() {
        let manager = SessionManager::new(0);
        let session = manager.create(Uuid::new_v4(), Role::Patient).await;
        assert!(manager.authenticate(&session.token).await.is_none());
    }

    #[tokio::test]
    async fn destroy_for_profile_revokes_all_of_their_sessions() {
        let manager = SessionManager::new(60);
        let target = Uuid::new_v4();
        let other = Uuid::new_v4();

        let s1 = manager.create(target, Role::Patient).await;
        let s2 = manager.create(target, Role::Patient).await;
        let s3 = manager.create(other, Role::Caregiver).await;

        manager.destroy_for_profile(target).await;
        assert!(manager.authenticate(&s1.token).await.is_none());
        assert!(manager.authenticate(&s2.token).await.is_none());
        assert!(manager.authenticate(&s3.token).await.is_some());
    }
}
