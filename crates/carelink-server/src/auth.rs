//! Registration, login, and logout.
//!
//! Passwords are hashed with argon2id and stored as PHC strings in the
//! credentials table.  A successful login issues a bearer-token session.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use carelink_shared::constants::MIN_PASSWORD_LEN;
use carelink_shared::{Role, UserStatus};
use carelink_store::{Profile, StoreError};

use crate::api::AppState;
use crate::error::ServerError;
use crate::sessions::Session;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// `CAREGIVER` or `PATIENT`; admin accounts are bootstrapped, never
    /// self-registered.
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub profile: Profile,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Profile>, ServerError> {
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(ServerError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ServerError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if req.role == Role::Admin {
        return Err(ServerError::Forbidden(
            "Admin accounts cannot self-register".to_string(),
        ));
    }

    let status = if state.config.registration_open {
        UserStatus::Active
    } else {
        UserStatus::PendingVerification
    };

    let now = Utc::now();
    let profile = Profile {
        id: Uuid::new_v4(),
        email,
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
        avatar_url: None,
        role: req.role,
        status,
        created_at: now,
        updated_at: now,
    };

    let password_hash = hash_password(&req.password)?;

    {
        let db = state.db.lock().await;
        match db.get_profile_by_email(&profile.email) {
            Ok(_) => {
                return Err(ServerError::Conflict(
                    "An account with this email already exists".to_string(),
                ))
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
        db.insert_profile(&profile)?;
        db.set_password_hash(profile.id, &password_hash)?;
    }

    info!(profile = %profile.id, role = %profile.role, "account registered");
    Ok(Json(profile))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    let email = req.email.trim().to_lowercase();

    let (profile, password_hash) = {
        let db = state.db.lock().await;
        let profile = db.get_profile_by_email(&email).map_err(|e| match e {
            StoreError::NotFound => invalid_credentials(),
            other => other.into(),
        })?;
        let hash = db.get_password_hash(profile.id).map_err(|e| match e {
            StoreError::NotFound => invalid_credentials(),
            other => other.into(),
        })?;
        (profile, hash)
    };

    if !verify_password(&req.password, &password_hash) {
        return Err(invalid_credentials());
    }

    // The status flag is checked here so a suspended account is rejected
    // even with correct credentials.
    if profile.status != UserStatus::Active {
        return Err(ServerError::Forbidden(format!(
            "Account is {}",
            profile.status
        )));
    }

    let session = state.sessions.create(profile.id, profile.role).await;

    info!(profile = %profile.id, role = %profile.role, "login");
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        profile,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<serde_json::Value>, ServerError> {
    state.sessions.destroy(&session.token).await;
    info!(profile = %session.profile_id, "logout");
    Ok(Json(serde_json::json!({ "logged_out": true })))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Profile>, ServerError> {
    let db = state.db.lock().await;
    let profile = db.get_profile(session.profile_id)?;
    Ok(Json(profile))
}

fn invalid_credentials() -> ServerError {
    ServerError::Unauthorized("Invalid email or password".to_string())
}

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

pub(crate) fn hash_password(password: &str) -> Result<String, ServerError> {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString},
        Argon2,
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServerError::Internal(format!("Password hashing failed: {e}")))
}

pub(crate) fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{
        password_hash::{PasswordHash, PasswordVerifier},
        Argon2,
    };

    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
