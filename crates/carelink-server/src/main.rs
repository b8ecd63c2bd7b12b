//! # carelink-server
//!
//! REST API server for the CareLink in-home care platform.
//!
//! This binary provides:
//! - **Session authentication** (register / login / logout with argon2
//!   password hashing and bearer-token sessions)
//! - **Role-scoped data access** for admins, caregivers, and patients
//! - **Appointment lifecycle** enforcement via an explicit state machine
//! - **Direct messaging** with read-state and **caregiver reviews**
//! - **Per-IP rate limiting** to protect against abuse

mod api;
mod appointments;
mod auth;
mod caregivers;
mod config;
mod error;
mod guard;
mod messaging;
mod patients;
mod profiles;
mod rate_limit;
mod reviews;
mod sessions;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use carelink_shared::{Role, UserStatus};
use carelink_store::{Database, Profile, StoreError};

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;
use crate::sessions::SessionManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,carelink_server=debug")),
        )
        .init();

    info!("Starting CareLink server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        instance = %config.instance_name,
        registration_open = config.registration_open,
        session_ttl_secs = config.session_ttl_secs,
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };

    // Bootstrap admin account if configured and not present yet.
    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        bootstrap_admin(&db, email, password)?;
    }

    let sessions = SessionManager::new(config.session_ttl_secs);

    let rate_limiter = RateLimiter::new(config.rate_limit_per_sec, config.rate_limit_burst);

    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        sessions: sessions.clone(),
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let rl = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.purge_idle(std::time::Duration::from_secs(600)).await;
        }
    });

    // Periodic session cleanup (every 10 minutes)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            sessions.purge_expired().await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    let http_addr = config.http_addr;
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

/// Create the configured admin account unless the email is already taken.
fn bootstrap_admin(db: &Database, email: &str, password: &str) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    match db.get_profile_by_email(&email) {
        Ok(_) => {
            info!(email = %email, "Admin account already exists, skipping bootstrap");
            return Ok(());
        }
        Err(StoreError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let now = Utc::now();
    let profile = Profile {
        id: Uuid::new_v4(),
        email,
        first_name: "Admin".to_string(),
        last_name: "Account".to_string(),
        phone: None,
        avatar_url: None,
        role: Role::Admin,
        status: UserStatus::Active,
        created_at: now,
        updated_at: now,
    };

    let hash = auth::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;

    db.insert_profile(&profile)?;
    db.set_password_hash(profile.id, &hash)?;

    info!(email = %profile.email, id = %profile.id, "Bootstrapped admin account");
    Ok(())
}
