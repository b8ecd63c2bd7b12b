//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use carelink_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_SESSION_TTL_SECS};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Filesystem path of the SQLite database.  When unset, the
    /// platform-appropriate data directory is used.
    /// Env: `DATABASE_PATH`
    pub database_path: Option<PathBuf>,

    /// Human-readable name for this server instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"CareLink"`
    pub instance_name: String,

    /// Whether self-registered accounts start `Active`.  When closed, new
    /// accounts start `PendingVerification` and need admin activation.
    /// Env: `REGISTRATION_OPEN` (true/false)
    /// Default: `true`
    pub registration_open: bool,

    /// Session lifetime in seconds.
    /// Env: `SESSION_TTL_SECS`
    /// Default: 86400 (24 hours)
    pub session_ttl_secs: u64,

    /// Sustained request rate allowed per client IP, and the burst ceiling.
    /// Env: `RATE_LIMIT_PER_SEC`, `RATE_LIMIT_BURST`
    /// Default: 10 requests/second, burst of 30
    pub rate_limit_per_sec: f64,
    pub rate_limit_burst: f64,

    /// Bootstrap admin account, created at startup if the email is not
    /// already registered.  Both must be set for the bootstrap to run.
    /// Env: `ADMIN_EMAIL`, `ADMIN_PASSWORD`
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            instance_name: "CareLink".to_string(),
            registration_open: true,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
            admin_email: None,
            admin_password: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(name) = std::env::var("INSTANCE_NAME") {
            config.instance_name = name;
        }

        if let Ok(val) = std::env::var("REGISTRATION_OPEN") {
            config.registration_open = val != "false" && val != "0";
        }

        if let Ok(val) = std::env::var("SESSION_TTL_SECS") {
            match val.parse::<u64>() {
                Ok(n) if n > 0 => config.session_ttl_secs = n,
                _ => {
                    tracing::warn!(value = %val, "Invalid SESSION_TTL_SECS, using default");
                }
            }
        }

        if let Ok(val) = std::env::var("RATE_LIMIT_PER_SEC") {
            match val.parse::<f64>() {
                Ok(n) if n > 0.0 => config.rate_limit_per_sec = n,
                _ => {
                    tracing::warn!(value = %val, "Invalid RATE_LIMIT_PER_SEC, using default");
                }
            }
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_BURST") {
            match val.parse::<f64>() {
                Ok(n) if n >= 1.0 => config.rate_limit_burst = n,
                _ => {
                    tracing::warn!(value = %val, "Invalid RATE_LIMIT_BURST, using default");
                }
            }
        }

        if let Ok(email) = std::env::var("ADMIN_EMAIL") {
            if !email.is_empty() {
                config.admin_email = Some(email);
            }
        }
        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            if !password.is_empty() {
                config.admin_password = Some(password);
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
