/// Application name
pub const APP_NAME: &str = "CareLink";

/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// Session token size in bytes (hex-encoded to twice this length)
pub const SESSION_TOKEN_SIZE: usize = 16;

/// Default session lifetime in seconds (24 hours)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Review ratings are clamped to this inclusive range
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
