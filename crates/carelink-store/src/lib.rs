//! # carelink-store
//!
//! Persistence layer for the CareLink platform, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model: profiles, caregiver and patient extensions, appointments,
//! messages, and reviews.  Schema migrations run on open.

pub mod appointments;
pub mod caregivers;
pub mod credentials;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod patients;
pub mod profiles;
pub mod reviews;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
