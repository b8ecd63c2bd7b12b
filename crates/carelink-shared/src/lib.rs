//! # carelink-shared
//!
//! Shared domain vocabulary for the CareLink in-home care platform.
//!
//! This crate defines the enumerations every other crate speaks in (roles,
//! account statuses, care service types), the appointment status state
//! machine, and the domain-level error type.  It deliberately contains no
//! I/O: persistence lives in `carelink-store` and the HTTP surface in
//! `carelink-server`.

pub mod constants;
pub mod lifecycle;
pub mod types;

mod error;

pub use error::DomainError;
pub use lifecycle::AppointmentStatus;
pub use types::{MobilityLevel, Role, ServiceType, UserStatus};
