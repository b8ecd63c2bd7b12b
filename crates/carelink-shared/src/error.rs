use thiserror::Error;

use crate::lifecycle::AppointmentStatus;

/// Domain-rule violations shared across the workspace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An appointment status move the lifecycle does not allow.
    #[error("Invalid appointment transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    /// Moving to `Scheduled` without a caregiver on the appointment.
    #[error("Cannot schedule an appointment without an assigned caregiver")]
    CaregiverRequired,

    /// An unrecognized string where a role was expected.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// An unrecognized string where a user status was expected.
    #[error("Unknown user status: {0}")]
    UnknownUserStatus(String),

    /// An unrecognized string where a service type was expected.
    #[error("Unknown service type: {0}")]
    UnknownServiceType(String),

    /// An unrecognized string where an appointment status was expected.
    #[error("Unknown appointment status: {0}")]
    UnknownAppointmentStatus(String),

    /// An unrecognized string where a mobility level was expected.
    #[error("Unknown mobility level: {0}")]
    UnknownMobilityLevel(String),

    /// Cross-field validation failure (e.g. end time before start time).
    #[error("Validation error: {0}")]
    Validation(String),
}
