//! Appointment status lifecycle.
//!
//! Every status change goes through [`AppointmentStatus::transition_to`], so
//! an illegal move (say `Completed -> Scheduled`) fails with a typed error
//! instead of silently overwriting the row.
//!
//! ```text
//! Pending ---> Scheduled ---> InProgress ---> Completed
//!    |             |               |
//!    +-------------+---------------+--------> Cancelled
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Status of a care appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::InProgress => "IN_PROGRESS",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    /// `Completed` and `Cancelled` admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        match (self, next) {
            (Pending, Scheduled) => true,
            (Scheduled, InProgress) => true,
            (InProgress, Completed) => true,
            // Any non-terminal state may be cancelled.
            (from, Cancelled) if !from.is_terminal() => true,
            _ => false,
        }
    }

    /// Validate a status move, returning the new status on success.
    pub fn transition_to(&self, next: AppointmentStatus) -> Result<AppointmentStatus, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }

    /// Initial status for a new booking: `Scheduled` when a caregiver was
    /// pre-assigned in the request, `Pending` otherwise.
    pub fn initial(caregiver_assigned: bool) -> AppointmentStatus {
        if caregiver_assigned {
            AppointmentStatus::Scheduled
        } else {
            AppointmentStatus::Pending
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AppointmentStatus::Pending),
            "SCHEDULED" => Ok(AppointmentStatus::Scheduled),
            "IN_PROGRESS" => Ok(AppointmentStatus::InProgress),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            "CANCELLED" => Ok(AppointmentStatus::Cancelled),
            other => Err(DomainError::UnknownAppointmentStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn happy_path_progression() {
        let s = Pending.transition_to(Scheduled).unwrap();
        let s = s.transition_to(InProgress).unwrap();
        let s = s.transition_to(Completed).unwrap();
        assert!(s.is_terminal());
    }

    #[test]
    fn any_non_terminal_state_can_cancel() {
        for from in [Pending, Scheduled, InProgress] {
            assert_eq!(from.transition_to(Cancelled).unwrap(), Cancelled);
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        for from in [Completed, Cancelled] {
            for to in [Pending, Scheduled, InProgress, Completed, Cancelled] {
                assert!(from.transition_to(to).is_err());
            }
        }
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        assert!(matches!(
            Pending.transition_to(InProgress),
            Err(DomainError::InvalidTransition {
                from: Pending,
                to: InProgress
            })
        ));
        assert!(Pending.transition_to(Completed).is_err());
        assert!(Scheduled.transition_to(Completed).is_err());
    }

    #[test]
    fn reopening_a_completed_appointment_is_rejected() {
        assert!(Completed.transition_to(Scheduled).is_err());
    }

    #[test]
    fn initial_status_depends_on_assignment() {
        assert_eq!(AppointmentStatus::initial(false), Pending);
        assert_eq!(AppointmentStatus::initial(true), Scheduled);
    }

    #[test]
    fn wire_form_round_trip() {
        for s in [Pending, Scheduled, InProgress, Completed, Cancelled] {
            assert_eq!(s.as_str().parse::<AppointmentStatus>().unwrap(), s);
        }
        assert!("DONE".parse::<AppointmentStatus>().is_err());
    }
}
