//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer as JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use carelink_shared::{AppointmentStatus, MobilityLevel, Role, ServiceType, UserStatus};

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Identity record for every account, regardless of role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    /// Unique login email.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// URL of the avatar image, if one was uploaded.
    pub avatar_url: Option<String>,
    /// Fixed at registration.
    pub role: Role,
    /// Admin-driven; non-`Active` accounts cannot log in.
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// CaregiverProfile
// ---------------------------------------------------------------------------

/// 1:1 extension of a `Role::Caregiver` profile, keyed by the profile id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaregiverProfile {
    pub profile_id: Uuid,
    pub license_number: String,
    /// Care categories this caregiver offers.
    pub specializations: Vec<ServiceType>,
    pub experience_years: u32,
    /// Rate in the platform currency per hour.
    pub hourly_rate: f64,
    pub bio: Option<String>,
    pub languages: Vec<String>,
    pub background_check: bool,
    pub cpr_certified: bool,
    pub first_aid_certified: bool,
    /// Set by an admin once credentials have been reviewed.
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// PatientProfile
// ---------------------------------------------------------------------------

/// 1:1 extension of a `Role::Patient` profile, keyed by the profile id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    pub profile_id: Uuid,
    pub date_of_birth: NaiveDate,
    pub gender: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub medical_history: Option<String>,
    pub allergies: Vec<String>,
    pub medications: Vec<String>,
    pub mobility_level: MobilityLevel,
    pub care_needs: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Appointment
// ---------------------------------------------------------------------------

/// A scheduled care session at the patient's address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// Null until a caregiver accepts or an admin assigns one.
    pub caregiver_id: Option<Uuid>,
    pub service_type: ServiceType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub hourly_rate: f64,
    pub total_cost: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Session length in fractional hours.
    pub fn duration_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_minutes() as f64 / 60.0
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A direct message between two accounts, with read-state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    /// Set once the recipient has opened the message.
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// A patient's rating of a completed appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub caregiver_id: Uuid,
    /// 1..=5 stars.
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
