use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Account role.  Fixed at registration; no operation mutates it afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Caregiver,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Caregiver => "CAREGIVER",
            Role::Patient => "PATIENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "CAREGIVER" => Ok(Role::Caregiver),
            "PATIENT" => Ok(Role::Patient),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

/// Account status.  Transitions are admin-driven; a non-`Active` user is
/// rejected at login.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
    PendingVerification,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
            UserStatus::Suspended => "SUSPENDED",
            UserStatus::PendingVerification => "PENDING_VERIFICATION",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(UserStatus::Active),
            "INACTIVE" => Ok(UserStatus::Inactive),
            "SUSPENDED" => Ok(UserStatus::Suspended),
            "PENDING_VERIFICATION" => Ok(UserStatus::PendingVerification),
            other => Err(DomainError::UnknownUserStatus(other.to_string())),
        }
    }
}

/// Category of a care appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    PersonalCare,
    Companionship,
    MedicationManagement,
    MealPreparation,
    LightHousekeeping,
    MobilitySupport,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::PersonalCare => "PERSONAL_CARE",
            ServiceType::Companionship => "COMPANIONSHIP",
            ServiceType::MedicationManagement => "MEDICATION_MANAGEMENT",
            ServiceType::MealPreparation => "MEAL_PREPARATION",
            ServiceType::LightHousekeeping => "LIGHT_HOUSEKEEPING",
            ServiceType::MobilitySupport => "MOBILITY_SUPPORT",
        }
    }

    /// All six care categories, in display order.
    pub fn all() -> [ServiceType; 6] {
        [
            ServiceType::PersonalCare,
            ServiceType::Companionship,
            ServiceType::MedicationManagement,
            ServiceType::MealPreparation,
            ServiceType::LightHousekeeping,
            ServiceType::MobilitySupport,
        ]
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERSONAL_CARE" => Ok(ServiceType::PersonalCare),
            "COMPANIONSHIP" => Ok(ServiceType::Companionship),
            "MEDICATION_MANAGEMENT" => Ok(ServiceType::MedicationManagement),
            "MEAL_PREPARATION" => Ok(ServiceType::MealPreparation),
            "LIGHT_HOUSEKEEPING" => Ok(ServiceType::LightHousekeeping),
            "MOBILITY_SUPPORT" => Ok(ServiceType::MobilitySupport),
            other => Err(DomainError::UnknownServiceType(other.to_string())),
        }
    }
}

/// How much help a patient needs moving around.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MobilityLevel {
    Independent,
    WalkingAid,
    Wheelchair,
    Bedridden,
}

impl MobilityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MobilityLevel::Independent => "INDEPENDENT",
            MobilityLevel::WalkingAid => "WALKING_AID",
            MobilityLevel::Wheelchair => "WHEELCHAIR",
            MobilityLevel::Bedridden => "BEDRIDDEN",
        }
    }
}

impl fmt::Display for MobilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MobilityLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INDEPENDENT" => Ok(MobilityLevel::Independent),
            "WALKING_AID" => Ok(MobilityLevel::WalkingAid),
            "WHEELCHAIR" => Ok(MobilityLevel::Wheelchair),
            "BEDRIDDEN" => Ok(MobilityLevel::Bedridden),
            other => Err(DomainError::UnknownMobilityLevel(other.to_string())),
        }
    }
}
