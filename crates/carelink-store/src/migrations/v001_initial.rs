//! v001 -- Initial schema creation.
//!
//! Creates the seven core tables: `profiles`, `credentials`,
//! `caregiver_profiles`, `patient_profiles`, `appointments`, `messages`,
//! and `reviews`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Profiles
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS profiles (
    id         TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    email      TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    last_name  TEXT NOT NULL,
    phone      TEXT,
    avatar_url TEXT,
    role       TEXT NOT NULL,                -- ADMIN / CAREGIVER / PATIENT
    status     TEXT NOT NULL,                -- ACTIVE / INACTIVE / SUSPENDED / PENDING_VERIFICATION
    created_at TEXT NOT NULL,                -- ISO-8601 / RFC-3339
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_profiles_role ON profiles(role);

-- ----------------------------------------------------------------
-- Credentials (password hashes, kept out of the profiles table)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS credentials (
    profile_id    TEXT PRIMARY KEY NOT NULL,
    password_hash TEXT NOT NULL,             -- argon2 PHC string

    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Caregiver profiles (1:1 extension of a CAREGIVER profile)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS caregiver_profiles (
    profile_id          TEXT PRIMARY KEY NOT NULL,
    license_number      TEXT NOT NULL,
    specializations     TEXT NOT NULL,       -- JSON array of service types
    experience_years    INTEGER NOT NULL,
    hourly_rate         REAL NOT NULL,
    bio                 TEXT,
    languages           TEXT NOT NULL,       -- JSON array of strings
    background_check    INTEGER NOT NULL DEFAULT 0,
    cpr_certified       INTEGER NOT NULL DEFAULT 0,
    first_aid_certified INTEGER NOT NULL DEFAULT 0,
    verified            INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,

    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Patient profiles (1:1 extension of a PATIENT profile)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS patient_profiles (
    profile_id              TEXT PRIMARY KEY NOT NULL,
    date_of_birth           TEXT NOT NULL,   -- ISO-8601 date
    gender                  TEXT,
    address                 TEXT NOT NULL,
    city                    TEXT NOT NULL,
    state                   TEXT NOT NULL,
    zip_code                TEXT NOT NULL,
    emergency_contact_name  TEXT NOT NULL,
    emergency_contact_phone TEXT NOT NULL,
    medical_history         TEXT,
    allergies               TEXT NOT NULL,   -- JSON array of strings
    medications             TEXT NOT NULL,   -- JSON array of strings
    mobility_level          TEXT NOT NULL,
    care_needs              TEXT,
    insurance_provider      TEXT,
    insurance_number        TEXT,
    created_at              TEXT NOT NULL,
    updated_at              TEXT NOT NULL,

    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Appointments
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS appointments (
    id           TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    patient_id   TEXT NOT NULL,              -- FK -> profiles(id)
    caregiver_id TEXT,                       -- nullable FK -> profiles(id)
    service_type TEXT NOT NULL,
    start_time   TEXT NOT NULL,              -- ISO-8601
    end_time     TEXT NOT NULL,
    status       TEXT NOT NULL,              -- PENDING / SCHEDULED / IN_PROGRESS / COMPLETED / CANCELLED
    notes        TEXT,
    address      TEXT NOT NULL,
    city         TEXT NOT NULL,
    state        TEXT NOT NULL,
    zip_code     TEXT NOT NULL,
    hourly_rate  REAL NOT NULL,
    total_cost   REAL NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,

    FOREIGN KEY (patient_id) REFERENCES profiles(id) ON DELETE CASCADE,
    FOREIGN KEY (caregiver_id) REFERENCES profiles(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_appointments_patient
    ON appointments(patient_id, start_time DESC);
CREATE INDEX IF NOT EXISTS idx_appointments_caregiver
    ON appointments(caregiver_id, start_time DESC);

-- ----------------------------------------------------------------
-- Messages (direct messages with read-state)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id           TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    sender_id    TEXT NOT NULL,              -- FK -> profiles(id)
    recipient_id TEXT NOT NULL,              -- FK -> profiles(id)
    body         TEXT NOT NULL,
    read         INTEGER NOT NULL DEFAULT 0, -- boolean 0/1
    created_at   TEXT NOT NULL,

    FOREIGN KEY (sender_id) REFERENCES profiles(id) ON DELETE CASCADE,
    FOREIGN KEY (recipient_id) REFERENCES profiles(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_recipient
    ON messages(recipient_id, read);

-- ----------------------------------------------------------------
-- Reviews
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS reviews (
    id             TEXT PRIMARY KEY NOT NULL, -- UUID v4
    appointment_id TEXT NOT NULL UNIQUE,      -- one review per appointment
    patient_id     TEXT NOT NULL,
    caregiver_id   TEXT NOT NULL,
    rating         INTEGER NOT NULL,          -- 1..=5
    comment        TEXT,
    created_at     TEXT NOT NULL,

    FOREIGN KEY (appointment_id) REFERENCES appointments(id) ON DELETE CASCADE,
    FOREIGN KEY (patient_id) REFERENCES profiles(id) ON DELETE CASCADE,
    FOREIGN KEY (caregiver_id) REFERENCES profiles(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_reviews_caregiver
    ON reviews(caregiver_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
