//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup; `PRAGMA user_version` records the
//! layout for future migrations.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per profile. Binary artifacts live in the blob store; only their
-- relative path, digest and media type are kept here.
CREATE TABLE IF NOT EXISTS records (
    id                TEXT PRIMARY KEY,
    role              TEXT,            -- 'student' | 'teacher' | 'college_staff'
    department        TEXT,
    student_grade     TEXT,
    student_name      TEXT NOT NULL,
    father_name       TEXT NOT NULL,
    dob               TEXT,            -- YYYY-MM-DD
    contact           TEXT,
    roll_no           TEXT NOT NULL,
    session           TEXT NOT NULL,
    email             TEXT,
    address           TEXT NOT NULL,
    gender            TEXT NOT NULL,
    emergency_contact TEXT NOT NULL,
    blood_group       TEXT NOT NULL,
    expiry_date       TEXT,
    id_card_number    TEXT NOT NULL,
    photo_path        TEXT NOT NULL,
    photo_hash        TEXT NOT NULL,
    photo_type        TEXT NOT NULL,
    qr_path           TEXT NOT NULL,
    qr_hash           TEXT NOT NULL,
    qr_type           TEXT NOT NULL,
    card_issue_date   TEXT NOT NULL,
    created_at        TEXT NOT NULL,   -- RFC 3339, fixed-width microseconds
    updated_at        TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS records_roll_no_idx    ON records(roll_no);
CREATE INDEX        IF NOT EXISTS records_created_idx    ON records(created_at);
CREATE INDEX        IF NOT EXISTS records_department_idx ON records(department);

PRAGMA user_version = 1;
";
