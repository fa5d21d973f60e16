//! SQL schema for the SARAL SQLite store.
//!
//! Executed once at connection startup. Databases created by an older
//! build are brought forward by the steps in [`MIGRATIONS`], gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS schemes (
    code  TEXT PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    role          TEXT NOT NULL CHECK (role IN ('OPERATOR', 'SUPERVISOR')),
    email         TEXT NOT NULL UNIQUE,    -- lower-cased on write
    otp_hash      TEXT NOT NULL,           -- argon2 PHC string
    last_login_at TEXT
);

CREATE TABLE IF NOT EXISTS cases (
    case_id      TEXT PRIMARY KEY,
    scheme_code  TEXT NOT NULL REFERENCES schemes(code),
    citizen_hash TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'NEW'
                 CHECK (status IN ('NEW', 'IN_REVIEW', 'APPROVED', 'REJECTED')),
    source       TEXT NOT NULL CHECK (source IN ('SMS', 'WEB')),
    locale       TEXT NOT NULL,
    created_at   TEXT NOT NULL,            -- RFC 3339 UTC, microseconds
    updated_at   TEXT NOT NULL,
    triage       TEXT,                     -- JSON screening outcome or NULL
    UNIQUE (citizen_hash, scheme_code)
);

-- Events are append-only: rows are inserted alongside the mutation they
-- describe and removed only by cascade from their case. The database
-- enforces only the no-update half: the trigger below rejects UPDATEs of
-- event content, but DELETE stays allowed because the ON DELETE CASCADE
-- from cases runs as an ordinary delete. Nothing in the store deletes
-- events directly.
CREATE TABLE IF NOT EXISTS events (
    event_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id     TEXT REFERENCES cases(case_id) ON DELETE CASCADE,
    actor_id    TEXT REFERENCES users(user_id) ON DELETE SET NULL,
    action      TEXT NOT NULL,
    actor_type  TEXT NOT NULL,
    payload     TEXT,                      -- JSON or NULL
    recorded_at TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS events_append_only
BEFORE UPDATE OF case_id, action, actor_type, payload, recorded_at ON events
BEGIN
    SELECT RAISE(ABORT, 'events are append-only');
END;

CREATE TABLE IF NOT EXISTS bundles (
    bundle_id TEXT PRIMARY KEY,
    case_id   TEXT NOT NULL REFERENCES cases(case_id) ON DELETE CASCADE,
    doc_type  TEXT NOT NULL,
    locator   TEXT NOT NULL,
    added_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS cases_status_idx   ON cases(status);
CREATE INDEX IF NOT EXISTS cases_created_idx  ON cases(created_at);
CREATE INDEX IF NOT EXISTS events_case_idx    ON events(case_id);
CREATE INDEX IF NOT EXISTS bundles_case_idx   ON bundles(case_id);

PRAGMA user_version = 2;
";

/// `(from_version, ddl)` steps. Each runs, in order, on an existing
/// database whose `user_version` was at most `from_version` before
/// [`SCHEMA`] was applied. Fresh databases (version 0) skip them all.
pub const MIGRATIONS: &[(i64, &str)] = &[
  (1, "ALTER TABLE cases ADD COLUMN triage TEXT;"),
];
