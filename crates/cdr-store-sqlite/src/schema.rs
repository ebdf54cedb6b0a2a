//! SQL schema for the CDR SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS subscribers (
    subscriber_id TEXT PRIMARY KEY,
    msisdn        TEXT NOT NULL UNIQUE
);

-- Call records are strictly append-only.
-- record_id preserves insertion order for calls sharing a start time.
CREATE TABLE IF NOT EXISTS call_records (
    record_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    call_type     TEXT NOT NULL,   -- '01' outgoing | '02' incoming
    caller_msisdn TEXT NOT NULL,
    callee_msisdn TEXT NOT NULL,
    start_time    TEXT NOT NULL,   -- fixed-width RFC 3339 UTC, microseconds
    end_time      TEXT NOT NULL,
    CHECK (end_time > start_time),
    CHECK (caller_msisdn != callee_msisdn)
);

CREATE INDEX IF NOT EXISTS call_records_caller_idx ON call_records(caller_msisdn, start_time);
CREATE INDEX IF NOT EXISTS call_records_callee_idx ON call_records(callee_msisdn, start_time);
CREATE INDEX IF NOT EXISTS call_records_start_idx  ON call_records(start_time);

PRAGMA user_version = 1;
";
