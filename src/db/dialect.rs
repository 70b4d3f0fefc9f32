//! PostgreSQL dialect profile
//!
//! Everything the generic engine needs but cannot know on its own: how row
//! identifiers are assigned, how to measure on-disk size, how to compact
//! superseded history, and how to classify server errors. Exactly one
//! profile is attached per backend instance and it is immutable afterwards.

use crate::error::EngineError;

/// Reserved key holding the compaction horizon; never compacted itself.
pub const COMPACT_REV_KEY: &str = "compact_rev_key";

/// Approximate on-disk size (data + index bytes) of the kine table in the
/// connected database.
pub const SIZE_SQL: &str = "SELECT pg_total_relation_size('kine')";

/// One-pass compaction delete.
///
/// A row is compaction-eligible either because a later row supersedes it
/// (its id appears as another row's prev_revision, excluding the reserved
/// sentinel key and the zero pointer) or because it is a tombstone; both
/// branches are bounded by the same cutoff so history newer than the
/// compaction horizon is never touched.
pub const COMPACT_SQL: &str = "\
DELETE FROM kine AS kv
USING (
    SELECT kp.prev_revision AS id
    FROM kine AS kp
    WHERE
        kp.name != 'compact_rev_key' AND
        kp.prev_revision != 0 AND
        kp.id <= $1
    UNION
    SELECT kd.id AS id
    FROM kine AS kd
    WHERE
        kd.deleted != 0 AND
        kd.id <= $2
) AS ks
WHERE kv.id = ks.id";

/// Dialect-specific behaviors attached to the generic engine handle
pub struct DialectProfile {
    /// The database assigns row identifiers on insert; the engine reads the
    /// assigned id back instead of generating one itself
    pub auto_increment_id: bool,

    /// Read-only aggregate returning the table's on-disk size in bytes
    pub size_sql: &'static str,

    /// Single-statement history compaction (two positional cutoff params)
    pub compact_sql: &'static str,

    /// Maps a dialect server error into the engine's canonical existence
    /// error; all other errors pass through unchanged
    pub translate_err: fn(tokio_postgres::Error) -> EngineError,

    /// Loggable/comparable code for an arbitrary driver error; diagnostics
    /// only, never control flow
    pub err_code: fn(Option<&tokio_postgres::Error>) -> String,

    /// Whether a server error means "this object already exists"
    pub is_existence_conflict: fn(&tokio_postgres::Error) -> bool,
}

/// Build the PostgreSQL dialect profile
pub fn postgres_profile() -> DialectProfile {
    DialectProfile {
        auto_increment_id: true,
        size_sql: SIZE_SQL,
        compact_sql: COMPACT_SQL,
        translate_err,
        err_code,
        is_existence_conflict,
    }
}

/// SQLSTATEs raised by create-if-not-exists collisions
/// (duplicate database/schema/table/object).
pub(crate) fn is_existence_sqlstate(code: &str) -> bool {
    matches!(code, "42P04" | "42P06" | "42P07" | "42710")
}

/// SQLSTATE raised by unique-constraint violations.
pub(crate) fn is_unique_violation_sqlstate(code: &str) -> bool {
    code == "23505"
}

pub(crate) fn translate_err(err: tokio_postgres::Error) -> EngineError {
    match err.as_db_error() {
        Some(db) if is_unique_violation_sqlstate(db.code().code()) => EngineError::KeyExists,
        Some(db) => EngineError::Server {
            code: db.code().code().to_string(),
            message: db.message().to_string(),
        },
        None => EngineError::QueryFailed(err.to_string()),
    }
}

pub(crate) fn err_code(err: Option<&tokio_postgres::Error>) -> String {
    match err {
        None => String::new(),
        Some(e) => match e.as_db_error() {
            Some(db) => db.code().code().to_string(),
            None => e.to_string(),
        },
    }
}

pub(crate) fn is_existence_conflict(err: &tokio_postgres::Error) -> bool {
    err.as_db_error()
        .is_some_and(|db| is_existence_sqlstate(db.code().code()))
}

/// Untranslated driver-error mapping used by the bootstrap stages.
pub(crate) fn to_engine_error(err: tokio_postgres::Error) -> EngineError {
    match err.as_db_error() {
        Some(db) => EngineError::Server {
            code: db.code().code().to_string(),
            message: db.message().to_string(),
        },
        None => EngineError::QueryFailed(err.to_string()),
    }
}
