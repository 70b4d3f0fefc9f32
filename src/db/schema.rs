//! Schema definition and provisioning
//!
//! DDL for the kine table and its indexes, plus the idempotent provisioner
//! that runs it on every bootstrap. Statement order matters only in that the
//! table must exist before the indexes reference it.

use crate::db::dialect::{self, DialectProfile};
use crate::error::EngineResult;
use tokio_postgres::Client;

/// SQL statement for creating the kine table.
///
/// `id` is database-assigned (see the dialect profile's identifier
/// strategy); `value`/`old_value` hold the serialized key-value payloads.
pub const KINE_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS kine (
    id              BIGSERIAL PRIMARY KEY,
    name            VARCHAR(630),
    created         BIGINT,
    deleted         BIGINT,
    create_revision BIGINT,
    prev_revision   BIGINT,
    lease           BIGINT,
    value           BYTEA,
    old_value       BYTEA
)
"#;

/// Ordered DDL list: table first, then indexes.
///
/// The index statements are deliberately unconditional; a rerun surfaces
/// duplicate-relation server errors which the provisioner classifies and
/// swallows per statement.
pub const SCHEMA: [&str; 6] = [
    KINE_TABLE_DDL,
    "CREATE INDEX kine_name_index ON kine (name)",
    "CREATE INDEX kine_name_id_index ON kine (name, id)",
    "CREATE INDEX kine_id_deleted_index ON kine (id, deleted)",
    "CREATE INDEX kine_prev_revision_index ON kine (prev_revision)",
    "CREATE UNIQUE INDEX kine_name_prev_revision_uindex ON kine (name, prev_revision)",
];

/// Ensure every table and index exists.
///
/// Statements run sequentially, not in one transaction: each statement's
/// already-exists error is independently classified and swallowed, while any
/// other error aborts the remaining statements and propagates.
pub async fn provision(client: &Client, profile: &DialectProfile) -> EngineResult<()> {
    tracing::info!("Configuring database table schema and indexes, this may take a moment...");

    for stmt in SCHEMA {
        tracing::trace!(statement = %stripped(stmt), "provisioning");
        if let Err(err) = client.execute(stmt, &[]).await {
            if (profile.is_existence_conflict)(&err) {
                tracing::debug!(
                    code = %(profile.err_code)(Some(&err)),
                    "schema object already exists"
                );
                continue;
            }
            return Err(dialect::to_engine_error(err));
        }
    }

    tracing::info!("Database tables and indexes are up to date");
    Ok(())
}

/// Collapse a DDL statement to a single line for trace logging
fn stripped(stmt: &str) -> String {
    stmt.split_whitespace().collect::<Vec<_>>().join(" ")
}
