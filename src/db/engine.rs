//! Generic engine handle
//!
//! The pooled query surface the log-structured layer talks to. The engine
//! itself is dialect-agnostic: everything PostgreSQL-specific arrives through
//! the [`DialectProfile`] attached at open time.

use crate::config::tls::effective_policy;
use crate::config::{ConnectionTarget, PoolConfig, TlsPolicy};
use crate::db::dialect::{COMPACT_REV_KEY, DialectProfile, to_engine_error};
use crate::error::{EngineError, EngineResult};
use deadpool_postgres::{Client as PooledClient, Manager, ManagerConfig, Pool, RecyclingMethod};

const INSERT_SQL: &str = "\
INSERT INTO kine (name, created, deleted, create_revision, prev_revision, lease, value, old_value)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

const LAST_ID_SQL: &str = "SELECT lastval()";

const CURRENT_REVISION_SQL: &str = "SELECT COALESCE(MAX(id), 0) FROM kine";

const MIGRATE_COUNT_SQL: &str = "SELECT COUNT(*) FROM kine WHERE name != $1";

const LEGACY_TABLE_SQL: &str = "SELECT to_regclass('key_value')::text";

const MIGRATE_COPY_SQL: &str = "\
INSERT INTO kine (name, created, deleted, create_revision, prev_revision, lease, value, old_value)
SELECT name, 1, 0, 0, 0, 0, value, value FROM key_value";

/// Pooled engine handle with its dialect profile attached
pub struct Engine {
    pool: Pool,
    profile: DialectProfile,
}

impl Engine {
    /// Open the pooled engine against a normalized target.
    ///
    /// Connections are opened lazily; a bad target surfaces on first use,
    /// not here.
    pub async fn open(
        target: &ConnectionTarget,
        tls: Option<&TlsPolicy>,
        pool_config: &PoolConfig,
        profile: DialectProfile,
    ) -> EngineResult<Self> {
        let pg_config = target.to_pg_config();
        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match effective_policy(target.ssl_mode, tls) {
            None => Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config),
            Some(policy) => Manager::from_config(pg_config, policy.make_connector()?, mgr_config),
        };

        let pool = Pool::builder(manager)
            .max_size(pool_config.max_open)
            .build()
            .map_err(|e| EngineError::Pool(e.to_string()))?;

        tracing::debug!(
            max_open = pool_config.max_open,
            max_idle = pool_config.max_idle,
            max_lifetime_secs = pool_config.max_lifetime_secs,
            "opened connection pool"
        );

        Ok(Self { pool, profile })
    }

    /// The dialect profile attached at open time
    pub fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    /// Check out a pooled connection
    pub async fn client(&self) -> EngineResult<PooledClient> {
        self.pool
            .get()
            .await
            .map_err(|e| EngineError::Pool(e.to_string()))
    }

    /// Append one revision row and return the database-assigned identifier.
    ///
    /// Unique-constraint conflicts on `(name, prev_revision)` come back as
    /// the canonical `KeyExists` via the dialect's error translator.
    #[allow(clippy::too_many_arguments)]
    pub async fn append(
        &self,
        name: &str,
        created: i64,
        deleted: i64,
        create_revision: i64,
        prev_revision: i64,
        lease: i64,
        value: &[u8],
        old_value: &[u8],
    ) -> EngineResult<i64> {
        let client = self.client().await?;
        let params: [&(dyn tokio_postgres::types::ToSql + Sync); 8] = [
            &name,
            &created,
            &deleted,
            &create_revision,
            &prev_revision,
            &lease,
            &value,
            &old_value,
        ];

        if self.profile.auto_increment_id {
            let sql = format!("{} RETURNING id", INSERT_SQL);
            let row = client
                .query_one(sql.as_str(), &params)
                .await
                .map_err(self.profile.translate_err)?;
            Ok(row.get(0))
        } else {
            client
                .execute(INSERT_SQL, &params)
                .await
                .map_err(self.profile.translate_err)?;
            let row = client
                .query_one(LAST_ID_SQL, &[])
                .await
                .map_err(to_engine_error)?;
            Ok(row.get(0))
        }
    }

    /// Highest identifier assigned so far (0 on an empty table)
    pub async fn current_revision(&self) -> EngineResult<i64> {
        let client = self.client().await?;
        let row = client
            .query_one(CURRENT_REVISION_SQL, &[])
            .await
            .map_err(to_engine_error)?;
        Ok(row.get(0))
    }

    /// Approximate on-disk size of the key-value table in bytes
    pub async fn size(&self) -> EngineResult<i64> {
        let client = self.client().await?;
        let row = client
            .query_one(self.profile.size_sql, &[])
            .await
            .map_err(to_engine_error)?;
        Ok(row.get(0))
    }

    /// Delete superseded and tombstoned history rows up to the cutoff.
    ///
    /// Returns the number of rows removed.
    pub async fn compact(&self, cutoff: i64) -> EngineResult<u64> {
        let client = self.client().await?;
        let removed = client
            .execute(self.profile.compact_sql, &[&cutoff, &cutoff])
            .await
            .map_err(to_engine_error)?;
        tracing::debug!(cutoff, removed, "compacted history rows");
        Ok(removed)
    }

    /// Structural migration from the legacy `key_value` table.
    ///
    /// Runs only when kine holds no user rows; otherwise a no-op. Legacy
    /// rows are copied in as initial revisions.
    pub async fn migrate(&self) -> EngineResult<()> {
        let client = self.client().await?;

        let row = client
            .query_one(MIGRATE_COUNT_SQL, &[&COMPACT_REV_KEY])
            .await
            .map_err(to_engine_error)?;
        let count: i64 = row.get(0);
        if count > 0 {
            return Ok(());
        }

        let row = client
            .query_one(LEGACY_TABLE_SQL, &[])
            .await
            .map_err(to_engine_error)?;
        let legacy: Option<String> = row.get(0);
        if legacy.is_none() {
            tracing::debug!("no legacy key_value table, skipping migration");
            return Ok(());
        }

        tracing::info!("Migrating content from old table");
        let migrated = client
            .execute(MIGRATE_COPY_SQL, &[])
            .await
            .map_err(to_engine_error)?;
        tracing::info!(rows = migrated, "migrated legacy rows");
        Ok(())
    }
}
