//! Backend bootstrap and composition
//!
//! Drives the bootstrap protocol end to end: normalize the connection
//! target, ensure the database exists, open the pooled engine with the
//! PostgreSQL dialect profile attached, provision the schema, run the
//! structural migration, and hand the composed backend to the caller.
//! Failure at any stage aborts the whole bootstrap.

use crate::config::{ConnectionTarget, PoolConfig, TlsPolicy};
use crate::db::{Engine, ensure_database, postgres_profile, provision};
use crate::error::{EngineResult, Result};

/// The composed backend handle returned to the caller.
///
/// Owned by the caller for the process lifetime; connection teardown is
/// delegated to the pool.
pub struct Backend {
    engine: Engine,
}

impl Backend {
    /// Access the underlying engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Approximate on-disk size of the store in bytes
    pub async fn size(&self) -> EngineResult<i64> {
        self.engine.size().await
    }

    /// Remove superseded and tombstoned history up to the cutoff revision
    pub async fn compact(&self, cutoff: i64) -> EngineResult<u64> {
        self.engine.compact(cutoff).await
    }

    /// Current (highest assigned) revision
    pub async fn current_revision(&self) -> EngineResult<i64> {
        self.engine.current_revision().await
    }
}

/// Bootstrap a backend from a raw connection string.
///
/// Safe to call on every process start and concurrently with other
/// processes bootstrapping against the same server: every creation step is
/// conditional in effect.
pub async fn new_backend(
    dsn: &str,
    tls: Option<TlsPolicy>,
    pool: PoolConfig,
) -> Result<Backend> {
    let target = ConnectionTarget::parse(dsn)?.normalized();
    tracing::info!(
        host = %target.host,
        database = target.database_name(),
        "bootstrapping backend"
    );

    ensure_database(&target, tls.as_ref()).await?;

    let engine = Engine::open(&target, tls.as_ref(), &pool, postgres_profile()).await?;

    {
        let client = engine.client().await?;
        provision(&client, engine.profile()).await?;
    }

    engine.migrate().await?;

    Ok(Backend { engine })
}
