//! Database layer
//!
//! Bootstrap stages (existence ensuring, schema provisioning) and the
//! dialect-configured engine handle they produce.

pub mod connect;
pub mod dialect;
pub mod engine;
pub mod ensure;
pub mod schema;

pub use dialect::{DialectProfile, postgres_profile};
pub use engine::Engine;
pub use ensure::ensure_database;
pub use schema::provision;
