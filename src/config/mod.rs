//! Configuration management
//!
//! Connection targets, TLS policy, pool sizing, and named backend profiles.

pub mod pool;
pub mod profiles;
pub mod target;
pub mod tls;

pub use pool::PoolConfig;
pub use profiles::{BackendProfile, find_profile, load_profiles};
pub use target::{ConnectionTarget, DEFAULT_DATABASE, SslMode};
pub use tls::TlsPolicy;
