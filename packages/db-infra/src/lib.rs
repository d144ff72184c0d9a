//! Shared database configuration and bootstrap infrastructure.
//! Used by the init CLI and the integration tests.

pub mod config;
pub mod error;
pub mod infra;

pub use config::db;
pub use error::DbInfraError;
pub use infra::db::core::{build_admin_client, orchestrate_bootstrap, orchestrate_bootstrap_internal};
pub use infra::db::mongo::MongoTarget;
