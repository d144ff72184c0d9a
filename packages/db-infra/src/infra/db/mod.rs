pub mod core;
pub mod diagnostics;
pub mod mongo;

pub use core::{build_admin_client, orchestrate_bootstrap, orchestrate_bootstrap_internal};
pub use diagnostics::bootstrap_counters;
pub use mongo::MongoTarget;
