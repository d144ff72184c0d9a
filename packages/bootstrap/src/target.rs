use async_trait::async_trait;

use crate::error::BootstrapError;
use crate::plan::{RoleGrant, UserSpec};

/// Administrative session against the database engine.
///
/// Every operation names the namespace it acts on; implementations hold no
/// "current database" state between calls.
#[async_trait]
pub trait ProvisionTarget: Send + Sync {
    /// Bind the session to the administrative namespace. Must be called first.
    async fn authenticate(&self) -> Result<(), BootstrapError>;

    /// Grants of `username` in `database`, or `None` when the user does not exist.
    async fn user_roles(
        &self,
        database: &str,
        username: &str,
    ) -> Result<Option<Vec<RoleGrant>>, BootstrapError>;

    /// Fails with [`BootstrapError::UserExists`] when the user is already there.
    async fn create_user(&self, database: &str, user: &UserSpec) -> Result<(), BootstrapError>;

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, BootstrapError>;

    /// Fails with [`BootstrapError::CollectionExists`] when the collection is already there.
    async fn create_collection(&self, database: &str, name: &str) -> Result<(), BootstrapError>;

    /// Fields carrying a single-field ascending index on `collection`.
    async fn ascending_index_fields(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<String>, BootstrapError>;

    /// Creating an index identical to an existing one succeeds without change.
    async fn create_ascending_index(
        &self,
        database: &str,
        collection: &str,
        field: &str,
    ) -> Result<(), BootstrapError>;
}
