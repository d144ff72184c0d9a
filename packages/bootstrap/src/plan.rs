//! Declarative description of what a bootstrap run provisions.

use std::fmt;

use crate::error::BootstrapError;

/// Namespace the administrative credential authenticates against.
pub const ADMIN_NAMESPACE: &str = "admin";

/// Role granted to the application user on the target namespace.
pub const APP_ROLE: &str = "readWrite";

/// Collections created on every run, in creation order.
pub const COLLECTIONS: [&str; 4] = ["isolates", "clusters", "runs", "sequences"];

/// Collection every index lands on under [`IndexTargeting::Literal`].
pub const LITERAL_INDEX_COLLECTION: &str = "isolates";

/// One index step per collection: (owning collection, indexed field).
const INDEX_STEPS: [(&str, &str); 4] = [
    ("isolates", "isolate_id"),
    ("clusters", "cluster_id"),
    ("runs", "run_metadata.run_name"),
    ("sequences", "isolate_id"),
];

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoleGrant {
    pub role: String,
    pub db: String,
}

impl RoleGrant {
    pub fn new(role: impl Into<String>, db: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            db: db.into(),
        }
    }
}

impl fmt::Display for RoleGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.role, self.db)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSpec {
    pub credential: Credential,
    pub roles: Vec<RoleGrant>,
}

impl UserSpec {
    pub fn username(&self) -> &str {
        &self.credential.username
    }
}

/// A single-field ascending index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Collection the index is created on.
    pub collection: String,
    pub field: String,
    /// Collection whose step declared this index.
    pub declared_for: String,
}

impl IndexSpec {
    pub fn is_misdirected(&self) -> bool {
        self.collection != self.declared_for
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{{{}: 1}}", self.collection, self.field)
    }
}

/// Where index steps put their indexes.
///
/// `Literal` reproduces the historical init script, which created every index
/// on `isolates` regardless of the step it appeared in. `Intended` places each
/// index on the collection of its own step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexTargeting {
    #[default]
    Literal,
    Intended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionOptions {
    pub targeting: IndexTargeting,
    /// Skip users and collections that already exist instead of failing.
    pub if_missing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub database: String,
    pub user: UserSpec,
    pub collections: Vec<String>,
    pub indexes: Vec<IndexSpec>,
}

impl Plan {
    /// Build the plan for `database`, rejecting empty names and passwords so a
    /// malformed request never reaches the engine.
    pub fn new(
        database: &str,
        app: Credential,
        targeting: IndexTargeting,
    ) -> Result<Self, BootstrapError> {
        if database.trim().is_empty() {
            return Err(BootstrapError::invalid_plan("target database name is empty"));
        }
        if app.username.trim().is_empty() {
            return Err(BootstrapError::invalid_plan(
                "application username is empty",
            ));
        }
        if app.password.is_empty() {
            return Err(BootstrapError::invalid_plan(
                "application password is empty",
            ));
        }

        let user = UserSpec {
            credential: app,
            roles: vec![RoleGrant::new(APP_ROLE, database)],
        };

        let indexes = INDEX_STEPS
            .iter()
            .map(|(owner, field)| IndexSpec {
                collection: match targeting {
                    IndexTargeting::Literal => LITERAL_INDEX_COLLECTION.to_string(),
                    IndexTargeting::Intended => owner.to_string(),
                },
                field: field.to_string(),
                declared_for: owner.to_string(),
            })
            .collect();

        Ok(Self {
            database: database.to_string(),
            user,
            collections: COLLECTIONS.iter().map(|c| c.to_string()).collect(),
            indexes,
        })
    }

    pub fn misdirected_indexes(&self) -> impl Iterator<Item = &IndexSpec> {
        self.indexes.iter().filter(|i| i.is_misdirected())
    }
}
