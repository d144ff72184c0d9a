use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info};

use crate::error::BootstrapError;
use crate::plan::Plan;
use crate::target::ProvisionTarget;

/// Snapshot of what currently exists for a plan's namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionStatus {
    pub database: String,
    pub username: String,
    /// `None` when the application user does not exist.
    pub user_roles: Option<Vec<crate::plan::RoleGrant>>,
    pub collections: Vec<String>,
    /// Ascending single-field indexes per existing collection.
    pub indexes: BTreeMap<String, Vec<String>>,
}

impl ProvisionStatus {
    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.iter().any(|c| c == name)
    }

    pub fn has_index(&self, collection: &str, field: &str) -> bool {
        self.indexes
            .get(collection)
            .is_some_and(|fields| fields.iter().any(|f| f == field))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    MissingUser {
        username: String,
    },
    UnexpectedRoles {
        username: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    MissingCollection {
        collection: String,
    },
    UnexpectedCollection {
        collection: String,
    },
    MissingIndex {
        collection: String,
        field: String,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingUser { username } => write!(f, "user '{username}' is missing"),
            Finding::UnexpectedRoles {
                username,
                expected,
                actual,
            } => write!(
                f,
                "user '{username}' has roles [{}], expected [{}]",
                actual.join(", "),
                expected.join(", ")
            ),
            Finding::MissingCollection { collection } => {
                write!(f, "collection '{collection}' is missing")
            }
            Finding::UnexpectedCollection { collection } => {
                write!(f, "collection '{collection}' is not part of the plan")
            }
            Finding::MissingIndex { collection, field } => {
                write!(f, "index {{{field}: 1}} on '{collection}' is missing")
            }
        }
    }
}

/// Read-only inspection of the plan's namespace.
pub async fn status<T>(target: &T, plan: &Plan) -> Result<ProvisionStatus, BootstrapError>
where
    T: ProvisionTarget + ?Sized,
{
    let db = plan.database.as_str();
    let user_roles = target.user_roles(db, plan.user.username()).await?;
    let collections = target.collection_names(db).await?;

    let mut indexes = BTreeMap::new();
    for name in &collections {
        let fields = target.ascending_index_fields(db, name).await?;
        debug!(collection = %name, fields = ?fields, "index inspection");
        indexes.insert(name.clone(), fields);
    }

    Ok(ProvisionStatus {
        database: db.to_string(),
        username: plan.user.username().to_string(),
        user_roles,
        collections,
        indexes,
    })
}

/// Compare a snapshot with the plan. An empty result means the namespace is provisioned.
pub fn verify(plan: &Plan, status: &ProvisionStatus) -> Vec<Finding> {
    let mut findings = Vec::new();

    match &status.user_roles {
        None => findings.push(Finding::MissingUser {
            username: plan.user.username().to_string(),
        }),
        Some(roles) => {
            let mut actual = roles.clone();
            actual.sort();
            let mut expected = plan.user.roles.clone();
            expected.sort();
            if actual != expected {
                findings.push(Finding::UnexpectedRoles {
                    username: plan.user.username().to_string(),
                    expected: expected.iter().map(ToString::to_string).collect(),
                    actual: actual.iter().map(ToString::to_string).collect(),
                });
            }
        }
    }

    for collection in &plan.collections {
        if !status.has_collection(collection) {
            findings.push(Finding::MissingCollection {
                collection: collection.clone(),
            });
        }
    }

    for collection in &status.collections {
        let planned = plan.collections.iter().any(|c| c == collection);
        if !planned && !collection.starts_with("system.") {
            findings.push(Finding::UnexpectedCollection {
                collection: collection.clone(),
            });
        }
    }

    for index in &plan.indexes {
        let already_reported = findings.iter().any(|f| {
            matches!(f, Finding::MissingIndex { collection, field }
                if *collection == index.collection && *field == index.field)
        });
        if !already_reported && !status.has_index(&index.collection, &index.field) {
            findings.push(Finding::MissingIndex {
                collection: index.collection.clone(),
                field: index.field.clone(),
            });
        }
    }

    info!(
        "verify=done db={} findings={}",
        plan.database,
        findings.len()
    );
    findings
}
