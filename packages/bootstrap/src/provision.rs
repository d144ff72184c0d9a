use tracing::{info, warn};

use crate::error::BootstrapError;
use crate::plan::{IndexSpec, Plan, ProvisionOptions, ADMIN_NAMESPACE};
use crate::target::ProvisionTarget;

/// What a provisioning run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub user_created: bool,
    pub collections_created: Vec<String>,
    pub collections_skipped: Vec<String>,
    pub indexes_applied: Vec<IndexSpec>,
}

impl ProvisionOutcome {
    pub fn steps_applied(&self) -> usize {
        usize::from(self.user_created) + self.collections_created.len() + self.indexes_applied.len()
    }

    pub fn steps_skipped(&self) -> usize {
        usize::from(!self.user_created) + self.collections_skipped.len()
    }
}

/// Provision the plan's namespace: authenticate, create the application user,
/// create every collection, then every index.
///
/// Each call is issued once; the first failure aborts the rest of the sequence
/// and nothing already created is rolled back.
pub async fn provision<T>(
    target: &T,
    plan: &Plan,
    options: ProvisionOptions,
) -> Result<ProvisionOutcome, BootstrapError>
where
    T: ProvisionTarget + ?Sized,
{
    let db = plan.database.as_str();
    let mut outcome = ProvisionOutcome::default();

    info!("step=authenticate namespace={ADMIN_NAMESPACE}");
    target.authenticate().await?;

    info!("step=select_database db={db}");

    let username = plan.user.username();
    let existing_roles = if options.if_missing {
        target.user_roles(db, username).await?
    } else {
        None
    };
    match existing_roles {
        Some(roles) => {
            if roles != plan.user.roles {
                warn!(
                    user = %username,
                    db = %db,
                    roles = ?roles,
                    "existing user has different grants; leaving unchanged"
                );
            }
            info!("step=create_user user={username} db={db} skipped=exists");
        }
        None => {
            info!("step=create_user user={username} db={db}");
            target.create_user(db, &plan.user).await?;
            outcome.user_created = true;
        }
    }

    let existing_collections = if options.if_missing {
        target.collection_names(db).await?
    } else {
        Vec::new()
    };
    for name in &plan.collections {
        if existing_collections.contains(name) {
            info!("step=create_collection collection={name} skipped=exists");
            outcome.collections_skipped.push(name.clone());
            continue;
        }
        info!("step=create_collection collection={name}");
        target.create_collection(db, name).await?;
        outcome.collections_created.push(name.clone());
    }

    for index in &plan.indexes {
        if index.is_misdirected() {
            warn!(
                collection = %index.collection,
                field = %index.field,
                declared_for = %index.declared_for,
                "index created on '{}' although its step belongs to '{}'",
                index.collection,
                index.declared_for
            );
        }
        info!("step=create_index index={index}");
        target
            .create_ascending_index(db, &index.collection, &index.field)
            .await?;
        outcome.indexes_applied.push(index.clone());
    }

    info!(
        "provision=done db={db} applied={} skipped={}",
        outcome.steps_applied(),
        outcome.steps_skipped()
    );
    Ok(outcome)
}
