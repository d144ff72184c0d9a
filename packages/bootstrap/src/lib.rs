//! Provisioning of the isolate tracking database: application user,
//! collections and indexes. Engine access goes through [`ProvisionTarget`].

mod error;
mod plan;
mod provision;
mod target;
mod verify;

pub use error::BootstrapError;
pub use plan::{
    Credential, IndexSpec, IndexTargeting, Plan, ProvisionOptions, RoleGrant, UserSpec,
    ADMIN_NAMESPACE, APP_ROLE, COLLECTIONS, LITERAL_INDEX_COLLECTION,
};
pub use provision::{provision, ProvisionOutcome};
pub use target::ProvisionTarget;
pub use verify::{status, verify, Finding, ProvisionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapCommand {
    Up,
    Status,
    Verify,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReport {
    Provisioned(ProvisionOutcome),
    Status(ProvisionStatus),
    Verified(ProvisionStatus),
}

/// Run one bootstrap command against `target`.
///
/// `Up` re-inspects the namespace after provisioning and fails when the result
/// does not match the plan. `Verify` fails when any finding remains.
pub async fn run<T>(
    target: &T,
    plan: &Plan,
    options: ProvisionOptions,
    command: BootstrapCommand,
) -> Result<CommandReport, BootstrapError>
where
    T: ProvisionTarget + ?Sized,
{
    tracing::info!(
        "▶ cmd={command:?} db={} targeting={:?} if_missing={}",
        plan.database,
        options.targeting,
        options.if_missing
    );

    let result = match command {
        BootstrapCommand::Up => {
            let outcome = provision(target, plan, options).await?;
            let snapshot = status(target, plan).await?;
            let mut findings = verify(plan, &snapshot);
            if options.if_missing && !outcome.user_created {
                // A skipped user keeps whatever grants it already had.
                findings.retain(|finding| match finding {
                    Finding::UnexpectedRoles { .. } => {
                        tracing::warn!(finding = %finding, "existing user left unchanged");
                        false
                    }
                    _ => true,
                });
            }
            if findings.is_empty() {
                Ok(CommandReport::Provisioned(outcome))
            } else {
                Err(BootstrapError::PostCheck { findings })
            }
        }
        BootstrapCommand::Status => {
            target.authenticate().await?;
            let snapshot = status(target, plan).await?;
            log_status(&snapshot);
            Ok(CommandReport::Status(snapshot))
        }
        BootstrapCommand::Verify => {
            target.authenticate().await?;
            let snapshot = status(target, plan).await?;
            let findings = verify(plan, &snapshot);
            if findings.is_empty() {
                Ok(CommandReport::Verified(snapshot))
            } else {
                Err(BootstrapError::PostCheck { findings })
            }
        }
    };

    match &result {
        Ok(_) => tracing::info!("✅ {command:?} OK for {}", plan.database),
        Err(e) => tracing::error!("❌ {command:?} failed for {}: {e}", plan.database),
    }
    result
}

fn log_status(snapshot: &ProvisionStatus) {
    match &snapshot.user_roles {
        Some(roles) => {
            let roles: Vec<String> = roles.iter().map(ToString::to_string).collect();
            tracing::info!(
                "status user={} roles=[{}]",
                snapshot.username,
                roles.join(", ")
            );
        }
        None => tracing::info!("status user={} missing=true", snapshot.username),
    }
    for name in COLLECTIONS {
        match snapshot.indexes.get(name) {
            Some(fields) => tracing::info!(
                "status collection={name} indexes=[{}]",
                fields.join(", ")
            ),
            None => tracing::info!("status collection={name} missing=true"),
        }
    }
}
