use bootstrap::{
    run, BootstrapCommand, BootstrapError, CommandReport, ProvisionOptions, ProvisionTarget,
};
use mongodb::options::ClientOptions;
use mongodb::Client;
use tracing::{error, info};

use crate::config::db::{sanitize_db_url, BootstrapConfig};
use crate::error::DbInfraError;
use crate::infra::db::diagnostics::bootstrap_counters;
use crate::infra::db::mongo::MongoTarget;

const APP_NAME: &str = "isolate-db-init";

/// Build the administrative client. No I/O happens until the first command.
pub async fn build_admin_client(config: &BootstrapConfig) -> Result<Client, DbInfraError> {
    let uri = config.admin_uri();

    let mut options = ClientOptions::parse(&uri)
        .await
        .map_err(|e| DbInfraError::Connect {
            message: format!(
                "invalid connection string {}: {}",
                sanitize_db_url(&uri),
                e
            ),
        })?;
    options.app_name = Some(APP_NAME.to_string());

    Client::with_options(options).map_err(|e| DbInfraError::Connect {
        message: format!("failed to build MongoDB client (admin): {}", e),
    })
}

/// Load configuration from the environment, connect as the root user and run
/// `command`.
pub async fn orchestrate_bootstrap(
    command: BootstrapCommand,
    options: ProvisionOptions,
) -> Result<CommandReport, DbInfraError> {
    let config = BootstrapConfig::from_env()?;

    let client = build_admin_client(&config).await?;
    let target = MongoTarget::new(client);

    orchestrate_bootstrap_internal(&target, &config, command, options).await
}

pub async fn orchestrate_bootstrap_internal<T>(
    target: &T,
    config: &BootstrapConfig,
    command: BootstrapCommand,
    options: ProvisionOptions,
) -> Result<CommandReport, DbInfraError>
where
    T: ProvisionTarget + ?Sized,
{
    let plan = config.plan(options.targeting)?;

    info!(
        "bootstrap=start cmd={:?} db={} url={}",
        command,
        plan.database,
        sanitize_db_url(&config.admin_uri())
    );
    bootstrap_counters::run_started();

    let result = run(target, &plan, options, command).await;

    match &result {
        Ok(CommandReport::Provisioned(outcome)) => {
            bootstrap_counters::add_steps_applied(outcome.steps_applied());
            bootstrap_counters::add_steps_skipped(outcome.steps_skipped());
            let misdirected = outcome
                .indexes_applied
                .iter()
                .filter(|i| i.is_misdirected())
                .count();
            bootstrap_counters::add_misdirected_indexes(misdirected);
        }
        Ok(_) => {}
        Err(BootstrapError::Authentication { .. }) => {
            bootstrap_counters::auth_rejected();
            bootstrap_counters::bootstrap_failed();
        }
        Err(BootstrapError::PostCheck { findings }) => {
            bootstrap_counters::postcheck_mismatch();
            bootstrap_counters::bootstrap_failed();
            for finding in findings {
                error!(finding = %finding, "post-check finding");
            }
        }
        Err(_) => bootstrap_counters::bootstrap_failed(),
    }

    info!("bootstrap=done");
    bootstrap_counters::log_snapshot("bootstrap_orchestration");

    Ok(result?)
}
