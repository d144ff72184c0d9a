//! End-to-end provisioning against a live MongoDB.
//!
//! Run with `cargo test -p db-infra --test mongo_e2e -- --ignored` after
//! starting MongoDB with a root user. `MONGO_HOST`/`MONGO_PORT` select the
//! server; `MONGO_INITDB_ROOT_USERNAME`/`MONGO_INITDB_ROOT_PASSWORD` default to
//! `root`/`rootpw`.

use bootstrap::{BootstrapCommand, BootstrapError, ProvisionOptions, COLLECTIONS};
use db_infra::config::db::{
    BootstrapConfig, APP_PASSWORD_VAR, APP_USERNAME_VAR, DATABASE_VAR, HOST_VAR, PORT_VAR,
    ROOT_PASSWORD_VAR, ROOT_USERNAME_VAR,
};
use db_infra::{build_admin_client, orchestrate_bootstrap_internal, DbInfraError, MongoTarget};
use mongodb::bson::{doc, Document};
use mongodb::Client;
use test_support::unique_db_name;

#[ctor::ctor]
fn init_logging() {
    test_support::logging::init();
}

fn e2e_config(database: &str) -> BootstrapConfig {
    let database = database.to_string();
    BootstrapConfig::from_lookup(|name| match name {
        ROOT_USERNAME_VAR => Some(std::env::var(name).unwrap_or_else(|_| "root".to_string())),
        ROOT_PASSWORD_VAR => Some(std::env::var(name).unwrap_or_else(|_| "rootpw".to_string())),
        DATABASE_VAR => Some(database.clone()),
        APP_USERNAME_VAR => Some("apiuser".to_string()),
        APP_PASSWORD_VAR => Some("apipw".to_string()),
        HOST_VAR | PORT_VAR => std::env::var(name).ok(),
        _ => None,
    })
    .unwrap()
}

async fn cleanup(admin: &Client, database: &str) {
    let db = admin.database(database);
    let _ = db.run_command(doc! { "dropUser": "apiuser" }).await;
    let _ = db.drop().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB with a root user"]
async fn provisions_fresh_namespace_end_to_end() {
    let database = unique_db_name("sequencedb");
    let config = e2e_config(&database);
    let admin = build_admin_client(&config).await.unwrap();
    let target = MongoTarget::new(admin.clone());

    orchestrate_bootstrap_internal(
        &target,
        &config,
        BootstrapCommand::Up,
        ProvisionOptions::default(),
    )
    .await
    .unwrap();

    let mut names = admin.database(&database).list_collection_names().await.unwrap();
    names.sort();
    let mut expected: Vec<String> = COLLECTIONS.iter().map(|c| c.to_string()).collect();
    expected.sort();
    assert_eq!(names, expected);

    // Second run without --if-missing stops at createUser.
    let err = orchestrate_bootstrap_internal(
        &target,
        &config,
        BootstrapCommand::Up,
        ProvisionOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        DbInfraError::Bootstrap(BootstrapError::UserExists { .. })
    ));

    // The application user can read and write its own namespace only.
    let app = Client::with_uri_str(config.app_uri()).await.unwrap();
    for name in COLLECTIONS {
        let collection = app.database(&database).collection::<Document>(name);
        collection.insert_one(doc! { "probe": name }).await.unwrap();
        let found = collection.find_one(doc! { "probe": name }).await.unwrap();
        assert!(found.is_some(), "read back from {name}");
    }
    let other = app
        .database(&unique_db_name("elsewhere"))
        .collection::<Document>("isolates")
        .insert_one(doc! { "probe": 1 })
        .await;
    assert!(other.is_err(), "write outside the namespace must be rejected");

    cleanup(&admin, &database).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB with a root user"]
async fn wrong_root_password_is_rejected() {
    let database = unique_db_name("sequencedb");
    let mut config = e2e_config(&database);
    config.admin.password = "definitely-not-the-password".to_string();
    let target = MongoTarget::new(build_admin_client(&config).await.unwrap());

    let err = orchestrate_bootstrap_internal(
        &target,
        &config,
        BootstrapCommand::Up,
        ProvisionOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        DbInfraError::Bootstrap(BootstrapError::Authentication { .. })
    ));
}
