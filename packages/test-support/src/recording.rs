//! In-memory [`ProvisionTarget`] that behaves like the engine for the calls
//! the bootstrap issues and records every call it receives.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bootstrap::{BootstrapError, ProvisionTarget, RoleGrant, UserSpec, ADMIN_NAMESPACE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Authenticate,
    UserRoles { db: String, user: String },
    CreateUser { db: String, user: String },
    CollectionNames { db: String },
    CreateCollection { db: String, name: String },
    IndexFields { db: String, collection: String },
    CreateIndex { db: String, collection: String, field: String },
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::CreateUser { .. } | Call::CreateCollection { .. } | Call::CreateIndex { .. }
        )
    }
}

#[derive(Default)]
struct Engine {
    reject_auth: bool,
    fail_on: Option<&'static str>,
    users: BTreeMap<(String, String), Vec<RoleGrant>>,
    collections: BTreeMap<String, Vec<String>>,
    indexes: BTreeMap<(String, String), Vec<String>>,
    calls: Vec<Call>,
}

impl Engine {
    fn ensure_collection(&mut self, db: &str, name: &str) {
        let names = self.collections.entry(db.to_string()).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
            self.indexes
                .insert((db.to_string(), name.to_string()), vec!["_id".to_string()]);
        }
    }

    fn injected(&self, op: &'static str) -> Result<(), BootstrapError> {
        match self.fail_on {
            Some(failing) if failing == op => {
                Err(BootstrapError::engine(op, "injected failure"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct RecordingTarget {
    engine: Mutex<Engine>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authentication attempts fail as if the admin credential were wrong.
    pub fn rejecting_auth(self) -> Self {
        self.lock().reject_auth = true;
        self
    }

    /// Fail the engine operation named `op` (`createUser`, `create`, `createIndexes`).
    pub fn failing_on(self, op: &'static str) -> Self {
        self.lock().fail_on = Some(op);
        self
    }

    pub fn with_user(self, db: &str, user: &str, roles: Vec<RoleGrant>) -> Self {
        self.lock()
            .users
            .insert((db.to_string(), user.to_string()), roles);
        self
    }

    pub fn with_collection(self, db: &str, name: &str) -> Self {
        self.lock().ensure_collection(db, name);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn user(&self, db: &str, user: &str) -> Option<Vec<RoleGrant>> {
        self.lock()
            .users
            .get(&(db.to_string(), user.to_string()))
            .cloned()
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn collections(&self, db: &str) -> Vec<String> {
        self.lock().collections.get(db).cloned().unwrap_or_default()
    }

    pub fn index_fields(&self, db: &str, collection: &str) -> Vec<String> {
        self.lock()
            .indexes
            .get(&(db.to_string(), collection.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().expect("recording target poisoned")
    }
}

#[async_trait]
impl ProvisionTarget for RecordingTarget {
    async fn authenticate(&self) -> Result<(), BootstrapError> {
        let mut engine = self.lock();
        engine.calls.push(Call::Authenticate);
        if engine.reject_auth {
            return Err(BootstrapError::Authentication {
                namespace: ADMIN_NAMESPACE.to_string(),
                message: "Authentication failed.".to_string(),
            });
        }
        Ok(())
    }

    async fn user_roles(
        &self,
        database: &str,
        username: &str,
    ) -> Result<Option<Vec<RoleGrant>>, BootstrapError> {
        let mut engine = self.lock();
        engine.calls.push(Call::UserRoles {
            db: database.to_string(),
            user: username.to_string(),
        });
        Ok(engine
            .users
            .get(&(database.to_string(), username.to_string()))
            .cloned())
    }

    async fn create_user(&self, database: &str, user: &UserSpec) -> Result<(), BootstrapError> {
        let mut engine = self.lock();
        engine.calls.push(Call::CreateUser {
            db: database.to_string(),
            user: user.username().to_string(),
        });
        engine.injected("createUser")?;

        let key = (database.to_string(), user.username().to_string());
        if engine.users.contains_key(&key) {
            return Err(BootstrapError::UserExists {
                username: key.1,
                database: key.0,
            });
        }
        engine.users.insert(key, user.roles.clone());
        Ok(())
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, BootstrapError> {
        let mut engine = self.lock();
        engine.calls.push(Call::CollectionNames {
            db: database.to_string(),
        });
        Ok(engine.collections.get(database).cloned().unwrap_or_default())
    }

    async fn create_collection(&self, database: &str, name: &str) -> Result<(), BootstrapError> {
        let mut engine = self.lock();
        engine.calls.push(Call::CreateCollection {
            db: database.to_string(),
            name: name.to_string(),
        });
        engine.injected("create")?;

        let exists = engine
            .collections
            .get(database)
            .is_some_and(|names| names.iter().any(|n| n == name));
        if exists {
            return Err(BootstrapError::CollectionExists {
                database: database.to_string(),
                collection: name.to_string(),
            });
        }
        engine.ensure_collection(database, name);
        Ok(())
    }

    async fn ascending_index_fields(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<String>, BootstrapError> {
        let mut engine = self.lock();
        engine.calls.push(Call::IndexFields {
            db: database.to_string(),
            collection: collection.to_string(),
        });
        Ok(engine
            .indexes
            .get(&(database.to_string(), collection.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_ascending_index(
        &self,
        database: &str,
        collection: &str,
        field: &str,
    ) -> Result<(), BootstrapError> {
        let mut engine = self.lock();
        engine.calls.push(Call::CreateIndex {
            db: database.to_string(),
            collection: collection.to_string(),
            field: field.to_string(),
        });
        engine.injected("createIndexes")?;

        // Indexing a missing collection creates it, as the engine does.
        engine.ensure_collection(database, collection);
        let fields = engine
            .indexes
            .entry((database.to_string(), collection.to_string()))
            .or_default();
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
        Ok(())
    }
}
