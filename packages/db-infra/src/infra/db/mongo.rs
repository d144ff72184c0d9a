use async_trait::async_trait;
use bootstrap::{BootstrapError, ProvisionTarget, RoleGrant, UserSpec, ADMIN_NAMESPACE};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::{Client, IndexModel};
use serde::Deserialize;
use tracing::debug;

/// Server code for `createUser` on an existing user.
const USER_EXISTS_CODE: i32 = 51003;
/// Server code `NamespaceExists`.
const NAMESPACE_EXISTS_CODE: i32 = 48;

/// [`ProvisionTarget`] backed by a MongoDB client authenticated as the root user.
#[derive(Clone)]
pub struct MongoTarget {
    client: Client,
}

impl MongoTarget {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[derive(Debug, Deserialize)]
struct UsersInfo {
    users: Vec<UserInfo>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    roles: Vec<RoleInfo>,
}

#[derive(Debug, Deserialize)]
struct RoleInfo {
    role: String,
    db: String,
}

fn command_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        _ => None,
    }
}

fn engine_error(op: &'static str, err: MongoError) -> BootstrapError {
    BootstrapError::engine(op, err.to_string())
}

fn is_ascending(value: &Bson) -> bool {
    match value {
        Bson::Int32(v) => *v == 1,
        Bson::Int64(v) => *v == 1,
        Bson::Double(v) => *v == 1.0,
        _ => false,
    }
}

/// Fields of single-key indexes whose only key is ascending.
fn ascending_fields(models: &[IndexModel]) -> Vec<String> {
    models
        .iter()
        .filter(|m| m.keys.len() == 1)
        .filter_map(|m| m.keys.iter().next())
        .filter(|(_, direction)| is_ascending(direction))
        .map(|(field, _)| field.clone())
        .collect()
}

#[async_trait]
impl ProvisionTarget for MongoTarget {
    async fn authenticate(&self) -> Result<(), BootstrapError> {
        // The driver authenticates lazily; the first command forces the handshake.
        self.client
            .database(ADMIN_NAMESPACE)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| match e.kind.as_ref() {
                ErrorKind::Authentication { message, .. } => BootstrapError::Authentication {
                    namespace: ADMIN_NAMESPACE.to_string(),
                    message: message.clone(),
                },
                _ => engine_error("ping", e),
            })?;
        Ok(())
    }

    async fn user_roles(
        &self,
        database: &str,
        username: &str,
    ) -> Result<Option<Vec<RoleGrant>>, BootstrapError> {
        let reply = self
            .client
            .database(database)
            .run_command(doc! { "usersInfo": username })
            .await
            .map_err(|e| engine_error("usersInfo", e))?;
        let info: UsersInfo = mongodb::bson::from_document(reply)
            .map_err(|e| BootstrapError::engine("usersInfo", e.to_string()))?;

        Ok(info.users.into_iter().next().map(|user| {
            user.roles
                .into_iter()
                .map(|r| RoleGrant::new(r.role, r.db))
                .collect()
        }))
    }

    async fn create_user(&self, database: &str, user: &UserSpec) -> Result<(), BootstrapError> {
        let roles: Vec<Document> = user
            .roles
            .iter()
            .map(|grant| doc! { "role": grant.role.as_str(), "db": grant.db.as_str() })
            .collect();

        self.client
            .database(database)
            .run_command(doc! {
                "createUser": user.username(),
                "pwd": user.credential.password.as_str(),
                "roles": roles,
            })
            .await
            .map_err(|e| match command_code(&e) {
                Some(USER_EXISTS_CODE) => BootstrapError::UserExists {
                    username: user.username().to_string(),
                    database: database.to_string(),
                },
                _ => engine_error("createUser", e),
            })?;
        Ok(())
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, BootstrapError> {
        self.client
            .database(database)
            .list_collection_names()
            .await
            .map_err(|e| engine_error("listCollections", e))
    }

    async fn create_collection(&self, database: &str, name: &str) -> Result<(), BootstrapError> {
        self.client
            .database(database)
            .create_collection(name)
            .await
            .map_err(|e| match command_code(&e) {
                Some(NAMESPACE_EXISTS_CODE) => BootstrapError::CollectionExists {
                    database: database.to_string(),
                    collection: name.to_string(),
                },
                _ => engine_error("create", e),
            })
    }

    async fn ascending_index_fields(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<String>, BootstrapError> {
        let models: Vec<IndexModel> = self
            .client
            .database(database)
            .collection::<Document>(collection)
            .list_indexes()
            .await
            .map_err(|e| engine_error("listIndexes", e))?
            .try_collect()
            .await
            .map_err(|e| engine_error("listIndexes", e))?;
        Ok(ascending_fields(&models))
    }

    async fn create_ascending_index(
        &self,
        database: &str,
        collection: &str,
        field: &str,
    ) -> Result<(), BootstrapError> {
        let mut keys = Document::new();
        keys.insert(field, 1);
        let model = IndexModel::builder().keys(keys).build();
        let created = self
            .client
            .database(database)
            .collection::<Document>(collection)
            .create_index(model)
            .await
            .map_err(|e| engine_error("createIndexes", e))?;
        debug!(index = %created.index_name, collection = %collection, "index ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(keys: Document) -> IndexModel {
        IndexModel::builder().keys(keys).build()
    }

    #[test]
    fn test_only_single_ascending_keys_count() {
        let models = vec![
            model(doc! { "_id": 1 }),
            model(doc! { "isolate_id": 1i64 }),
            model(doc! { "cluster_id": -1 }),
            model(doc! { "run_metadata.run_name": 1.0 }),
            model(doc! { "a": 1, "b": 1 }),
            model(doc! { "notes": "text" }),
        ];

        assert_eq!(
            ascending_fields(&models),
            ["_id", "isolate_id", "run_metadata.run_name"]
        );
    }

    #[test]
    fn test_users_info_reply_parses_roles() {
        let reply = doc! {
            "users": [{
                "_id": "sequencedb.apiuser",
                "user": "apiuser",
                "db": "sequencedb",
                "roles": [{ "role": "readWrite", "db": "sequencedb" }],
            }],
            "ok": 1.0,
        };

        let info: UsersInfo = mongodb::bson::from_document(reply).unwrap();
        assert_eq!(info.users.len(), 1);
        assert_eq!(info.users[0].roles[0].role, "readWrite");
        assert_eq!(info.users[0].roles[0].db, "sequencedb");
    }
}
