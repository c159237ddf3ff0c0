//! Opening the Leasehold store.

use std::fmt;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::{SCHEMA_VERSION, run_migrations};

/// Where the store lives and the root credentials used to open it.
#[derive(Clone)]
pub struct DbConfig {
    /// WebSocket address, e.g. `127.0.0.1:8000`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A connected store whose schema is at [`SCHEMA_VERSION`].
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect, select the namespace and database, and apply pending
    /// migrations. A manager is never handed out on an outdated schema.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let db = Surreal::new::<Ws>(&config.url).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        run_migrations(&db).await?;

        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            schema_version = SCHEMA_VERSION,
            "Store ready"
        );
        Ok(Self { db })
    }

    /// A handle for building repositories; clones share the connection.
    pub fn client(&self) -> Surreal<Client> {
        self.db.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_password() {
        let config = DbConfig {
            url: "127.0.0.1:8000".into(),
            namespace: "leasehold".into(),
            database: "main".into(),
            username: "root".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("127.0.0.1:8000"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }
}
