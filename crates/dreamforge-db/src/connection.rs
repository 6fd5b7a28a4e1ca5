//! Opening the creation store.
//!
//! Both entry points end in [`prepare`], so a WebSocket server and the
//! in-memory engine come up with the same namespace selection and schema.

use serde::Deserialize;
use surrealdb::engine::local::{Db, Mem};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tracing::{debug, info};

use crate::error::DbError;
use crate::repository::SurrealCreationRepository;
use crate::schema::run_migrations;

/// Where creations are stored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// WebSocket address (default: `127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root user. Empty skips sign-in, for servers started unauthenticated.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "dreamforge".into(),
            database: "creations".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Select `namespace`/`database` on `db` and apply pending migrations.
pub async fn prepare<C: Connection>(
    db: &Surreal<C>,
    namespace: &str,
    database: &str,
) -> Result<(), DbError> {
    db.use_ns(namespace).use_db(database).await?;
    run_migrations(db).await?;
    debug!(namespace, database, "Creation store ready");
    Ok(())
}

/// Connect to the configured server and return a ready store.
pub async fn open(config: &DbConfig) -> Result<SurrealCreationRepository<Client>, DbError> {
    info!(url = %config.url, namespace = %config.namespace, "Opening creation store");

    let db = Surreal::new::<Ws>(config.url.as_str()).await?;
    if !config.username.is_empty() {
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
    }
    prepare(&db, &config.namespace, &config.database).await?;
    Ok(SurrealCreationRepository::new(db))
}

/// A fresh store held only in memory.
pub async fn open_in_memory(namespace: &str) -> Result<SurrealCreationRepository<Db>, DbError> {
    let db = Surreal::new::<Mem>(()).await?;
    prepare(&db, namespace, "creations").await?;
    Ok(SurrealCreationRepository::new(db))
}
