//! SurrealDB implementation of [`CreationRepository`].

use chrono::{DateTime, Utc};
use dreamforge_core::error::DreamforgeResult;
use dreamforge_core::models::creation::{
    CreateCreation, Creation, CreationOrder, CreationQuery, UpdateCreation,
};
use dreamforge_core::repository::CreationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct CreationRow {
    user_id: String,
    title: String,
    description: String,
    image_url: String,
    prompt: String,
    is_public: bool,
    is_contest_entry: bool,
    likes_count: u64,
    created_at: DateTime<Utc>,
}

impl CreationRow {
    fn try_into_creation(self, id: Uuid) -> Result<Creation, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Corrupt(format!("invalid user UUID: {e}")))?;
        Ok(Creation {
            id,
            user_id,
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            prompt: self.prompt,
            is_public: self.is_public,
            is_contest_entry: self.is_contest_entry,
            likes_count: self.likes_count,
            created_at: self.created_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct CreationRowWithId {
    record_id: String,
    user_id: String,
    title: String,
    description: String,
    image_url: String,
    prompt: String,
    is_public: bool,
    is_contest_entry: bool,
    likes_count: u64,
    created_at: DateTime<Utc>,
}

impl CreationRowWithId {
    fn try_into_creation(self) -> Result<Creation, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Corrupt(format!("invalid UUID: {e}")))?;
        CreationRow {
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            prompt: self.prompt,
            is_public: self.is_public,
            is_contest_entry: self.is_contest_entry,
            likes_count: self.likes_count,
            created_at: self.created_at,
        }
        .try_into_creation(id)
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn not_found(id: &str) -> DbError {
    DbError::NotFound {
        entity: "creation".into(),
        id: id.to_string(),
    }
}

/// SurrealDB implementation of the Creation repository.
#[derive(Clone)]
pub struct SurrealCreationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCreationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn like_exists(&self, creation_id: &str, user_id: &str) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM creation_like \
                 WHERE creation_id = $creation_id AND user_id = $user_id \
                 GROUP ALL",
            )
            .bind(("creation_id", creation_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }
}

impl<C: Connection> CreationRepository for SurrealCreationRepository<C> {
    async fn create(&self, input: CreateCreation) -> DreamforgeResult<Creation> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('creation', $id) SET \
                 user_id = $user_id, \
                 title = $title, \
                 description = $description, \
                 image_url = $image_url, \
                 prompt = $prompt, \
                 is_public = $is_public, \
                 created_at = $created_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("title", input.title))
            .bind(("description", input.description))
            .bind(("image_url", input.image_url))
            .bind(("prompt", input.prompt))
            .bind(("is_public", input.is_public))
            .bind(("created_at", input.created_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CreationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(&id_str))?;

        Ok(row.try_into_creation(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> DreamforgeResult<Creation> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('creation', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CreationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(&id_str))?;

        Ok(row.try_into_creation(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateCreation) -> DreamforgeResult<Creation> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.is_public.is_some() {
            sets.push("is_public = $is_public");
        }
        if input.is_contest_entry.is_some() {
            sets.push("is_contest_entry = $is_contest_entry");
        }
        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        // `WHERE id` keeps UPDATE from creating a missing record.
        let query = format!(
            "UPDATE type::record('creation', $id) SET {} WHERE id",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(is_public) = input.is_public {
            builder = builder.bind(("is_public", is_public));
        }
        if let Some(is_contest_entry) = input.is_contest_entry {
            builder = builder.bind(("is_contest_entry", is_contest_entry));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CreationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(&id_str))?;

        Ok(row.try_into_creation(id)?)
    }

    async fn delete(&self, id: Uuid) -> DreamforgeResult<()> {
        let id_str = id.to_string();

        self.db
            .query(
                "DELETE type::record('creation', $id); \
                 DELETE creation_like WHERE creation_id = $id",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn query(&self, query: CreationQuery) -> DreamforgeResult<Vec<Creation>> {
        let mut conditions = Vec::new();
        if query.filter.owner.is_some() {
            conditions.push("user_id = $owner");
        }
        if query.filter.public_only {
            conditions.push("is_public = true");
        }
        if query.filter.contest_only {
            conditions.push("is_contest_entry = true");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let order_clause = match query.order {
            CreationOrder::Newest => "ORDER BY created_at DESC",
            CreationOrder::MostLiked => "ORDER BY likes_count DESC, created_at DESC",
        };

        let sql = format!(
            "SELECT meta::id(id) AS record_id, * FROM creation \
             {where_clause} {order_clause} LIMIT $limit"
        );

        let mut builder = self.db.query(&sql).bind(("limit", query.limit));
        if let Some(owner) = query.filter.owner {
            builder = builder.bind(("owner", owner.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<CreationRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_creation())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn record_like(&self, creation_id: Uuid, user_id: Uuid) -> DreamforgeResult<Creation> {
        // Fails with NotFound before any like is written.
        self.get_by_id(creation_id).await?;

        let creation_str = creation_id.to_string();
        let user_str = user_id.to_string();

        if self.like_exists(&creation_str, &user_str).await? {
            return Err(DbError::AlreadyExists {
                entity: "creation_like".into(),
            }
            .into());
        }

        let result = self
            .db
            .query(
                "CREATE creation_like SET creation_id = $creation_id, user_id = $user_id; \
                 UPDATE type::record('creation', $creation_id) \
                 SET likes_count += 1 WHERE id",
            )
            .bind(("creation_id", creation_str.clone()))
            .bind(("user_id", user_str))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| {
            // A concurrent like can still trip the unique index.
            let message = e.to_string();
            if message.contains("already contains") {
                DbError::AlreadyExists {
                    entity: "creation_like".into(),
                }
            } else {
                DbError::Query(message)
            }
        })?;

        let rows: Vec<CreationRow> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| not_found(&creation_str))?;

        Ok(row.try_into_creation(creation_id)?)
    }
}
