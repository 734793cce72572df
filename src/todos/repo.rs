use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::TaskStatus;

/// Task record in the database. `user_id` is set on insert and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: OffsetDateTime,
}

impl Task {
    /// Create a task owned by `user_id`; status defaults to "To Do".
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> sqlx::Result<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, description, status, created_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(description)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Task>> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// One page of the owner's tasks in creation order.
    pub async fn list_page(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> sqlx::Result<Vec<Task>> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, created_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn count_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await
    }

    /// Partial update: fields left as None keep their stored value. Returns
    /// None if the row vanished since it was looked up.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        status: Option<TaskStatus>,
    ) -> sqlx::Result<Option<Task>> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title       = COALESCE($2, title),
                description = COALESCE($3, description),
                status      = COALESCE($4, status)
            WHERE id = $1
            RETURNING id, user_id, title, description, status, created_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(status.map(|s| s.as_str()))
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
