use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Notification, NotificationWithTask};
use crate::db::types::NotificationType;

const COLUMNS: &str = "\
    id, user_id, title, message, type, is_read, related_task, created_at, updated_at";

pub(crate) struct CreateNotification<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub kind: NotificationType,
    pub related_task: Option<&'a str>,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateNotification<'_>,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications (
            id, user_id, title, message, type, is_read, related_task, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,FALSE,$6,$7,$7)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.title)
    .bind(params.message)
    .bind(params.kind)
    .bind(params.related_task)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<NotificationWithTask>, sqlx::Error> {
    sqlx::query_as::<_, NotificationWithTask>(
        "SELECT n.id, n.user_id, n.title, n.message, n.type, n.is_read, n.related_task,
                n.created_at, n.updated_at, t.name AS related_task_name
         FROM notifications n
         LEFT JOIN tasks t ON t.id = n.related_task
         WHERE n.user_id = $1
         ORDER BY n.created_at DESC, n.id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_unread(pool: &PgPool, user_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn mark_read(
    pool: &PgPool,
    id: &str,
    user_id: &str,
    updated_at: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE, updated_at = $1
         WHERE id = $2 AND user_id = $3 AND NOT is_read",
    )
    .bind(updated_at)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn mark_all_read(
    pool: &PgPool,
    user_id: &str,
    updated_at: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE, updated_at = $1
         WHERE user_id = $2 AND NOT is_read",
    )
    .bind(updated_at)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
