use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use time::{Date, PrimitiveDateTime};

use crate::db::models::{SocialLink, User};
use crate::db::types::{AccountStatus, UserRole};

const COLUMNS: &str = "\
    id, email, google_id, name, phone_number, birth_date, picture, picture_key, \
    role, status, social_links, task_ids, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub role: UserRole,
    pub status: AccountStatus,
    pub phone_number: Option<&'a str>,
    pub birth_date: Option<Date>,
    pub picture: Option<&'a str>,
    pub picture_key: Option<&'a str>,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, email, name, role, status, phone_number, birth_date,
            picture, picture_key, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email)
    .bind(params.name)
    .bind(params.role)
    .bind(params.status)
    .bind(params.phone_number)
    .bind(params.birth_date)
    .bind(params.picture)
    .bind(params.picture_key)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_role(pool: &PgPool, role: UserRole) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE role = $1 ORDER BY created_at, id"
    ))
    .bind(role)
    .fetch_all(pool)
    .await
}

pub(crate) struct UpdateProfile {
    pub name: Option<String>,
    pub social_links: Option<Vec<SocialLink>>,
    pub phone_number: Option<Option<String>>,
    pub birth_date: Option<Date>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update_profile(
    pool: &PgPool,
    id: &str,
    params: UpdateProfile,
) -> Result<Option<User>, sqlx::Error> {
    let (phone_present, phone_number) = match params.phone_number {
        Some(value) => (true, value),
        None => (false, None),
    };

    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            name = COALESCE($1, name),
            social_links = COALESCE($2, social_links),
            phone_number = CASE WHEN $3 THEN $4 ELSE phone_number END,
            birth_date = COALESCE($5, birth_date),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.social_links.map(Json))
    .bind(phone_present)
    .bind(phone_number)
    .bind(params.birth_date)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn record_login(
    pool: &PgPool,
    id: &str,
    google_id: &str,
    updated_at: PrimitiveDateTime,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET google_id = $1, status = $2, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(google_id)
    .bind(AccountStatus::Active)
    .bind(updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn set_picture(
    pool: &PgPool,
    id: &str,
    picture: &str,
    picture_key: &str,
    updated_at: PrimitiveDateTime,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET picture = $1, picture_key = $2, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(picture)
    .bind(picture_key)
    .bind(updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn append_task_ref(
    executor: &mut Transaction<'_, Postgres>,
    user_id: &str,
    task_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET task_ids = array_append(task_ids, $1::text) WHERE id = $2")
        .bind(task_id)
        .bind(user_id)
        .execute(&mut **executor)
        .await?;
    Ok(())
}

pub(crate) async fn remove_task_ref(
    executor: &mut Transaction<'_, Postgres>,
    user_id: &str,
    task_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET task_ids = array_remove(task_ids, $1::text) WHERE id = $2")
        .bind(task_id)
        .bind(user_id)
        .execute(&mut **executor)
        .await?;
    Ok(())
}

pub(crate) async fn rebuild_task_refs(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "WITH expected AS (
            SELECT u.id,
                   COALESCE(
                       array_agg(t.id::text ORDER BY t.created_at, t.id)
                           FILTER (WHERE t.id IS NOT NULL),
                       '{}'::text[]
                   ) AS task_ids
            FROM users u
            LEFT JOIN tasks t ON t.assigned_to = u.id
            GROUP BY u.id
        )
        UPDATE users SET task_ids = expected.task_ids
        FROM expected
        WHERE users.id = expected.id AND users.task_ids IS DISTINCT FROM expected.task_ids",
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
