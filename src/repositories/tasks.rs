use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Task;
use crate::db::types::{TaskCategory, TaskStatus};
use crate::repositories::users;

const COLUMNS: &str = "\
    id, name, instructions, deadline, category, assigned_to, status, \
    proof_url, proof_key, created_at, updated_at";

pub(crate) struct CreateTask<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub instructions: &'a str,
    pub deadline: PrimitiveDateTime,
    pub category: TaskCategory,
    pub assigned_to: &'a str,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateTask<'_>) -> Result<Task, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (
            id, name, instructions, deadline, category, assigned_to, status,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.instructions)
    .bind(params.deadline)
    .bind(params.category)
    .bind(params.assigned_to)
    .bind(TaskStatus::Pending)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    users::append_task_ref(&mut tx, params.assigned_to, &task.id).await?;

    tx.commit().await?;
    Ok(task)
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!("SELECT {COLUMNS} FROM tasks WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_for_account(
    pool: &PgPool,
    account_id: &str,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {COLUMNS} FROM tasks WHERE assigned_to = $1 ORDER BY created_at, id"
    ))
    .bind(account_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_account_between(
    pool: &PgPool,
    account_id: &str,
    from: PrimitiveDateTime,
    to: PrimitiveDateTime,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {COLUMNS} FROM tasks
         WHERE assigned_to = $1 AND deadline >= $2 AND deadline < $3
         ORDER BY deadline, created_at, id"
    ))
    .bind(account_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

pub(crate) async fn set_status(
    pool: &PgPool,
    id: &str,
    status: TaskStatus,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET status = $1, updated_at = $2 WHERE id = $3 RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn set_proof(
    pool: &PgPool,
    id: &str,
    proof_url: &str,
    proof_key: &str,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET proof_url = $1, proof_key = $2, status = $3, updated_at = $4
         WHERE id = $5 AND status <> $6
         RETURNING {COLUMNS}"
    ))
    .bind(proof_url)
    .bind(proof_key)
    .bind(TaskStatus::Submitted)
    .bind(updated_at)
    .bind(id)
    .bind(TaskStatus::Completed)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn clear_proof(
    pool: &PgPool,
    id: &str,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET proof_url = NULL, proof_key = NULL, status = $1, updated_at = $2
         WHERE id = $3 AND status <> $4
         RETURNING {COLUMNS}"
    ))
    .bind(TaskStatus::Pending)
    .bind(updated_at)
    .bind(id)
    .bind(TaskStatus::Completed)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn mark_overdue_due(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tasks SET status = $1, updated_at = $2
         WHERE deadline < $2 AND status NOT IN ($3, $1)",
    )
    .bind(TaskStatus::Due)
    .bind(now)
    .bind(TaskStatus::Completed)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn list_completed_past_deadline(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {COLUMNS} FROM tasks WHERE deadline < $1 AND status = $2 ORDER BY deadline, id"
    ))
    .bind(now)
    .bind(TaskStatus::Completed)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete_completed(pool: &PgPool, task: &Task) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1 AND status = $2")
        .bind(&task.id)
        .bind(TaskStatus::Completed)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    users::remove_task_ref(&mut tx, &task.assigned_to, &task.id).await?;
    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use crate::core::time::primitive_now_utc;
    use crate::db::types::{TaskStatus, UserRole};
    use crate::repositories::tasks;
    use crate::test_support;

    #[tokio::test]
    async fn attaching_and_removing_proof_are_inverse() {
        let ctx = test_support::setup_test_context().await;
        let pool = ctx.state.db();
        let student =
            test_support::insert_account(pool, "s@example.com", UserRole::Student).await;
        let deadline = primitive_now_utc() + Duration::days(2);
        let task = test_support::insert_task(pool, &student.id, "Essay 1", deadline).await;

        let submitted = tasks::set_proof(
            pool,
            &task.id,
            "https://assets.example.com/task_proofs/a.png",
            "task_proofs/a.png",
            primitive_now_utc(),
        )
        .await
        .expect("set proof")
        .expect("task");
        assert_eq!(submitted.status, TaskStatus::Submitted);
        assert!(submitted.proof_url.as_deref().is_some_and(|url| !url.is_empty()));

        let cleared = tasks::clear_proof(pool, &task.id, primitive_now_utc())
            .await
            .expect("clear proof")
            .expect("task");
        assert_eq!(cleared.status, TaskStatus::Pending);
        assert_eq!(cleared.proof_url, None);
        assert_eq!(cleared.proof_key, None);
    }

    #[tokio::test]
    async fn completed_task_keeps_its_proof() {
        let ctx = test_support::setup_test_context().await;
        let pool = ctx.state.db();
        let student =
            test_support::insert_account(pool, "s@example.com", UserRole::Student).await;
        let deadline = primitive_now_utc() + Duration::days(2);
        let task = test_support::insert_task(pool, &student.id, "Essay 1", deadline).await;

        tasks::set_proof(pool, &task.id, "https://a/1.png", "task_proofs/1.png", primitive_now_utc())
            .await
            .expect("set proof")
            .expect("task");
        tasks::set_status(pool, &task.id, TaskStatus::Completed, primitive_now_utc())
            .await
            .expect("complete")
            .expect("task");

        let replaced =
            tasks::set_proof(pool, &task.id, "https://a/2.png", "task_proofs/2.png", primitive_now_utc())
                .await
                .expect("set proof");
        assert!(replaced.is_none());
        let cleared = tasks::clear_proof(pool, &task.id, primitive_now_utc()).await.expect("clear");
        assert!(cleared.is_none());

        let stored = tasks::find_by_id(pool, &task.id).await.expect("find").expect("task");
        assert_eq!(stored.status, TaskStatus::Completed);
        assert_eq!(stored.proof_key.as_deref(), Some("task_proofs/1.png"));
    }

    #[tokio::test]
    async fn calendar_window_is_half_open() {
        let ctx = test_support::setup_test_context().await;
        let pool = ctx.state.db();
        let student =
            test_support::insert_account(pool, "s@example.com", UserRole::Student).await;
        let from = primitive_now_utc();
        let to = from + Duration::days(7);
        test_support::insert_task(pool, &student.id, "inside", from).await;
        test_support::insert_task(pool, &student.id, "at end", to).await;

        let found =
            tasks::list_for_account_between(pool, &student.id, from, to).await.expect("list");
        let names: Vec<&str> = found.iter().map(|task| task.name.as_str()).collect();
        assert_eq!(names, vec!["inside"]);
    }
}
