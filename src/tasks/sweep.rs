use anyhow::Context;
use sqlx::PgPool;

use crate::core::metrics::{TASKS_MARKED_DUE_TOTAL, TASKS_SWEPT_TOTAL};
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::services::storage::StorageService;
use crate::services::task_lifecycle::{sweep_action, SweepAction};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SweepSummary {
    pub(crate) marked_due: u64,
    pub(crate) deleted: u64,
    pub(crate) repaired_indexes: u64,
}

pub(crate) async fn run_sweep(
    pool: &PgPool,
    storage: Option<&StorageService>,
) -> anyhow::Result<SweepSummary> {
    let now = primitive_now_utc();
    let mut summary = SweepSummary::default();

    summary.marked_due = repositories::tasks::mark_overdue_due(pool, now)
        .await
        .context("Failed to mark overdue tasks")?;

    let expired = repositories::tasks::list_completed_past_deadline(pool, now)
        .await
        .context("Failed to list expired completed tasks")?;

    for task in expired {
        if sweep_action(task.status, task.deadline, now) != SweepAction::Delete {
            continue;
        }

        match repositories::tasks::delete_completed(pool, &task).await {
            Ok(true) => {
                summary.deleted += 1;
                if let (Some(storage), Some(key)) = (storage, task.proof_key.as_deref()) {
                    storage.delete_quietly(key).await;
                }
            }
            Ok(false) => {
                tracing::debug!(task_id = %task.id, "Task changed before sweep could delete it");
            }
            Err(err) => {
                tracing::error!(error = %err, task_id = %task.id, "Failed to delete expired task");
            }
        }
    }

    summary.repaired_indexes = repositories::users::rebuild_task_refs(pool)
        .await
        .context("Failed to reconcile task indexes")?;

    metrics::counter!(TASKS_MARKED_DUE_TOTAL).increment(summary.marked_due);
    metrics::counter!(TASKS_SWEPT_TOTAL).increment(summary.deleted);

    tracing::info!(
        marked_due = summary.marked_due,
        deleted = summary.deleted,
        repaired_indexes = summary.repaired_indexes,
        "Task sweep complete"
    );

    Ok(summary)
}
