use sqlx::PgPool;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::Task;
use crate::db::types::NotificationType;
use crate::repositories;

pub(crate) const TASK_ASSIGNED_TITLE: &str = "New Task Assigned";
pub(crate) const PROOF_VERIFIED_TITLE: &str = "Task Verified";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub(crate) recipient: String,
    pub(crate) title: &'static str,
    pub(crate) message: String,
    pub(crate) kind: NotificationType,
    pub(crate) related_task: Option<String>,
}

impl Notice {
    pub(crate) fn task_assigned(task: &Task) -> Self {
        Self {
            recipient: task.assigned_to.clone(),
            title: TASK_ASSIGNED_TITLE,
            message: format!("You have been assigned to a new task: {}", task.name),
            kind: NotificationType::TaskAssigned,
            related_task: Some(task.id.clone()),
        }
    }

    pub(crate) fn proof_verified(task: &Task) -> Self {
        Self {
            recipient: task.assigned_to.clone(),
            title: PROOF_VERIFIED_TITLE,
            message: format!("Your proof for \"{}\" has been verified", task.name),
            kind: NotificationType::ProofVerified,
            related_task: Some(task.id.clone()),
        }
    }
}

pub(crate) async fn emit(pool: &PgPool, notice: Notice) {
    let id = Uuid::new_v4().to_string();
    let result = repositories::notifications::create(
        pool,
        repositories::notifications::CreateNotification {
            id: &id,
            user_id: &notice.recipient,
            title: notice.title,
            message: &notice.message,
            kind: notice.kind,
            related_task: notice.related_task.as_deref(),
            created_at: primitive_now_utc(),
        },
    )
    .await;

    if let Err(err) = result {
        tracing::warn!(
            error = %err,
            recipient = %notice.recipient,
            kind = ?notice.kind,
            "Failed to emit notification"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::{TaskCategory, TaskStatus};
    use time::macros::datetime;

    fn task() -> Task {
        Task {
            id: "task-1".into(),
            name: "Shadowing drill".into(),
            instructions: "Record yourself".into(),
            deadline: datetime!(2025-07-10 17:00:00),
            category: TaskCategory::Speaking,
            assigned_to: "student-1".into(),
            status: TaskStatus::Pending,
            proof_url: None,
            proof_key: None,
            created_at: datetime!(2025-07-01 09:00:00),
            updated_at: datetime!(2025-07-01 09:00:00),
        }
    }

    #[test]
    fn assignment_notice_names_the_task() {
        let notice = Notice::task_assigned(&task());
        assert_eq!(notice.recipient, "student-1");
        assert_eq!(notice.title, "New Task Assigned");
        assert_eq!(notice.message, "You have been assigned to a new task: Shadowing drill");
        assert_eq!(notice.kind, NotificationType::TaskAssigned);
        assert_eq!(notice.related_task.as_deref(), Some("task-1"));
    }

    #[test]
    fn verification_notice_targets_assignee() {
        let notice = Notice::proof_verified(&task());
        assert_eq!(notice.recipient, "student-1");
        assert_eq!(notice.kind, NotificationType::ProofVerified);
    }
}
