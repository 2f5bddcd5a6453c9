use thiserror::Error;
use time::PrimitiveDateTime;

use crate::core::time::parse_instant;
use crate::db::models::{Task, User};
use crate::db::types::{TaskCategory, TaskStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum LifecycleError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unparseable deadline: {0}")]
    InvalidDeadline(String),
    #[error("task already completed")]
    AlreadyCompleted,
}

#[derive(Debug, Default)]
pub(crate) struct NewTaskInput {
    pub(crate) name: Option<String>,
    pub(crate) instructions: Option<String>,
    pub(crate) deadline: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) assigned_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidNewTask {
    pub(crate) name: String,
    pub(crate) instructions: String,
    pub(crate) deadline: PrimitiveDateTime,
    pub(crate) category: TaskCategory,
    pub(crate) assigned_to: String,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, LifecycleError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(LifecycleError::MissingField(field))
}

pub(crate) fn validate_new_task(input: NewTaskInput) -> Result<ValidNewTask, LifecycleError> {
    let name = required(input.name, "name")?;
    let instructions = required(input.instructions, "instructions")?;
    let deadline_raw = required(input.deadline, "deadline")?;
    let category_raw = required(input.category, "category")?;
    let assigned_to = required(input.assigned_to, "assignedTo")?;

    let deadline =
        parse_instant(&deadline_raw).ok_or(LifecycleError::InvalidDeadline(deadline_raw))?;
    let category = TaskCategory::parse(&category_raw)
        .ok_or(LifecycleError::UnknownCategory(category_raw))?;

    Ok(ValidNewTask { name, instructions, deadline, category, assigned_to })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProofChange {
    Attach,
    Remove,
}

/// Status a task moves to when its proof changes. Completed tasks are frozen;
/// a `due` task still accepts a late submission.
pub(crate) fn status_after_proof(
    current: TaskStatus,
    change: ProofChange,
) -> Result<TaskStatus, LifecycleError> {
    if current == TaskStatus::Completed {
        return Err(LifecycleError::AlreadyCompleted);
    }

    Ok(match change {
        ProofChange::Attach => TaskStatus::Submitted,
        ProofChange::Remove => TaskStatus::Pending,
    })
}

pub(crate) fn announces_verification(previous: TaskStatus, next: TaskStatus) -> bool {
    next == TaskStatus::Completed && previous != TaskStatus::Completed
}

pub(crate) fn can_access(user: &User, task: &Task) -> bool {
    user.is_admin() || task.assigned_to == user.id
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SweepAction {
    Keep,
    MarkDue,
    Delete,
}

pub(crate) fn sweep_action(
    status: TaskStatus,
    deadline: PrimitiveDateTime,
    now: PrimitiveDateTime,
) -> SweepAction {
    if deadline >= now {
        return SweepAction::Keep;
    }

    match status {
        TaskStatus::Completed => SweepAction::Delete,
        TaskStatus::Due => SweepAction::Keep,
        TaskStatus::Pending | TaskStatus::Submitted => SweepAction::MarkDue,
    }
}
