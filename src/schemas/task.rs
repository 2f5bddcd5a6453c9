use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Task;
use crate::db::types::{TaskCategory, TaskStatus};
use crate::services::task_lifecycle::NewTaskInput;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskCreateRequest {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) instructions: Option<String>,
    #[serde(default)]
    pub(crate) deadline: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) assigned_to: Option<String>,
}

impl From<TaskCreateRequest> for NewTaskInput {
    fn from(request: TaskCreateRequest) -> Self {
        Self {
            name: request.name,
            instructions: request.instructions,
            deadline: request.deadline,
            category: request.category,
            assigned_to: request.assigned_to,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TaskStatusUpdate {
    #[serde(default)]
    pub(crate) status: Option<String>,
}

impl TaskStatusUpdate {
    pub(crate) fn parsed(&self) -> Option<TaskStatus> {
        match self.status.as_deref().map(str::trim) {
            Some("pending") => Some(TaskStatus::Pending),
            Some("submitted") => Some(TaskStatus::Submitted),
            Some("completed") => Some(TaskStatus::Completed),
            Some("due") => Some(TaskStatus::Due),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskSummary {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) instructions: String,
    pub(crate) deadline: String,
    pub(crate) category: TaskCategory,
    pub(crate) status: TaskStatus,
    pub(crate) proof_url: Option<String>,
}

impl TaskSummary {
    pub(crate) fn from_db(task: Task) -> Self {
        Self {
            id: task.id,
            name: task.name,
            instructions: task.instructions,
            deadline: format_primitive(task.deadline),
            category: task.category,
            status: task.status,
            proof_url: task.proof_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskResponse {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) instructions: String,
    pub(crate) deadline: String,
    pub(crate) category: TaskCategory,
    pub(crate) assigned_to: String,
    pub(crate) status: TaskStatus,
    pub(crate) proof_url: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl TaskResponse {
    pub(crate) fn from_db(task: Task) -> Self {
        Self {
            id: task.id,
            name: task.name,
            instructions: task.instructions,
            deadline: format_primitive(task.deadline),
            category: task.category,
            assigned_to: task.assigned_to,
            status: task.status,
            proof_url: task.proof_url,
            created_at: format_primitive(task.created_at),
            updated_at: format_primitive(task.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskPayload {
    pub(crate) task: TaskResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskListPayload {
    pub(crate) tasks: Vec<TaskSummary>,
}
