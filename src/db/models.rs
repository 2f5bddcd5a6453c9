use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::db::types::{AccountStatus, NotificationType, TaskCategory, TaskStatus, UserRole};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SocialLink {
    #[serde(default)]
    pub(crate) label: String,
    #[serde(default)]
    pub(crate) url: String,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) google_id: Option<String>,
    pub(crate) name: String,
    pub(crate) phone_number: Option<String>,
    pub(crate) birth_date: Option<Date>,
    pub(crate) picture: Option<String>,
    pub(crate) picture_key: Option<String>,
    pub(crate) role: UserRole,
    pub(crate) status: AccountStatus,
    pub(crate) social_links: Json<Vec<SocialLink>>,
    pub(crate) task_ids: Vec<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Task {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) instructions: String,
    pub(crate) deadline: PrimitiveDateTime,
    pub(crate) category: TaskCategory,
    pub(crate) assigned_to: String,
    pub(crate) status: TaskStatus,
    pub(crate) proof_url: Option<String>,
    pub(crate) proof_key: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Notification {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) title: String,
    pub(crate) message: String,
    #[sqlx(rename = "type")]
    pub(crate) kind: NotificationType,
    pub(crate) is_read: bool,
    pub(crate) related_task: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct NotificationWithTask {
    #[sqlx(flatten)]
    pub(crate) notification: Notification,
    pub(crate) related_task_name: Option<String>,
}
