use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::NotificationWithTask;
use crate::db::types::NotificationType;

#[derive(Debug, Serialize)]
pub(crate) struct RelatedTask {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotificationResponse {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) title: String,
    pub(crate) message: String,
    #[serde(rename = "type")]
    pub(crate) kind: NotificationType,
    pub(crate) is_read: bool,
    pub(crate) related_task: Option<RelatedTask>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl NotificationResponse {
    pub(crate) fn from_db(row: NotificationWithTask) -> Self {
        let notification = row.notification;
        let related_task = match (notification.related_task, row.related_task_name) {
            (Some(id), Some(name)) => Some(RelatedTask { id, name }),
            _ => None,
        };

        Self {
            id: notification.id,
            user_id: notification.user_id,
            title: notification.title,
            message: notification.message,
            kind: notification.kind,
            is_read: notification.is_read,
            related_task,
            created_at: format_primitive(notification.created_at),
            updated_at: format_primitive(notification.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotificationListPayload {
    pub(crate) notifications: Vec<NotificationResponse>,
    pub(crate) unread_count: i64,
}
