use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Student,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "accountstatus", rename_all = "lowercase")]
pub(crate) enum AccountStatus {
    Invited,
    Active,
    Requesting,
}

impl AccountStatus {
    pub(crate) fn can_login(self) -> bool {
        matches!(self, Self::Invited | Self::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "taskstatus", rename_all = "lowercase")]
pub(crate) enum TaskStatus {
    Pending,
    Submitted,
    Completed,
    Due,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "taskcategory")]
pub(crate) enum TaskCategory {
    Reading,
    Listening,
    Writing,
    Speaking,
    Other,
}

impl TaskCategory {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Reading" => Some(Self::Reading),
            "Listening" => Some(Self::Listening),
            "Writing" => Some(Self::Writing),
            "Speaking" => Some(Self::Speaking),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "notificationtype", rename_all = "snake_case")]
pub(crate) enum NotificationType {
    TaskAssigned,
    TaskCompleted,
    ProofVerified,
}
