use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod calendar;
pub(crate) mod notification;
pub(crate) mod task;
pub(crate) mod user;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Envelope<T: Serialize> {
    pub(crate) success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    #[serde(flatten)]
    pub(crate) payload: T,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct Empty {}

impl<T: Serialize> Envelope<T> {
    pub(crate) fn ok(payload: T) -> Self {
        Self { success: true, message: None, payload }
    }

    pub(crate) fn ok_with(message: impl Into<String>, payload: T) -> Self {
        Self { success: true, message: Some(message.into()), payload }
    }
}

impl Envelope<Empty> {
    pub(crate) fn done(message: impl Into<String>) -> Self {
        Self::ok_with(message, Empty {})
    }

    pub(crate) fn failure(message: Option<String>) -> Self {
        Self { success: false, message, payload: Empty {} }
    }
}
