pub(crate) mod notifications;
pub(crate) mod tasks;
pub(crate) mod users;
