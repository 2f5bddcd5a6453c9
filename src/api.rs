pub(crate) mod auth;
pub(crate) mod cookies;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod notifications;
pub(crate) mod router;
pub(crate) mod tasks;
pub(crate) mod users;
pub(crate) mod validation;
