pub(crate) mod calendar;
pub(crate) mod notifications;
pub(crate) mod storage;
pub(crate) mod task_lifecycle;
