pub(crate) mod autosubmit;
pub(crate) mod scheduler;
