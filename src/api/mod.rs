pub(crate) mod assignments;
pub(crate) mod attempts;
pub(crate) mod errors;
pub(crate) mod grades;
pub(crate) mod handlers;
pub(crate) mod pagination;
pub(crate) mod quizzes;
pub(crate) mod router;
pub(crate) mod submissions;
