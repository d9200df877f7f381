pub(crate) mod assignments;
pub(crate) mod attempts;
pub(crate) mod grades;
pub(crate) mod quizzes;
pub(crate) mod submissions;
