pub(crate) mod errors;
pub(crate) mod handlers;
pub(crate) mod router;
pub(crate) mod student;
pub(crate) mod teacher;
pub(crate) mod validation;
