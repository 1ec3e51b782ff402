pub(crate) mod question_extraction;
