pub mod lesson;
pub mod questions;
pub mod tool;

pub use lesson::{Grade, LessonDuration, LessonPlanRequest, Proficiency};
pub use questions::{
    QuestionCounts, QuestionSet, TestQuestionsRequest, UploadedMaterial, ANSWER_KEY_MARKER,
};
pub use tool::{menu, MenuEntry, Tool};
