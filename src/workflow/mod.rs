pub mod assistant_flow;
pub mod outcome;

pub use assistant_flow::AssistantFlow;
pub use outcome::{LessonPlanOutcome, QuestionsPdf, StudentAnswer, TestQuestionsOutcome};
