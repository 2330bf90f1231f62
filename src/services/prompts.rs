//! 提示词构建 - 业务能力层
//!
//! 只负责把表单输入填进固定模板，不调用模型，不关心流程。

use crate::error::{AppResult, ValidationError};
use crate::models::{LessonPlanRequest, QuestionCounts};

/// 参考材料最多保留的字符数
pub const MATERIAL_CHAR_BUDGET: usize = 2000;

/// 构建教案提示词
pub fn lesson_plan_prompt(request: &LessonPlanRequest) -> String {
    let LessonPlanRequest {
        subject,
        topic,
        grade,
        level,
        duration,
    } = request;

    format!(
        "Create a realistic lesson plan in English for teaching {subject}, focusing on {topic}, \
         to {grade} grade students at a {level} level in a {minutes}-minute class. The plan must include:\n\
         - **Learning Objectives**: What students will master related to {topic} based on their level.\n\
         - **Introduction ({intro} minutes)**: An interactive activity linking {topic} to prior knowledge.\n\
         - **Teaching and Application ({teaching} minutes)**: Explanation of {topic} with examples and a level-appropriate hands-on activity.\n\
         - **Conclusion and Assessment ({conclusion} minutes)**: A question or task to assess understanding of {topic}.\n\
         Focus on making the plan practical, curriculum-aligned, and suitable for the given time.",
        minutes = duration.minutes(),
        intro = duration.introduction_minutes(),
        teaching = duration.teaching_minutes(),
        conclusion = duration.conclusion_minutes(),
    )
}

/// 列出非零题型，例如 `exactly 2 multiple choice questions (MCQ) with 4 options each`
fn question_parts(counts: &QuestionCounts) -> Vec<String> {
    let mut parts = Vec::new();
    if counts.mcq > 0 {
        parts.push(format!(
            "exactly {} multiple choice questions (MCQ) with 4 options each",
            counts.mcq
        ));
    }
    if counts.written > 0 {
        parts.push(format!(
            "exactly {} open-ended written questions",
            counts.written
        ));
    }
    if counts.true_false > 0 {
        parts.push(format!(
            "exactly {} true or false questions",
            counts.true_false
        ));
    }
    parts
}

/// 截取参考材料的前 [`MATERIAL_CHAR_BUDGET`] 个字符
pub fn truncate_material(material: &str) -> &str {
    match material.char_indices().nth(MATERIAL_CHAR_BUDGET) {
        Some((byte_index, _)) => &material[..byte_index],
        None => material,
    }
}

/// 构建试题提示词
///
/// 三种题型数量全为 0 时直接返回校验错误，不构建提示词。
pub fn test_questions_prompt(
    counts: &QuestionCounts,
    topic: &str,
    material: Option<&str>,
) -> AppResult<String> {
    if counts.is_empty() {
        return Err(ValidationError::NoQuestionsRequested.into());
    }

    let base_prompt = format!(
        "Create test questions in English as follows: {}. \
         Do NOT include answers immediately after each question. \
         Instead, provide all correct answers in a separate 'Answer Key' section at the end. \
         For MCQs, list the correct option (e.g., 'c'); for written questions, provide a concise answer; \
         for true/false, state 'True' or 'False'. Format questions under clear section headers: \
         'Multiple Choice Questions (MCQ)', 'Open-Ended Written Questions', and 'True or False Questions'.",
        question_parts(counts).join(", ")
    );

    let prompt = match material {
        Some(text) => format!(
            "Based on the following material: '{}' (truncated for brevity), \
             create test questions about {}. {}",
            truncate_material(text),
            topic,
            base_prompt
        ),
        None => format!("Create test questions about {}. {}", topic, base_prompt),
    };
    Ok(prompt)
}

/// 构建学生答疑提示词
pub fn student_help_prompt(question: &str) -> String {
    format!(
        "Answer the following question in a simple way in English: {}",
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Grade, LessonDuration, Proficiency};

    fn lesson(minutes: u32) -> LessonPlanRequest {
        LessonPlanRequest {
            subject: "Mathematics".to_string(),
            topic: "addition".to_string(),
            grade: Grade::Kindergarten,
            level: Proficiency::Beginner,
            duration: LessonDuration::new(minutes).unwrap(),
        }
    }

    #[test]
    fn lesson_plan_uses_truncated_time_split() {
        let prompt = lesson_plan_prompt(&lesson(50));
        assert!(prompt.contains("in a 50-minute class"));
        assert!(prompt.contains("**Introduction (8 minutes)**"));
        assert!(prompt.contains("**Teaching and Application (33 minutes)**"));
        assert!(prompt.contains("**Conclusion and Assessment (8 minutes)**"));
    }

    #[test]
    fn lesson_plan_interpolates_all_fields() {
        let prompt = lesson_plan_prompt(&lesson(60));
        assert!(prompt.starts_with(
            "Create a realistic lesson plan in English for teaching Mathematics, focusing on addition, \
             to Kindergarten grade students at a Beginner level in a 60-minute class."
        ));
        assert!(prompt.contains("(10 minutes)"));
        assert!(prompt.contains("(40 minutes)"));
        assert!(prompt.ends_with("suitable for the given time."));
    }

    #[test]
    fn only_non_zero_categories_are_listed() {
        let counts = QuestionCounts::new(3, 0, 2).unwrap();
        let prompt = test_questions_prompt(&counts, "Science", None).unwrap();
        assert!(prompt.contains(
            "as follows: exactly 3 multiple choice questions (MCQ) with 4 options each, \
             exactly 2 true or false questions."
        ));
        assert!(!prompt.contains("open-ended written questions"));
        assert!(prompt.starts_with("Create test questions about Science. "));
    }

    #[test]
    fn every_combination_lists_exact_counts() {
        for mcq in 0..3 {
            for written in 0..3 {
                for tf in 0..3 {
                    let counts = QuestionCounts::new(mcq, written, tf).unwrap();
                    let result = test_questions_prompt(&counts, "Topic", None);
                    if counts.is_empty() {
                        assert!(result.is_err());
                        continue;
                    }
                    let prompt = result.unwrap();
                    assert_eq!(
                        prompt.contains(&format!("exactly {} multiple choice", mcq)),
                        mcq > 0
                    );
                    assert_eq!(
                        prompt.contains(&format!("exactly {} open-ended", written)),
                        written > 0
                    );
                    assert_eq!(
                        prompt.contains(&format!("exactly {} true or false", tf)),
                        tf > 0
                    );
                }
            }
        }
    }

    #[test]
    fn zero_counts_are_rejected_before_building() {
        let counts = QuestionCounts::default();
        let err = test_questions_prompt(&counts, "Science", Some("material")).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn material_is_truncated_to_budget() {
        let material = "é".repeat(MATERIAL_CHAR_BUDGET + 500);
        let counts = QuestionCounts::new(1, 0, 0).unwrap();
        let prompt = test_questions_prompt(&counts, "Physics", Some(&material)).unwrap();

        let expected = format!(
            "Based on the following material: '{}' (truncated for brevity), create test questions about Physics. ",
            "é".repeat(MATERIAL_CHAR_BUDGET)
        );
        assert!(prompt.starts_with(&expected));
        assert!(prompt.contains("separate 'Answer Key' section at the end"));
    }

    #[test]
    fn short_material_is_kept_whole() {
        assert_eq!(truncate_material("short text"), "short text");
        assert_eq!(truncate_material(""), "");
    }

    #[test]
    fn student_help_wraps_question() {
        assert_eq!(
            student_help_prompt("Why is the sky blue?"),
            "Answer the following question in a simple way in English: Why is the sky blue?"
        );
    }
}
