//! 各工具一次操作的结果

use crate::clients::Generation;
use crate::models::QuestionSet;

/// 教案生成结果
#[derive(Debug, Clone)]
pub struct LessonPlanOutcome {
    pub heading: String,
    pub plan: Generation,
}

/// 试题生成结果
#[derive(Debug, Clone)]
pub struct TestQuestionsOutcome {
    pub topic: String,
    pub question_set: QuestionSet,
    /// 模型调用是否失败（失败时题目区显示 `Error: ...`）
    pub generation_failed: bool,
    /// 是否使用了上传的参考材料
    pub used_material: bool,
}

/// 学生答疑结果
#[derive(Debug, Clone)]
pub struct StudentAnswer {
    pub answer: Generation,
}

/// 导出的试题 PDF
#[derive(Debug, Clone)]
pub struct QuestionsPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
