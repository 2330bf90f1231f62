//! 试题生成的输入与输出模型

use crate::error::{AppResult, ValidationError};

/// 答案区分隔标记
pub const ANSWER_KEY_MARKER: &str = "Answer Key";

/// 三种题型的数量，每种允许 0..=20
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuestionCounts {
    pub mcq: u32,
    pub written: u32,
    pub true_false: u32,
}

impl QuestionCounts {
    pub const MAX_PER_KIND: u32 = 20;

    pub fn new(mcq: u32, written: u32, true_false: u32) -> AppResult<Self> {
        for (field, value) in [
            ("Number of Multiple Choice Questions", mcq),
            ("Number of Written Questions", written),
            ("Number of True/False Questions", true_false),
        ] {
            if value > Self::MAX_PER_KIND {
                return Err(ValidationError::OutOfRange {
                    field,
                    value: i64::from(value),
                    min: 0,
                    max: i64::from(Self::MAX_PER_KIND),
                }
                .into());
            }
        }
        Ok(Self {
            mcq,
            written,
            true_false,
        })
    }

    pub fn total(&self) -> u32 {
        self.mcq + self.written + self.true_false
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// 上传的参考材料
#[derive(Debug, Clone)]
pub struct UploadedMaterial {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 试题生成请求
#[derive(Debug, Clone)]
pub struct TestQuestionsRequest {
    pub topic: String,
    pub counts: QuestionCounts,
    pub material: Option<UploadedMaterial>,
}

/// 模型返回的试题文本，按答案区标记拆分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    pub questions: String,
    pub answer_key: Option<String>,
}

impl QuestionSet {
    /// 按第一次出现的 `Answer Key` 拆分
    ///
    /// 找到标记时两边都去掉首尾空白；没有标记时整段文本原样作为题目。
    pub fn from_response(text: &str) -> Self {
        match text.split_once(ANSWER_KEY_MARKER) {
            Some((questions, answers)) => Self {
                questions: questions.trim().to_string(),
                answer_key: Some(answers.trim().to_string()),
            },
            None => Self {
                questions: text.to_string(),
                answer_key: None,
            },
        }
    }
}
