//! 表单输入解析与校验
//!
//! 表单字段先按字符串接收，再转换成领域请求；格式错误统一变成 [`ValidationError`]，
//! 页面上以警告形式显示，不会触发模型调用。

use axum::extract::Multipart;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{
    Grade, LessonDuration, LessonPlanRequest, Proficiency, QuestionCounts, TestQuestionsRequest,
    UploadedMaterial,
};

fn parse_number(field: &str, value: &str) -> AppResult<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| AppError::malformed_field(field, format!("'{}' is not a whole number", value)))
}

/// 教案表单
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LessonPlanForm {
    pub subject: String,
    pub topic: String,
    pub grade: String,
    pub level: String,
    pub duration: String,
}

impl Default for LessonPlanForm {
    fn default() -> Self {
        Self {
            subject: "Mathematics".to_string(),
            topic: "addition".to_string(),
            grade: Grade::Kindergarten.label().to_string(),
            level: Proficiency::Beginner.label().to_string(),
            duration: LessonDuration::DEFAULT.to_string(),
        }
    }
}

impl LessonPlanForm {
    pub fn to_request(&self) -> AppResult<LessonPlanRequest> {
        Ok(LessonPlanRequest {
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            grade: self.grade.parse()?,
            level: self.level.parse()?,
            duration: LessonDuration::new(parse_number("Lesson Duration", &self.duration)?)?,
        })
    }
}

/// 试题表单（multipart，含可选的 PDF 上传）
#[derive(Debug, Clone, Serialize)]
pub struct TestQuestionsForm {
    pub topic: String,
    pub mcq_count: String,
    pub written_count: String,
    pub tf_count: String,
    #[serde(skip)]
    pub material: Option<UploadedMaterial>,
}

impl Default for TestQuestionsForm {
    fn default() -> Self {
        Self {
            topic: String::new(),
            mcq_count: "1".to_string(),
            written_count: "0".to_string(),
            tf_count: "0".to_string(),
            material: None,
        }
    }
}

impl TestQuestionsForm {
    /// 读取 multipart 请求体
    ///
    /// 未选择文件时浏览器仍会发送一个空的 `material` 字段，视为没有上传。
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "topic" => form.topic = field.text().await?,
                "mcq_count" => form.mcq_count = field.text().await?,
                "written_count" => form.written_count = field.text().await?,
                "tf_count" => form.tf_count = field.text().await?,
                "material" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;
                    if !bytes.is_empty() {
                        form.material = Some(UploadedMaterial {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }

    pub fn to_request(&self) -> AppResult<TestQuestionsRequest> {
        let counts = QuestionCounts::new(
            parse_number("Number of Multiple Choice Questions", &self.mcq_count)?,
            parse_number("Number of Written Questions", &self.written_count)?,
            parse_number("Number of True/False Questions", &self.tf_count)?,
        )?;

        if let Some(material) = &self.material {
            if !material.file_name.to_lowercase().ends_with(".pdf") {
                return Err(AppError::malformed_field(
                    "material",
                    format!("'{}' is not a PDF file", material.file_name),
                ));
            }
        }

        Ok(TestQuestionsRequest {
            topic: self.topic.clone(),
            counts,
            material: self.material.clone(),
        })
    }
}

/// 学生答疑表单
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HelpForm {
    #[serde(default)]
    pub question: String,
}

/// 试题 PDF 下载表单（题目文本由结果页的隐藏字段回传）
#[derive(Debug, Clone, Deserialize)]
pub struct ExportForm {
    pub topic: String,
    pub questions: String,
}
