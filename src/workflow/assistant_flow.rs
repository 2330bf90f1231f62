//! 教学助手流程 - 流程层
//!
//! 核心职责：定义每个工具"一次操作"的完整流程
//!
//! - 教案：构建提示词 → 调用模型
//! - 试题：校验数量 → （提取上传材料）→ 构建提示词 → 调用模型 → 拆分答案区
//! - 答疑：构建提示词 → 调用模型
//!
//! 每次操作最多调用一次模型；校验失败时不调用。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clients::TextGenerator;
use crate::error::{AppResult, ValidationError};
use crate::models::{LessonPlanRequest, QuestionSet, TestQuestionsRequest, UploadedMaterial};
use crate::services::{download_file_name, extract_text_from_pdf, prompts, render_questions_pdf, OcrEngine};
use crate::utils::truncate_text;
use crate::workflow::outcome::{LessonPlanOutcome, QuestionsPdf, StudentAnswer, TestQuestionsOutcome};

/// 教学助手流程
///
/// - 依赖通过构造函数显式传入，不读取全局状态
/// - 不持有任何请求级别的可变状态，可以在多个请求间共享
pub struct AssistantFlow {
    generator: Arc<dyn TextGenerator>,
    ocr: Arc<dyn OcrEngine>,
}

impl AssistantFlow {
    /// 创建新的流程
    pub fn new(generator: Arc<dyn TextGenerator>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { generator, ocr }
    }

    /// 生成教案
    pub async fn lesson_plan(&self, request: &LessonPlanRequest) -> LessonPlanOutcome {
        info!(
            "📝 生成教案: {} - {} ({}, {}, {} 分钟)",
            request.subject,
            request.topic,
            request.grade,
            request.level,
            request.duration.minutes()
        );

        let prompt = prompts::lesson_plan_prompt(request);
        debug!("教案提示词: {}", truncate_text(&prompt, 200));

        let plan = self.generator.generate(&prompt).await;
        if plan.is_failed() {
            warn!("⚠️ 教案生成失败: {}", plan.display_text());
        }

        LessonPlanOutcome {
            heading: request.heading(),
            plan,
        }
    }

    /// 生成试题
    ///
    /// 三种题型数量全为 0 时返回校验错误，不提取材料也不调用模型。
    /// 材料解析失败会直接返回错误。
    pub async fn test_questions(&self, request: TestQuestionsRequest) -> AppResult<TestQuestionsOutcome> {
        let TestQuestionsRequest {
            topic,
            counts,
            material,
        } = request;

        if counts.is_empty() {
            warn!("⚠️ 未选择任何题目，跳过生成");
            return Err(ValidationError::NoQuestionsRequested.into());
        }

        info!(
            "🧪 生成试题: {} (选择 {}, 简答 {}, 判断 {})",
            topic, counts.mcq, counts.written, counts.true_false
        );

        let material_text = match material {
            Some(material) => Some(self.extract_material(material).await?),
            None => None,
        };
        let used_material = material_text.is_some();

        let prompt = prompts::test_questions_prompt(&counts, &topic, material_text.as_deref())?;
        debug!("试题提示词长度: {} 字符", prompt.chars().count());

        let generation = self.generator.generate(&prompt).await;
        let generation_failed = generation.is_failed();
        if generation_failed {
            warn!("⚠️ 试题生成失败: {}", generation.display_text());
        }

        let question_set = QuestionSet::from_response(&generation.display_text());
        info!(
            "✓ 试题生成完成 (答案区: {})",
            if question_set.answer_key.is_some() { "有" } else { "无" }
        );

        Ok(TestQuestionsOutcome {
            topic,
            question_set,
            generation_failed,
            used_material,
        })
    }

    /// 回答学生问题
    pub async fn help_student(&self, question: &str) -> StudentAnswer {
        info!("🙋 学生提问: {}", truncate_text(question, 80));

        let prompt = prompts::student_help_prompt(question);
        let answer = self.generator.generate(&prompt).await;
        if answer.is_failed() {
            warn!("⚠️ 答疑失败: {}", answer.display_text());
        }
        StudentAnswer { answer }
    }

    /// 导出试题 PDF
    pub fn export_questions_pdf(&self, topic: &str, questions: &str) -> AppResult<QuestionsPdf> {
        let bytes = render_questions_pdf(topic, questions)?;
        let file_name = download_file_name(topic);
        info!("📄 导出试题 PDF: {} ({} 字节)", file_name, bytes.len());
        Ok(QuestionsPdf { file_name, bytes })
    }

    /// 在阻塞线程池中提取上传材料的文本
    async fn extract_material(&self, material: UploadedMaterial) -> AppResult<String> {
        info!(
            "📎 提取上传材料: {} ({} 字节)",
            material.file_name,
            material.bytes.len()
        );
        let ocr = Arc::clone(&self.ocr);
        let text = tokio::task::spawn_blocking(move || {
            extract_text_from_pdf(&material.bytes, ocr.as_ref())
        })
        .await??;
        debug!("材料文本长度: {} 字符", text.chars().count());
        Ok(text)
    }
}
