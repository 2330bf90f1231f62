//! # Smart Teacher Assistant
//!
//! 面向教师的浏览器助手：生成教案、生成试题（可基于上传的 PDF 材料）、用简单语言回答学生问题。
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 托管文本生成模型的单次调用，失败以 `Generation::Failed` 返回
//!
//! ### ② 业务能力层（Services）
//! - `prompts` - 把表单输入填入固定模板
//! - `document_reader` - PDF 文本提取 + 图片 OCR
//! - `question_parser` - 按题型分区扫描题目文本
//! - `pdf_writer` - 试题 PDF 排版导出
//!
//! ### ③ 流程层（Workflow）
//! - `AssistantFlow` - 每个工具一次操作的完整流程
//!
//! ### ④ 表现层（Web）
//! - `web/` - 表单页面、下载接口

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod web;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use clients::{Generation, LlmClient, TextGenerator};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use services::{OcrEngine, TesseractCli};
pub use workflow::AssistantFlow;
