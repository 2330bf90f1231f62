//! 浏览器表单界面
//!
//! 单页表单 + 三个工具，每次提交对应一次完整操作。

pub mod forms;
pub mod handlers;
pub mod routes;
pub mod templates;

use std::sync::Arc;

use crate::workflow::AssistantFlow;

pub use routes::build_router;
pub use templates::TemplateEngine;

/// 所有请求共享的只读状态
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<AssistantFlow>,
    pub templates: Arc<TemplateEngine>,
    pub model_name: Arc<str>,
}
