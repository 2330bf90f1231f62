use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::clients::LlmClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::services::TesseractCli;
use crate::utils::logging::log_startup;
use crate::web::{build_router, AppState, TemplateEngine};
use crate::workflow::AssistantFlow;

/// 应用主结构
pub struct App {
    config: Config,
    state: AppState,
}

impl App {
    /// 初始化应用：构建模型客户端、OCR 和模板
    pub fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let client = LlmClient::new(&config);
        let ocr = TesseractCli::new(config.tesseract_cmd.clone());
        let flow = AssistantFlow::new(Arc::new(client), Arc::new(ocr));

        let state = AppState {
            flow: Arc::new(flow),
            templates: Arc::new(TemplateEngine::new()?),
            model_name: Arc::from(config.llm_model_name.as_str()),
        };

        Ok(Self { config, state })
    }

    /// 启动 HTTP 服务
    pub async fn run(self) -> AppResult<()> {
        let addr = self.config.bind_addr();
        let app = build_router(self.state, self.config.max_upload_bytes);

        let listener = TcpListener::bind(&addr).await?;
        info!("🌐 Smart Teacher Assistant 监听 http://{}", addr);
        axum::serve(listener, app).await?;
        Ok(())
    }
}
