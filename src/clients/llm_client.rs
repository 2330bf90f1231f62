//! LLM API 客户端
//!
//! 封装对托管文本生成模型的单次调用。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 通过 OpenAI 兼容端点访问 Gemini 等模型
//!
//! 调用失败不会向上抛出，而是返回 [`Generation::Failed`]，
//! 页面上以 `Error: <原因>` 的形式显示。不做重试、超时或限流。

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::utils::truncate_text;

/// 一次生成调用的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// 模型返回的文本
    Text(String),
    /// 调用失败的原因
    Failed(String),
}

impl Generation {
    /// 页面显示用的文本
    ///
    /// 失败时返回 `Error: <原因>`
    pub fn display_text(&self) -> String {
        match self {
            Generation::Text(text) => text.clone(),
            Generation::Failed(reason) => format!("Error: {}", reason),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Generation::Failed(_))
    }
}

/// 文本生成能力
///
/// 编排层只依赖这个 trait，测试时可以替换成不访问网络的实现。
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Generation;
}

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 发送单条用户消息
    ///
    /// # 返回
    /// 返回第一个候选的文本内容
    pub async fn send_to_llm(&self, user_message: &str) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| LlmError::RequestBuildFailed {
                source: Box::new(e),
            })?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .build()
            .map_err(|e| LlmError::RequestBuildFailed {
                source: Box::new(e),
            })?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::ApiCallFailed {
                model: self.model_name.clone(),
                source: Box::new(e),
            })?;

        debug!("LLM API 调用成功");

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Generation {
        match self.send_to_llm(prompt).await {
            Ok(text) => {
                debug!("LLM 响应: {}", truncate_text(&text, 200));
                Generation::Text(text)
            }
            Err(e) => {
                warn!("LLM API 调用失败: {}", e);
                Generation::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_keeps_the_error_prefix() {
        let failed = Generation::Failed("API key not valid".to_string());
        assert!(failed.is_failed());
        assert_eq!(failed.display_text(), "Error: API key not valid");
    }

    #[test]
    fn text_is_passed_through_unchanged() {
        let text = Generation::Text("  Error: this came from the model\n".to_string());
        assert!(!text.is_failed());
        assert_eq!(text.display_text(), "  Error: this came from the model\n");
    }

    #[test]
    fn client_uses_configured_model() {
        let config = Config {
            llm_model_name: "gemini-1.5-pro".to_string(),
            ..Config::default()
        };
        assert_eq!(LlmClient::new(&config).model_name(), "gemini-1.5-pro");
    }

    /// 需要真实的 GOOGLE_API_KEY：cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_live_generation() {
        let _ = tracing_subscriber::fmt::try_init();
        let config = Config::from_env().expect("配置加载失败");
        let client = LlmClient::new(&config);

        let result = client
            .generate("Answer the following question in a simple way in English: What is 2+2?")
            .await;

        println!("LLM 响应: {}", result.display_text());
        assert!(!result.is_failed(), "调用失败: {}", result.display_text());
    }
}
