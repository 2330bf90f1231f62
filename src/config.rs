use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use thiserror::Error;

/// 程序配置
///
/// 启动时从环境变量（以及可选的 `.env` 文件）读取一次，之后以只读方式传递给各层。
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP 监听地址
    pub app_host: String,
    /// HTTP 监听端口
    pub app_port: u16,
    /// 上传文件大小上限（字节）
    pub max_upload_bytes: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- OCR 配置 ---
    pub tesseract_cmd: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_host: "0.0.0.0".to_string(),
            app_port: 8501,
            max_upload_bytes: 20 * 1024 * 1024,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.0-flash".to_string(),
            tesseract_cmd: "tesseract".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid number for {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("Invalid bool for {name}: {value}")]
    InvalidBool { name: &'static str, value: String },
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// `GOOGLE_API_KEY` 缺失不会导致启动失败，只会在第一次调用模型时以错误文本的形式暴露出来。
    pub fn from_env() -> Result<Self, ConfigError> {
        // 如果存在 .env 则先加载
        let _ = dotenv();

        let default = Self::default();
        Ok(Self {
            app_host: env_or("APP_HOST", default.app_host),
            app_port: parse_or("APP_PORT", default.app_port)?,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", default.max_upload_bytes)?,
            verbose_logging: parse_bool_or("VERBOSE_LOGGING", default.verbose_logging)?,
            llm_api_key: env_or("GOOGLE_API_KEY", default.llm_api_key),
            llm_api_base_url: env_or("LLM_API_BASE_URL", default.llm_api_base_url),
            llm_model_name: env_or("LLM_MODEL_NAME", default.llm_model_name),
            tesseract_cmd: env_or("TESSERACT_CMD", default.tesseract_cmd),
        })
    }

    /// 监听地址，形如 `0.0.0.0:8501`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    pub fn has_api_key(&self) -> bool {
        !self.llm_api_key.trim().is_empty()
    }
}

fn env_or(key: &'static str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(v) => v.trim().parse::<T>().map_err(|_| ConfigError::InvalidNumber {
            name: key,
            value: v,
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool_or(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "y" => Ok(true),
            "0" | "false" | "no" | "n" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                name: key,
                value: v,
            }),
        },
        Err(_) => Ok(default),
    }
}
