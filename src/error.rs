use std::fmt;

use crate::config::ConfigError;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 文档解析 / OCR 错误
    Document(DocumentError),
    /// 用户输入校验错误
    Validation(ValidationError),
    /// 配置错误
    Config(ConfigError),
    /// Web 层错误（模板渲染、请求解析）
    Web(WebError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Document(e) => write!(f, "Document error: {}", e),
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Web(e) => write!(f, "Web error: {}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Document(e) => Some(e),
            AppError::Validation(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Web(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// LLM 服务错误
///
/// 不会转换成 [`AppError`]：调用失败在客户端内部变成 `Generation::Failed`，
/// Display 只输出底层原因，页面上显示为 `Error: <原因>`。
#[derive(Debug)]
pub enum LlmError {
    /// 请求构建失败
    RequestBuildFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 调用失败（网络、配额、鉴权等）
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    EmptyContent { model: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::RequestBuildFailed { source } => write!(f, "{}", source),
            LlmError::ApiCallFailed { source, .. } => write!(f, "{}", source),
            LlmError::EmptyContent { model } => {
                write!(f, "model {} returned no content", model)
            }
        }
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LlmError::RequestBuildFailed { source } | LlmError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            LlmError::EmptyContent { .. } => None,
        }
    }
}

/// 文档解析 / OCR 错误
#[derive(Debug)]
pub enum DocumentError {
    /// PDF 打开或解析失败
    PdfParseFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 页面文本提取失败
    TextExtractionFailed {
        page: u32,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 内嵌图片解码失败
    ImageDecodeFailed {
        page: u32,
        image_index: usize,
        reason: String,
    },
    /// OCR 执行失败
    OcrFailed { reason: String },
    /// PDF 生成失败
    PdfWriteFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::PdfParseFailed { source } => {
                write!(f, "could not open the PDF: {}", source)
            }
            DocumentError::TextExtractionFailed { page, source } => {
                write!(f, "could not extract text from page {}: {}", page, source)
            }
            DocumentError::ImageDecodeFailed {
                page,
                image_index,
                reason,
            } => write!(
                f,
                "could not decode image {} on page {}: {}",
                image_index, page, reason
            ),
            DocumentError::OcrFailed { reason } => write!(f, "OCR failed: {}", reason),
            DocumentError::PdfWriteFailed { source } => {
                write!(f, "could not write the PDF: {}", source)
            }
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::PdfParseFailed { source }
            | DocumentError::TextExtractionFailed { source, .. }
            | DocumentError::PdfWriteFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 用户输入校验错误
///
/// 在任何外部调用之前检查，Display 文本直接作为页面警告显示。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 三种题型数量都为 0
    NoQuestionsRequested,
    /// 数值超出表单允许范围
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    /// 下拉框取值不在候选列表中
    UnknownChoice { field: &'static str, value: String },
    /// 表单字段缺失或格式错误
    MalformedField { field: String, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoQuestionsRequested => {
                write!(f, "Please select at least one question!")
            }
            ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "{} must be between {} and {} (got {})",
                field, min, max, value
            ),
            ValidationError::UnknownChoice { field, value } => {
                write!(f, "'{}' is not a valid {}", value, field)
            }
            ValidationError::MalformedField { field, reason } => {
                write!(f, "Invalid value for {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Web 层错误
#[derive(Debug)]
pub enum WebError {
    /// 模板渲染失败
    TemplateFailed {
        template: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// multipart 请求读取失败
    MultipartFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::TemplateFailed { template, source } => {
                write!(f, "could not render {}: {}", template, source)
            }
            WebError::MultipartFailed { source } => {
                write!(f, "could not read the upload: {}", source)
            }
        }
    }
}

impl std::error::Error for WebError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WebError::TemplateFailed { source, .. } | WebError::MultipartFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        AppError::Document(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<minijinja::Error> for AppError {
    fn from(err: minijinja::Error) -> Self {
        AppError::Web(WebError::TemplateFailed {
            template: err.name().unwrap_or_default().to_string(),
            source: Box::new(err),
        })
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::Web(WebError::MultipartFailed {
            source: Box::new(err),
        })
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Other(format!("background task failed: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建 PDF 解析错误
    pub fn pdf_parse_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Document(DocumentError::PdfParseFailed {
            source: Box::new(source),
        })
    }

    /// 创建 PDF 生成错误
    pub fn pdf_write_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Document(DocumentError::PdfWriteFailed {
            source: Box::new(source),
        })
    }

    /// 创建 OCR 错误
    pub fn ocr_failed(reason: impl Into<String>) -> Self {
        AppError::Document(DocumentError::OcrFailed {
            reason: reason.into(),
        })
    }

    /// 创建字段格式错误
    pub fn malformed_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::MalformedField {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// 是否属于用户输入问题（页面显示警告而不是错误）
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
