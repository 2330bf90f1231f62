use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::web::{handlers, AppState};

/// 构建路由
///
/// # 参数
/// - `max_upload_bytes`: 请求体上限（上传 PDF 用）
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/lesson-plan",
            get(handlers::lesson_plan_page).post(handlers::lesson_plan_submit),
        )
        .route(
            "/test-questions",
            get(handlers::test_questions_page).post(handlers::test_questions_submit),
        )
        .route("/test-questions/pdf", post(handlers::export_questions_pdf))
        .route("/help", get(handlers::help_page).post(handlers::help_submit))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
