//! 页面处理函数
//!
//! 校验错误以警告形式重新显示表单（422），文档错误只终止当前操作（500）。

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use minijinja::context;
use serde_json::json;
use tracing::{error, warn};

use crate::error::{AppError, AppResult};
use crate::models::{menu, Grade, LessonDuration, Proficiency, QuestionCounts, Tool};
use crate::services::PDF_MIME;
use crate::web::forms::{ExportForm, HelpForm, LessonPlanForm, TestQuestionsForm};
use crate::web::AppState;

/// 渲染结果转成 HTTP 响应
fn page(status: StatusCode, rendered: AppResult<String>) -> Response {
    match rendered {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            error!("❌ 页面渲染失败: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// 操作失败时的状态码和提示
///
/// 校验错误显示为警告，其余显示为错误。
fn failure_context(err: &AppError) -> (StatusCode, Option<String>, Option<String>) {
    if err.is_validation() {
        warn!("⚠️ 输入校验失败: {}", err);
        (StatusCode::UNPROCESSABLE_ENTITY, Some(err.to_string()), None)
    } else {
        error!("❌ 操作失败: {}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, None, Some(err.to_string()))
    }
}

fn grade_labels() -> Vec<&'static str> {
    Grade::ALL.iter().map(|g| g.label()).collect()
}

fn level_labels() -> Vec<&'static str> {
    Proficiency::ALL.iter().map(|l| l.label()).collect()
}

pub async fn index(State(state): State<AppState>) -> Response {
    page(
        StatusCode::OK,
        state
            .templates
            .render("index.html", context! { menu => menu(None) }),
    )
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "model": &*state.model_name }))
}

// ========== 教案 ==========

fn render_lesson_plan(
    state: &AppState,
    status: StatusCode,
    form: &LessonPlanForm,
    extra: minijinja::Value,
) -> Response {
    page(
        status,
        state.templates.render(
            "lesson_plan.html",
            context! {
                menu => menu(Some(Tool::LessonPlan)),
                grades => grade_labels(),
                levels => level_labels(),
                min_duration => LessonDuration::MIN,
                max_duration => LessonDuration::MAX,
                form => form,
                ..extra
            },
        ),
    )
}

pub async fn lesson_plan_page(State(state): State<AppState>) -> Response {
    render_lesson_plan(&state, StatusCode::OK, &LessonPlanForm::default(), context! {})
}

pub async fn lesson_plan_submit(
    State(state): State<AppState>,
    Form(form): Form<LessonPlanForm>,
) -> Response {
    let request = match form.to_request() {
        Ok(request) => request,
        Err(e) => {
            let (status, warning, error) = failure_context(&e);
            return render_lesson_plan(&state, status, &form, context! { warning, error });
        }
    };

    let outcome = state.flow.lesson_plan(&request).await;
    render_lesson_plan(
        &state,
        StatusCode::OK,
        &form,
        context! {
            result => context! {
                heading => outcome.heading,
                text => outcome.plan.display_text(),
            },
        },
    )
}

// ========== 试题 ==========

fn render_test_questions(
    state: &AppState,
    status: StatusCode,
    form: &TestQuestionsForm,
    extra: minijinja::Value,
) -> Response {
    page(
        status,
        state.templates.render(
            "test_questions.html",
            context! {
                menu => menu(Some(Tool::TestQuestions)),
                max_count => QuestionCounts::MAX_PER_KIND,
                form => form,
                ..extra
            },
        ),
    )
}

pub async fn test_questions_page(State(state): State<AppState>) -> Response {
    render_test_questions(&state, StatusCode::OK, &TestQuestionsForm::default(), context! {})
}

pub async fn test_questions_submit(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match TestQuestionsForm::from_multipart(multipart).await {
        Ok(form) => form,
        Err(e) => {
            let (status, warning, error) = failure_context(&e);
            return render_test_questions(
                &state,
                status,
                &TestQuestionsForm::default(),
                context! { warning, error },
            );
        }
    };

    let outcome = match form.to_request() {
        Ok(request) => state.flow.test_questions(request).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(outcome) => render_test_questions(
            &state,
            StatusCode::OK,
            &form,
            context! {
                result => context! {
                    topic => outcome.topic,
                    questions => outcome.question_set.questions,
                    answer_key => outcome.question_set.answer_key,
                    generation_failed => outcome.generation_failed,
                },
            },
        ),
        Err(e) => {
            let (status, warning, error) = failure_context(&e);
            render_test_questions(&state, status, &form, context! { warning, error })
        }
    }
}

/// `Content-Disposition` 中的文件名只保留可见 ASCII，引号和反斜杠替换为 `_`
fn header_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            ' '..='~' => c,
            _ => '_',
        })
        .collect()
}

/// 附件响应头：ASCII 回退名 + RFC 5987 `filename*` 保留原始文件名
fn content_disposition(file_name: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        header_file_name(file_name),
        urlencoding::encode(file_name)
    )
}

pub async fn export_questions_pdf(
    State(state): State<AppState>,
    Form(form): Form<ExportForm>,
) -> Response {
    let pdf = match state.flow.export_questions_pdf(&form.topic, &form.questions) {
        Ok(pdf) => pdf,
        Err(e) => {
            error!("❌ 试题 PDF 导出失败: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let disposition = HeaderValue::from_str(&content_disposition(&pdf.file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(PDF_MIME)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf.bytes,
    )
        .into_response()
}

// ========== 答疑 ==========

fn render_help(
    state: &AppState,
    status: StatusCode,
    form: &HelpForm,
    extra: minijinja::Value,
) -> Response {
    page(
        status,
        state.templates.render(
            "help.html",
            context! {
                menu => menu(Some(Tool::HelpStudents)),
                form => form,
                ..extra
            },
        ),
    )
}

pub async fn help_page(State(state): State<AppState>) -> Response {
    render_help(&state, StatusCode::OK, &HelpForm::default(), context! {})
}

pub async fn help_submit(State(state): State<AppState>, Form(form): Form<HelpForm>) -> Response {
    let answer = state.flow.help_student(&form.question).await;
    render_help(
        &state,
        StatusCode::OK,
        &form,
        context! {
            result => context! { answer => answer.answer.display_text() },
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_keeps_non_ascii_topic() {
        assert_eq!(
            content_disposition("Física_questions.pdf"),
            "attachment; filename=\"F_sica_questions.pdf\"; filename*=UTF-8''F%C3%ADsica_questions.pdf"
        );
        assert!(HeaderValue::from_str(&content_disposition("Física_questions.pdf")).is_ok());
    }

    #[test]
    fn header_file_name_strips_unsafe_characters() {
        assert_eq!(
            header_file_name("Ünit \"1\"_questions.pdf"),
            "_nit _1__questions.pdf"
        );
    }
}
