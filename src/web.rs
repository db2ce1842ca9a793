use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use minijinja::context;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::coordinator::{CoordinatorError, CoordinatorState, SessionStore, SESSION_TTL};
use crate::error::{ExportError, GenerationError, EXPORT_FAILED_MESSAGE};
use crate::form::{render_form_page, FormInput, FormView};
use crate::generation::LessonGenerator;
use crate::render::docx::{build_docx, DOCX_CONTENT_TYPE};
use crate::render::html::render_result_page;
use crate::render::LessonDocument;
use crate::templates;

pub const SESSION_COOKIE: &str = "rpp_session";

const BUSY_MESSAGE: &str = "RPP sedang disusun. Mohon tunggu hingga selesai.";
const NO_RESULT_MESSAGE: &str = "Belum ada RPP untuk diunduh.";
const RENDER_FAILED_MESSAGE: &str = "Halaman gagal ditampilkan.";

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub generator: Arc<dyn LessonGenerator>,
}

impl AppState {
    pub fn new(generator: Arc<dyn LessonGenerator>) -> Self {
        Self {
            sessions: SessionStore::new(),
            generator,
        }
    }
}

type PageError = (StatusCode, Html<String>);

fn notice(status: StatusCode, message: &str) -> PageError {
    let body = templates::render("notice.html", context! { message => message })
        .unwrap_or_else(|_| message.to_string());
    (status, Html(body))
}

fn page(result: Result<String, minijinja::Error>) -> Result<Html<String>, PageError> {
    result.map(Html).map_err(|err| {
        error!(error = %err, "Template rendering failed");
        notice(StatusCode::INTERNAL_SERVER_ERROR, RENDER_FAILED_MESSAGE)
    })
}

/// Existing session id from the cookie, or a fresh one added to the jar.
fn session(jar: CookieJar) -> (CookieJar, Uuid) {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    {
        return (jar, id);
    }

    let id = Uuid::new_v4();
    let jar = jar.add(
        Cookie::build((SESSION_COOKIE, id.to_string()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .max_age(SESSION_TTL)
            .path("/"),
    );
    (jar, id)
}

#[axum::debug_handler]
async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), PageError> {
    let (jar, id) = session(jar);
    let coordinator = state.sessions.snapshot(id).await;

    let html = match coordinator.state() {
        CoordinatorState::Form { error, draft } => {
            page(render_form_page(&FormView::new(draft, false), error.as_deref()))?
        }
        CoordinatorState::Loading { request } => {
            let draft = FormInput::from_request(request);
            page(render_form_page(&FormView::new(&draft, true), None))?
        }
        CoordinatorState::Result { request, response } => {
            page(render_result_page(&LessonDocument::build(request, response)))?
        }
    };
    Ok((jar, html))
}

#[axum::debug_handler]
async fn generate(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<FormInput>,
) -> Result<(CookieJar, Redirect), PageError> {
    let (jar, id) = session(jar);

    let request = match input.clone().into_request() {
        Ok(request) => request,
        Err(err) => {
            warn!(session = %id, error = %err, "Form rejected");
            state
                .sessions
                .update(id, |c| c.reject(err.to_string(), input))
                .await
                .map_err(conflict)?;
            return Ok((jar, Redirect::to("/")));
        }
    };

    state
        .sessions
        .update(id, |c| c.begin(request.clone()))
        .await
        .map_err(conflict)?;

    info!(session = %id, subject = %request.subject, method = %request.learning_method, "Generating lesson plan");
    // Owned by its own task so a dropped connection cannot leave the
    // session in Loading. The lock is released while the generator runs.
    let sessions = state.sessions.clone();
    let generator = state.generator.clone();
    let task = tokio::spawn(async move {
        let outcome = generator.generate(&request).await;
        sessions.update(id, |c| c.complete(outcome)).await
    });

    match task.await {
        Ok(completed) => completed.map_err(conflict)?,
        Err(err) => {
            let outcome = Err(GenerationError::Interrupted(err.to_string()));
            state
                .sessions
                .update(id, |c| c.complete(outcome))
                .await
                .map_err(conflict)?;
        }
    }

    Ok((jar, Redirect::to("/")))
}

fn conflict(err: CoordinatorError) -> PageError {
    warn!(error = %err, "Submission refused");
    let message = match err {
        CoordinatorError::Busy => BUSY_MESSAGE,
        _ => "Kembali ke form terlebih dahulu.",
    };
    notice(StatusCode::CONFLICT, message)
}

#[axum::debug_handler]
async fn reset(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let (jar, id) = session(jar);
    if let Err(err) = state.sessions.reset(id).await {
        warn!(session = %id, error = %err, "Reset ignored");
    }
    (jar, Redirect::to("/"))
}

/// `attachment` header with an ASCII fallback and the RFC 5987 UTF-8 name.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

async fn assemble(document: LessonDocument) -> Result<Vec<u8>, ExportError> {
    tokio::task::spawn_blocking(move || build_docx(&document))
        .await
        .map_err(|err| ExportError::Task(err.to_string()))?
}

#[axum::debug_handler]
async fn export(State(state): State<AppState>, jar: CookieJar) -> Result<Response, PageError> {
    let (_, id) = session(jar);
    let coordinator = state.sessions.snapshot(id).await;

    let Some((request, response)) = coordinator.result() else {
        return Err(notice(StatusCode::CONFLICT, NO_RESULT_MESSAGE));
    };
    let document = LessonDocument::build(request, response);
    let file_name = document.file_name.clone();

    match assemble(document).await {
        Ok(bytes) => {
            info!(session = %id, file = %file_name, bytes = bytes.len(), "Exported lesson plan");
            Ok((
                [
                    (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
                    (header::CONTENT_DISPOSITION, content_disposition(&file_name)),
                ],
                bytes,
            )
                .into_response())
        }
        Err(err) => {
            error!(session = %id, error = %err, "Export failed");
            Err(notice(StatusCode::INTERNAL_SERVER_ERROR, EXPORT_FAILED_MESSAGE))
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate))
        .route("/reset", post(reset))
        .route("/export", get(export))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
