//! Request handlers. Each POST handler takes the session out of its slot,
//! runs one chat action on it and puts the result back.

use super::{page, AppState, SESSION_COOKIE};
use crate::chat;
use crate::error::ExtractionError;
use crate::pipeline::model::ModelChoice;
use crate::pipeline::registry::LoadStatus;
use crate::session::{Session, SessionId};
use axum::extract::multipart::MultipartError;
use axum::extract::{Form, Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, warn};
use uuid::Uuid;

/// File name recorded when the multipart body breaks before naming a file.
const UNNAMED_UPLOAD: &str = "upload.pdf";

#[derive(Debug, Deserialize)]
pub(super) struct MessageForm {
    text: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ModelForm {
    model: String,
}

pub(super) async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, cell, created) = state.sessions.open(session_id(&headers));
    let session = cell.lock().await;

    // A remembered failure is shown as is; only selecting the model again
    // (or submitting text) retries the load.
    let model_status = match state.registry.status(session.model).await {
        LoadStatus::Loaded => Ok(()),
        LoadStatus::Failed(e) => Err(e.to_string()),
        LoadStatus::NotLoaded => state
            .registry
            .get_or_load(session.model)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
    };

    let html = page::render(&page::PageView {
        session: &session,
        device: state.registry.device(),
        model_status,
    });

    let mut response = Html(html).into_response();
    if created {
        if let Ok(value) = session_cookie(id).parse() {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

pub(super) async fn message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<MessageForm>,
) -> Response {
    if form.text.trim().is_empty() {
        let (id, _, created) = state.sessions.open(session_id(&headers));
        return back_to_index(id, created);
    }
    run_action(&state, &headers, |session| {
        chat::submit_text(session, &state.registry, &form.text)
    })
    .await
}

pub(super) async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let Some((file_name, payload)) = read_upload(multipart).await else {
        debug!("Upload form submitted without a file");
        let (id, _, created) = state.sessions.open(session_id(&headers));
        return back_to_index(id, created);
    };

    run_action(&state, &headers, |session| {
        chat::submit_pdf(session, &state.registry, &file_name, payload)
    })
    .await
}

pub(super) async fn select_model(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ModelForm>,
) -> Response {
    let choice = match form.model.parse::<ModelChoice>() {
        Ok(choice) => choice,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };
    // Loaded before the session lock is taken; the page then reports the
    // outcome through the registry status.
    if let Err(e) = state.registry.get_or_load(choice).await {
        debug!("Selected model {} is unavailable: {}", choice.label(), e);
    }
    run_action(&state, &headers, |session| async move {
        chat::select_model(session, choice)
    })
    .await
}

pub(super) async fn reset(State(state): State<AppState>, headers: HeaderMap) -> Response {
    run_action(&state, &headers, |session| async move { chat::reset(session) }).await
}

pub(super) async fn end_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_id(&headers) {
        state.sessions.end(id);
    }
    let expired = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    ([(header::SET_COOKIE, expired)], Redirect::to("/")).into_response()
}

/// Run one chat action against the caller's session, then redirect to `/`.
///
/// The session lock is held for the whole action, so two submissions from
/// the same browser are applied one after the other.
async fn run_action<F, Fut>(state: &AppState, headers: &HeaderMap, action: F) -> Response
where
    F: FnOnce(Session) -> Fut,
    Fut: Future<Output = Session>,
{
    let (id, cell, created) = state.sessions.open(session_id(headers));
    {
        let mut slot = cell.lock().await;
        let session = std::mem::take(&mut *slot);
        *slot = action(session).await;
    }
    back_to_index(id, created)
}

/// Pull the `file` field out of the upload form.
///
/// `None` when no file was chosen. A broken body still yields an entry so
/// the failure shows up in the transcript.
async fn read_upload(
    mut multipart: Multipart,
) -> Option<(String, Result<Vec<u8>, ExtractionError>)> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(e) => return Some((UNNAMED_UPLOAD.to_string(), Err(upload_error(e)))),
        };
        if field.name() != Some("file") {
            continue;
        }

        let file_name = base_name(field.file_name().unwrap_or_default()).to_string();
        if file_name.is_empty() {
            return None;
        }
        let bytes = field
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(upload_error);
        return Some((file_name, bytes));
    }
}

fn upload_error(e: MultipartError) -> ExtractionError {
    warn!("Multipart upload failed: {}", e);
    ExtractionError::Upload {
        detail: e.body_text(),
    }
}

/// Some browsers send the client-side path; keep only the last component.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}

fn session_id(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn session_cookie(id: SessionId) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

fn back_to_index(id: SessionId, created: bool) -> Response {
    if created {
        ([(header::SET_COOKIE, session_cookie(id))], Redirect::to("/")).into_response()
    } else {
        Redirect::to("/").into_response()
    }
}
