use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

use super::error::ServerError;
use super::models::{
    CredentialBody, CredentialStatus, DictationBody, DictationResponse, EnhanceBody, Sequenced,
    TextBody, TranslateBody, TranslateResponse,
};
use super::state::{SURFACES, ServerState};
use crate::enhancement::{Enhancement, GrammarExplanation, ModelReply, PronunciationHelp};
use crate::history::HistoryEntry;
use crate::sequence::RequestSequencer;
use crate::session::Session;
use crate::settings::Preferences;

pub async fn run_server(session: Arc<Session>, addr: String) -> Result<()> {
    let app = router(Arc::new(ServerState::new(session)));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| "failed to bind server address")?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/translate", post(translate))
        .route("/dictation", post(dictation))
        .route("/enhance", post(enhance))
        .route("/grammar", post(grammar))
        .route("/pronunciation", post(pronunciation))
        .route("/histories", get(histories).delete(clear_histories))
        .route("/settings", get(preferences).put(update_preferences))
        .route("/credential", put(set_credential).delete(clear_credential))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "credential": state.session.has_credential()
        })),
    )
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
}

async fn translate(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<TranslateBody>,
) -> Result<Json<Sequenced<TranslateResponse>>, ServerError> {
    let sequencer = surface_sequencer(&state, body.surface.as_deref())?;
    let work = state
        .session
        .translate(&body.text, &body.source_lang, &body.target_lang);
    let outcome = match sequencer {
        Some(sequencer) => sequencer.latest(work).await,
        None => Some(work.await),
    };
    Ok(Json(match outcome {
        Some(translation) => Sequenced::Fresh(translation?.into()),
        None => Sequenced::stale(),
    }))
}

async fn dictation(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<DictationBody>,
) -> Result<Json<Sequenced<DictationResponse>>, ServerError> {
    let sequencer = surface_sequencer(&state, body.surface.as_deref())?;
    let work =
        state
            .session
            .translate_dictation(&body.events, &body.source_lang, &body.target_lang);
    let outcome = match sequencer {
        Some(sequencer) => sequencer.latest(work).await,
        None => Some(work.await),
    };
    let Some(dictation) = outcome else {
        return Ok(Json(Sequenced::stale()));
    };
    let dictation = dictation?;
    Ok(Json(Sequenced::Fresh(DictationResponse {
        transcript: dictation.transcript,
        translation: dictation.translation.into(),
        utterance: dictation.utterance,
    })))
}

async fn enhance(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<EnhanceBody>,
) -> Result<Json<ModelReply<Enhancement>>, ServerError> {
    if body.original_text.trim().is_empty() || body.translated_text.trim().is_empty() {
        return Err(ServerError::bad_request(
            "original_text and translated_text are required",
        ));
    }
    let reply = state
        .session
        .enhance(
            &body.original_text,
            &body.translated_text,
            &body.source_lang,
            &body.target_lang,
        )
        .await?;
    Ok(Json(reply))
}

async fn grammar(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<TextBody>,
) -> Result<Json<ModelReply<GrammarExplanation>>, ServerError> {
    require_text(&body.text)?;
    let reply = state.session.explain_grammar(&body.text, &body.lang).await?;
    Ok(Json(reply))
}

async fn pronunciation(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<TextBody>,
) -> Result<Json<ModelReply<PronunciationHelp>>, ServerError> {
    require_text(&body.text)?;
    let reply = state
        .session
        .pronunciation_help(&body.text, &body.lang)
        .await?;
    Ok(Json(reply))
}

async fn histories(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<Vec<HistoryEntry>>, ServerError> {
    Ok(Json(state.session.history().list()?))
}

async fn clear_histories(State(state): State<Arc<ServerState>>) -> Result<StatusCode, ServerError> {
    state.session.history().clear()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn preferences(State(state): State<Arc<ServerState>>) -> Json<Preferences> {
    Json(state.session.preferences())
}

async fn update_preferences(
    State(state): State<Arc<ServerState>>,
    Json(preferences): Json<Preferences>,
) -> Result<Json<Preferences>, ServerError> {
    state.session.update_preferences(preferences)?;
    Ok(Json(state.session.preferences()))
}

async fn set_credential(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<CredentialBody>,
) -> Result<Json<CredentialStatus>, ServerError> {
    require_text(&body.key)?;
    state.session.set_credential(&body.key)?;
    Ok(Json(CredentialStatus {
        configured: state.session.has_credential(),
    }))
}

async fn clear_credential(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<CredentialStatus>, ServerError> {
    state.session.clear_credential()?;
    Ok(Json(CredentialStatus {
        configured: state.session.has_credential(),
    }))
}

fn surface_sequencer<'a>(
    state: &'a ServerState,
    surface: Option<&str>,
) -> Result<Option<&'a RequestSequencer>, ServerError> {
    let Some(surface) = surface.filter(|surface| !surface.trim().is_empty()) else {
        return Ok(None);
    };
    state.sequencer(surface).map(Some).ok_or_else(|| {
        ServerError::bad_request(format!(
            "unknown surface '{}', expected one of: {}",
            surface.trim(),
            SURFACES.join(", ")
        ))
    })
}

fn require_text(value: &str) -> Result<(), ServerError> {
    if value.trim().is_empty() {
        Err(ServerError::bad_request("text is empty"))
    } else {
        Ok(())
    }
}
