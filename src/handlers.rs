use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{error, info, warn};

use crate::error::{ChatError, ValidationError};
use crate::state::AppState;
use crate::text::{extract, normalize};
use crate::tts::{JobStatus, SynthesisJob};

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, ApiError>;

const PREVIEW_CHARS: usize = 500;

fn api_error(status: StatusCode, key: &str, message: impl ToString) -> ApiError {
    (status, Json(json!({ key: message.to_string() })))
}

fn validation_error(err: ValidationError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "warning", err)
}

fn chat_error(err: ChatError) -> ApiError {
    let status = match &err {
        ChatError::AwaitingReply => StatusCode::CONFLICT,
        ChatError::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
        ChatError::Invalid(_) | ChatError::TurnNotPlayable(_) => StatusCode::BAD_REQUEST,
        ChatError::TurnOutOfRange(_) => StatusCode::NOT_FOUND,
        ChatError::Conversation(e) => {
            error!("Conversation invariant violated: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let key = if matches!(err, ChatError::Invalid(_)) { "warning" } else { "error" };
    api_error(status, key, err)
}

fn session_not_found(session_id: &str) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        "error",
        format!("Unknown chat session: {}", session_id),
    )
}

fn job_response(job: SynthesisJob) -> ApiResult {
    let file_name = job.file_name().unwrap_or_default().to_string();
    match job.status() {
        JobStatus::Succeeded => Ok(Json(json!({
            "job": job,
            "audio_url": format!("/audio/{}", file_name),
            "download_url": format!("/api/audio/{}", file_name),
        }))),
        _ => Err((
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": job.error().unwrap_or("Speech synthesis failed."),
                "job": job,
            })),
        )),
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "tts_backend": state.engine.backend_name(),
        "chat_configured": state.controller.has_credential(),
    }))
}

pub async fn list_voices(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "voices": state.catalog.list_options(),
        "speeds": state.catalog.speed_options(),
        "default_voice": state.catalog.default_tag(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub volume: Option<f32>,
}

pub async fn synthesize_speech(
    State(state): State<AppState>,
    Json(request): Json<SpeechRequest>,
) -> ApiResult {
    let text = normalize(&request.text).into_valid().map_err(validation_error)?;
    if text.cleaned().trim().is_empty() {
        return Err(validation_error(ValidationError::Blank));
    }

    let voice = request
        .voice
        .unwrap_or_else(|| state.catalog.default_tag().to_string());
    let speed = request.speed.unwrap_or_else(|| "Normal".to_string());
    let config = state.catalog.resolve(&voice, &speed).with_volume(request.volume);

    let job = state.engine.submit(text, config).map_err(validation_error)?;
    info!("Submitted synthesis job {} (voice={}, speed={})", job.id(), voice, speed);
    job_response(state.engine.synthesize(job).await)
}

pub async fn extract_document(mut multipart: Multipart) -> ApiResult {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "error", e))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, "error", e))?;

        let text = extract(&bytes, content_type.as_deref(), file_name.as_deref()).map_err(|e| {
            warn!("Document extraction failed: {}", e);
            api_error(StatusCode::UNPROCESSABLE_ENTITY, "error", e)
        })?;
        let preview: String = text.chars().take(PREVIEW_CHARS).collect();
        info!("Loaded {} characters from {:?}", text.chars().count(), file_name);

        return Ok(Json(json!({
            "characters": text.chars().count(),
            "preview": preview,
            "text": text,
        })));
    }

    Err(api_error(StatusCode::BAD_REQUEST, "error", "No document provided"))
}

fn is_safe_audio_name(file_name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]+\.(mp3|wav)$").expect("valid file name regex"));
    file_name.len() <= 255 && pattern.is_match(file_name)
}

pub async fn download_audio(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    if !is_safe_audio_name(&file_name) {
        return Err(api_error(StatusCode::BAD_REQUEST, "error", "Invalid audio file name"));
    }

    let path: PathBuf = state.engine.output_dir().join(&file_name);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| api_error(StatusCode::NOT_FOUND, "error", "Audio file not found"))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("mp3").to_string();
    let mime = if ext == "wav" { "audio/wav" } else { "audio/mpeg" };
    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"speech.{}\"", ext)),
        ],
        bytes,
    )
        .into_response())
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let session = state.create_session();
    info!("Created chat session {}", session.id());
    (StatusCode::CREATED, Json(json!({ "session_id": session.id() })))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult {
    let session = state
        .session(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;
    let conversation = session.conversation.read().await;
    Ok(Json(json!({
        "session_id": session.id(),
        "turns": conversation.turns(),
        "awaiting_reply": conversation.awaiting_reply(),
    })))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.end_session(&session_id) {
        info!("Ended chat session {}", session_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(&session_id))
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Accept a user message and schedule the reply.
///
/// Responds as soon as the user turn and the placeholder are in the
/// transcript; the reply fills the placeholder in the background.
pub async fn post_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let session = state
        .session(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;
    let turns = state
        .controller
        .submit(&session, &request.text)
        .await
        .map_err(chat_error)?;

    let controller = state.controller.clone();
    let pending = session.clone();
    tokio::spawn(async move {
        if let Err(e) = controller.resolve_pending(&pending).await {
            error!("Failed to resolve reply for session {}: {}", pending.id(), e);
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "session_id": session.id(),
            "turns": turns,
            "awaiting_reply": true,
        })),
    ))
}

pub async fn play_turn(
    State(state): State<AppState>,
    Path((session_id, turn_index)): Path<(String, usize)>,
) -> ApiResult {
    let session = state
        .session(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;
    let job = state
        .controller
        .request_playback(&session, turn_index)
        .await
        .map_err(chat_error)?;
    job_response(job)
}
