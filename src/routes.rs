use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router<AppState> {
    let output_dir = state.engine.output_dir().to_path_buf();

    Router::new()
        // Health check
        .route("/api/health", get(handlers::health_check))

        // Speech synthesis
        .route("/api/voices", get(handlers::list_voices))
        .route("/api/tts", post(handlers::synthesize_speech))
        .route("/api/documents", post(handlers::extract_document))
        .route("/api/audio/:file_name", get(handlers::download_audio))

        // Chat
        .route("/api/chat/sessions", post(handlers::create_session))
        .route(
            "/api/chat/sessions/:session_id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/chat/sessions/:session_id/messages", post(handlers::post_message))
        .route(
            "/api/chat/sessions/:session_id/turns/:turn_index/audio",
            post(handlers::play_turn),
        )

        // Static audio serving
        .nest_service("/audio", ServeDir::new(output_dir))
}

/// The complete application with middleware and state attached.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
