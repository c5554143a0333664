use std::sync::Arc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::chat::{ChatBackend, ChatSession, MistralClient, TurnController};
use crate::config::Config;
use crate::tts::{SynthesisBackend, SynthesisEngine, TTSFactory, VoiceCatalog};

/// Voice used when replaying chat replies: US English at normal speed.
pub const PLAYBACK_VOICE_TAG: &str = "en-us";
pub const PLAYBACK_SPEED: &str = "Normal";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<VoiceCatalog>,
    pub engine: Arc<SynthesisEngine>,
    pub controller: Arc<TurnController>,
    pub sessions: Arc<DashMap<String, Arc<ChatSession>>>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let backend = TTSFactory::create_backend(&config.tts_config)?;
        let catalog = TTSFactory::create_catalog(&config.tts_config).await;
        let chat = Arc::new(MistralClient::from_config(&config.chat_config));
        Ok(Self::from_parts(config, backend, catalog, chat))
    }

    /// Assemble state from already-built backends.
    pub fn from_parts(
        config: Config,
        backend: Arc<dyn SynthesisBackend>,
        catalog: VoiceCatalog,
        chat: Arc<dyn ChatBackend>,
    ) -> Self {
        let engine = Arc::new(SynthesisEngine::new(backend, config.system_config.output_path()));
        let playback_tag = if catalog.list_options().iter().any(|o| o.tag == PLAYBACK_VOICE_TAG) {
            PLAYBACK_VOICE_TAG.to_string()
        } else {
            catalog.default_tag().to_string()
        };
        let playback_voice = catalog.resolve(&playback_tag, PLAYBACK_SPEED);
        let controller = Arc::new(TurnController::new(
            chat,
            engine.clone(),
            config.chat_config.api_key.clone(),
            playback_voice,
        ));

        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            engine,
            controller,
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn create_session(&self) -> Arc<ChatSession> {
        let session = Arc::new(ChatSession::new(Uuid::new_v4().simple().to_string()));
        self.sessions.insert(session.id().to_string(), session.clone());
        session
    }

    pub fn session(&self, id: &str) -> Option<Arc<ChatSession>> {
        self.sessions.get(id).map(|e| e.value().clone())
    }

    pub fn end_session(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }
}
