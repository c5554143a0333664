use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::client::ChatBackend;
use super::conversation::Turn;
use super::session::ChatSession;
use crate::error::{ChatError, ValidationError};
use crate::text::normalize;
use crate::tts::{SynthesisEngine, SynthesisJob, VoiceConfig};

/// Drives the placeholder-and-reconciliation protocol for chat sessions.
///
/// A session is `AwaitingReply` exactly when its last turn is an unresolved
/// placeholder; otherwise it is idle.
pub struct TurnController {
    backend: Arc<dyn ChatBackend>,
    engine: Arc<SynthesisEngine>,
    credential: Option<String>,
    playback_voice: VoiceConfig,
}

impl TurnController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        engine: Arc<SynthesisEngine>,
        credential: Option<String>,
        playback_voice: VoiceConfig,
    ) -> Self {
        let credential = credential.filter(|c| !c.trim().is_empty());
        if credential.is_none() {
            warn!("No chat API key configured; chat submissions will be rejected");
        }
        Self {
            backend,
            engine,
            credential,
            playback_voice,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Append the user's message and a reply placeholder.
    ///
    /// Returns the transcript so the caller can show the message before the
    /// reply exists. [`resolve_pending`](Self::resolve_pending) must run next.
    pub async fn submit(&self, session: &ChatSession, text: &str) -> Result<Vec<Turn>, ChatError> {
        let mut conversation = session.conversation.write().await;
        if conversation.awaiting_reply() {
            debug!("Session {} is awaiting a reply, rejecting submission", session.id());
            return Err(ChatError::AwaitingReply);
        }
        if self.credential.is_none() {
            return Err(ChatError::MissingCredential);
        }

        let sanitized = normalize(text).into_valid()?;
        if sanitized.cleaned().trim().is_empty() {
            return Err(ValidationError::Blank.into());
        }

        conversation.append_user(text.trim());
        conversation.append_assistant_placeholder()?;
        Ok(conversation.turns().to_vec())
    }

    /// Answer the pending placeholder, if any.
    ///
    /// Only one chat call per session runs at a time; a concurrent caller
    /// waits and then finds nothing pending.
    pub async fn resolve_pending(&self, session: &ChatSession) -> Result<Option<Turn>, ChatError> {
        let _gate = session.reply_gate.lock().await;

        let prompt = {
            let conversation = session.conversation.read().await;
            conversation.pending_prompt().map(str::to_string)
        };
        let Some(prompt) = prompt else {
            return Ok(None);
        };

        let reply = match &self.credential {
            Some(credential) => self.backend.send(&prompt, credential).await,
            None => ChatError::MissingCredential.to_string(),
        };

        let mut conversation = session.conversation.write().await;
        let index = conversation.resolve_latest_placeholder(reply).map_err(|e| {
            error!("Invariant violation in session {}: {}", session.id(), e);
            e
        })?;
        info!("Resolved reply at turn {} in session {}", index, session.id());
        Ok(conversation.turns().get(index).cloned())
    }

    /// Submit and wait for the reply.
    pub async fn converse(&self, session: &ChatSession, text: &str) -> Result<Vec<Turn>, ChatError> {
        self.submit(session, text).await?;
        self.resolve_pending(session).await?;
        Ok(session.turns().await)
    }

    /// Synthesize a finished assistant reply with the default playback voice.
    ///
    /// A failed synthesis comes back as a failed job; the transcript is never touched.
    pub async fn request_playback(
        &self,
        session: &ChatSession,
        turn_index: usize,
    ) -> Result<SynthesisJob, ChatError> {
        let content = {
            let conversation = session.conversation.read().await;
            let turn = conversation
                .turns()
                .get(turn_index)
                .ok_or(ChatError::TurnOutOfRange(turn_index))?;
            if !turn.is_resolved_reply() {
                return Err(ChatError::TurnNotPlayable(turn_index));
            }
            turn.content.clone()
        };

        let job = self.engine.submit_for_turn(
            session.id(),
            turn_index,
            normalize(&content),
            self.playback_voice.clone(),
        )?;
        Ok(self.engine.synthesize(job).await)
    }
}
