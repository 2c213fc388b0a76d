//! Async driver for the workflow reducer. Owns the state, executes effects by
//! spawning provider calls and timers, and feeds their completions back into
//! the same event stream the user actions arrive on.

use super::state::{self, Effect, WorkflowEvent, WorkflowState};
use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::language::Language;
use crate::mail;
use crate::playback::SpeechPlayer;
use crate::providers::{DraftComposer, ImageRenderer, SpeechSynthesizer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Boundary collaborators the engine talks to.
pub struct Services {
    pub composer: Arc<dyn DraftComposer>,
    pub renderer: Arc<dyn ImageRenderer>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub player: Arc<dyn SpeechPlayer>,
    pub clipboard: Arc<dyn Clipboard>,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub language: Language,
    pub atelier_address: String,
    pub recurring_offer_delay: Duration,
    pub copy_ack_reset: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            language: config.language,
            atelier_address: config.atelier_address.clone(),
            recurring_offer_delay: Duration::from_millis(config.recurring_offer_delay_ms),
            copy_ack_reset: Duration::from_millis(config.copy_ack_reset_ms),
        }
    }
}

/// Single-consumer workflow engine for one atelier session.
///
/// In-flight calls are never cancelled; a call that outlives its composition
/// completes into the event stream and is discarded there by the reducer's
/// id check.
pub struct Engine {
    state: WorkflowState,
    settings: EngineSettings,
    services: Services,
    tx: mpsc::UnboundedSender<WorkflowEvent>,
    rx: mpsc::UnboundedReceiver<WorkflowEvent>,
}

impl Engine {
    pub fn new(services: Services, settings: EngineSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: WorkflowState::new(),
            settings,
            services,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn language(&self) -> Language {
        self.settings.language
    }

    /// Feed one event through the reducer and run the effects it requests.
    pub fn dispatch(&mut self, event: WorkflowEvent) {
        debug!(?event, "workflow event");
        let effects = state::apply(&mut self.state, event);
        for effect in effects {
            self.execute(effect);
        }
    }

    /// Wait for the next completion event and apply it. Returns the event so
    /// callers can observe what happened.
    pub async fn next(&mut self) -> Option<WorkflowEvent> {
        let event = self.rx.recv().await?;
        self.dispatch(event.clone());
        Some(event)
    }

    /// Pump completion events until the predicate holds on the state.
    pub async fn wait_until<F>(&mut self, predicate: F)
    where
        F: Fn(&WorkflowState) -> bool,
    {
        while !predicate(&self.state) {
            if self.next().await.is_none() {
                return;
            }
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::IssueDraft { id, prompt } => {
                let composer = Arc::clone(&self.services.composer);
                let language = self.settings.language;
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let event = match composer.compose(&prompt, language).await {
                        Ok(text) => WorkflowEvent::DraftReady { id, text },
                        Err(err) => {
                            warn!("draft generation failed: {err:#}");
                            WorkflowEvent::DraftFailed { id }
                        }
                    };
                    let _ = tx.send(event);
                });
            }

            Effect::IssueImage { id, theme } => {
                let renderer = Arc::clone(&self.services.renderer);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let event = match renderer.render(&theme).await {
                        Ok(artifact) => WorkflowEvent::ImageReady { id, artifact },
                        Err(err) => {
                            warn!("image rendering failed: {err:#}");
                            WorkflowEvent::ImageFailed { id }
                        }
                    };
                    let _ = tx.send(event);
                });
            }

            Effect::IssueSpeech { id, text } => {
                let synthesizer = Arc::clone(&self.services.synthesizer);
                let player = Arc::clone(&self.services.player);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    match synthesizer.synthesize(&text).await {
                        Ok(clip) => {
                            // the flag stays up for network + playback; only
                            // the end-of-playback signal releases it
                            let (done_tx, done_rx) = oneshot::channel();
                            player.play(clip, done_tx);
                            let _ = done_rx.await;
                            let _ = tx.send(WorkflowEvent::PlaybackFinished { id });
                        }
                        Err(err) => {
                            warn!("speech synthesis failed: {err:#}");
                            let _ = tx.send(WorkflowEvent::SpeechFailed { id });
                        }
                    }
                });
            }

            Effect::StartRecurringTimer { id } => {
                let delay = self.settings.recurring_offer_delay;
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(WorkflowEvent::RecurringDelayElapsed { id });
                });
            }

            Effect::StartCopyAckTimer { token } => {
                let delay = self.settings.copy_ack_reset;
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(WorkflowEvent::CopyAckElapsed { token });
                });
            }

            Effect::CopyToClipboard { text } => {
                let clipboard = Arc::clone(&self.services.clipboard);
                tokio::spawn(async move {
                    if let Err(err) = clipboard.copy(&text).await {
                        warn!("clipboard copy failed: {err:#}");
                    }
                });
            }

            Effect::OpenMail { intent } => {
                let message = mail::build_mail_message(self.settings.language, &intent);
                let uri = message.mailto_uri(&self.settings.atelier_address);
                if let Err(err) = mail::open_mail_client(&uri) {
                    warn!("mail handoff failed: {err:#}");
                }
            }
        }
    }
}
