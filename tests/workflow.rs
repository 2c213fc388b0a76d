//! Engine-level workflow tests with scripted generation services.
//!
//! Time is paused, so the 800 ms recurring offer and the 2 s copy window are
//! exercised deterministically.

use async_trait::async_trait;
use omaggio::Language;
use omaggio::clipboard::Clipboard;
use omaggio::playback::NoopPlayer;
use omaggio::providers::{
    DraftComposer, ImageArtifact, ImageRenderer, SpeechClip, SpeechSynthesizer,
};
use omaggio::workflow::{
    DRAFT_FAILURE_PLACEHOLDER, Engine, EngineSettings, Services, WorkflowEvent,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

// ── Scripted collaborators ───────────────────────────────────────────────

struct ScriptedComposer {
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Language)>>,
    script: Mutex<VecDeque<(Duration, Result<String, String>)>>,
}

impl ScriptedComposer {
    fn new(script: Vec<(Duration, Result<String, String>)>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    fn instant(text: &str) -> Self {
        Self::new(vec![(Duration::ZERO, Ok(text.to_string()))])
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DraftComposer for ScriptedComposer {
    async fn compose(&self, prompt: &str, language: Language) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .await
            .push((prompt.to_string(), language));
        let (delay, outcome) = self
            .script
            .lock()
            .await
            .pop_front()
            .expect("unscripted compose call");
        tokio::time::sleep(delay).await;
        outcome.map_err(|message| anyhow::anyhow!(message))
    }
}

struct ScriptedRenderer {
    delay: Duration,
    outcome: Result<ImageArtifact, String>,
}

impl ScriptedRenderer {
    fn ok(delay: Duration) -> Self {
        Self {
            delay,
            outcome: Ok(ImageArtifact {
                mime_type: "image/png".into(),
                data: "cGl4ZWxz".into(),
            }),
        }
    }

    fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err("no pigment".into()),
        }
    }
}

#[async_trait]
impl ImageRenderer for ScriptedRenderer {
    async fn render(&self, _theme: &str) -> anyhow::Result<ImageArtifact> {
        tokio::time::sleep(self.delay).await;
        self.outcome
            .clone()
            .map_err(|message| anyhow::anyhow!(message))
    }
}

struct ScriptedSynthesizer {
    fail: bool,
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, _text: &str) -> anyhow::Result<SpeechClip> {
        if self.fail {
            anyhow::bail!("voice unavailable");
        }
        Ok(SpeechClip {
            samples: vec![0; 2400],
            sample_rate: 24_000,
        })
    }
}

struct RecordingClipboard {
    copied: Mutex<Vec<String>>,
}

impl RecordingClipboard {
    fn new() -> Self {
        Self {
            copied: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Clipboard for RecordingClipboard {
    async fn copy(&self, text: &str) -> anyhow::Result<()> {
        self.copied.lock().await.push(text.to_string());
        Ok(())
    }
}

// ── Harness ──────────────────────────────────────────────────────────────

fn settings() -> EngineSettings {
    EngineSettings {
        language: Language::En,
        atelier_address: "atelier@example.com".into(),
        recurring_offer_delay: Duration::from_millis(800),
        copy_ack_reset: Duration::from_millis(2000),
    }
}

fn engine_with(
    composer: Arc<ScriptedComposer>,
    renderer: Arc<ScriptedRenderer>,
    synthesizer: Arc<ScriptedSynthesizer>,
    clipboard: Arc<RecordingClipboard>,
) -> Engine {
    let services = Services {
        composer,
        renderer,
        synthesizer,
        player: Arc::new(NoopPlayer),
        clipboard,
    };
    Engine::new(services, settings())
}

fn default_engine(composer: Arc<ScriptedComposer>) -> Engine {
    engine_with(
        composer,
        Arc::new(ScriptedRenderer::ok(Duration::ZERO)),
        Arc::new(ScriptedSynthesizer { fail: false }),
        Arc::new(RecordingClipboard::new()),
    )
}

fn submit(engine: &mut Engine, text: &str) {
    engine.dispatch(WorkflowEvent::PromptSubmitted { text: text.into() });
}

async fn no_more_events(engine: &mut Engine) -> bool {
    tokio::time::timeout(Duration::from_secs(60), engine.next())
        .await
        .is_err()
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn whitespace_prompt_issues_no_call() {
    let composer = Arc::new(ScriptedComposer::new(vec![]));
    let mut engine = default_engine(composer.clone());
    engine.dispatch(WorkflowEvent::ConsentGranted);

    submit(&mut engine, "   \n\t ");
    assert!(!engine.state().is_composing());
    assert_eq!(composer.call_count(), 0);
    assert!(no_more_events(&mut engine).await);
}

#[tokio::test(start_paused = true)]
async fn successful_composition_then_recurring_offer() {
    let composer = Arc::new(ScriptedComposer::instant("A luminous ninety years."));
    let mut engine = default_engine(composer.clone());
    engine.dispatch(WorkflowEvent::ConsentGranted);

    submit(&mut engine, "a grandmother's 90th birthday, joyful and warm");
    assert!(engine.state().is_composing());

    let event = engine.next().await.expect("draft event");
    assert!(matches!(event, WorkflowEvent::DraftReady { .. }));
    assert_eq!(
        engine.state().draft_text.as_deref(),
        Some("A luminous ninety years.")
    );
    assert!(!engine.state().recurring_prompt_visible);

    // the offer lands on its own, ~800ms later
    let event = engine.next().await.expect("recurring event");
    assert!(matches!(event, WorkflowEvent::RecurringDelayElapsed { .. }));
    assert!(engine.state().recurring_prompt_visible);

    let seen = composer.seen.lock().await;
    assert_eq!(
        seen.as_slice(),
        &[(
            "a grandmother's 90th birthday, joyful and warm".to_string(),
            Language::En
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_composition_shows_placeholder_and_never_offers_recurring() {
    let composer = Arc::new(ScriptedComposer::new(vec![(
        Duration::ZERO,
        Err("503 from upstream".into()),
    )]));
    let mut engine = default_engine(composer);
    engine.dispatch(WorkflowEvent::ConsentGranted);

    submit(&mut engine, "anything");
    let event = engine.next().await.expect("failure event");
    assert!(matches!(event, WorkflowEvent::DraftFailed { .. }));
    assert_eq!(
        engine.state().draft_text.as_deref(),
        Some(DRAFT_FAILURE_PLACEHOLDER)
    );
    assert!(no_more_events(&mut engine).await);
    assert!(!engine.state().recurring_prompt_visible);
}

#[tokio::test(start_paused = true)]
async fn resubmission_clears_image_and_drops_stale_render() {
    let composer = Arc::new(ScriptedComposer::new(vec![
        (Duration::ZERO, Ok("first".into())),
        (Duration::ZERO, Ok("second".into())),
    ]));
    // the render outlives the second composition
    let renderer = Arc::new(ScriptedRenderer::ok(Duration::from_secs(30)));
    let mut engine = engine_with(
        composer,
        renderer,
        Arc::new(ScriptedSynthesizer { fail: false }),
        Arc::new(RecordingClipboard::new()),
    );
    engine.dispatch(WorkflowEvent::ConsentGranted);

    submit(&mut engine, "first idea");
    engine.wait_until(|state| !state.is_composing()).await;
    engine.dispatch(WorkflowEvent::ImageRequested);
    assert!(engine.state().is_rendering_image);

    submit(&mut engine, "second idea");
    assert!(engine.state().image.is_none());
    engine
        .wait_until(|state| state.draft_text.as_deref() == Some("second"))
        .await;

    // the slow render finally completes for the old composition
    engine
        .wait_until(|state| !state.is_rendering_image)
        .await;
    assert!(engine.state().image.is_none());
}

#[tokio::test(start_paused = true)]
async fn image_failure_is_silent() {
    let composer = Arc::new(ScriptedComposer::instant("draft"));
    let mut engine = engine_with(
        composer,
        Arc::new(ScriptedRenderer::failing()),
        Arc::new(ScriptedSynthesizer { fail: false }),
        Arc::new(RecordingClipboard::new()),
    );
    engine.dispatch(WorkflowEvent::ConsentGranted);
    submit(&mut engine, "idea");
    engine.wait_until(|state| !state.is_composing()).await;

    engine.dispatch(WorkflowEvent::ImageRequested);
    engine.wait_until(|state| !state.is_rendering_image).await;
    assert!(engine.state().image.is_none());
    assert_eq!(engine.state().draft_text.as_deref(), Some("draft"));
}

#[tokio::test(start_paused = true)]
async fn listen_flag_spans_synthesis_and_playback() {
    let composer = Arc::new(ScriptedComposer::instant("draft"));
    let mut engine = default_engine(composer);
    engine.dispatch(WorkflowEvent::ConsentGranted);
    submit(&mut engine, "idea");
    engine.wait_until(|state| !state.is_composing()).await;

    engine.dispatch(WorkflowEvent::ListenRequested);
    assert!(engine.state().is_synthesizing_audio);

    engine
        .wait_until(|state| !state.is_synthesizing_audio)
        .await;
}

#[tokio::test(start_paused = true)]
async fn speech_failure_clears_flag_without_touching_draft() {
    let composer = Arc::new(ScriptedComposer::instant("draft"));
    let mut engine = engine_with(
        composer,
        Arc::new(ScriptedRenderer::ok(Duration::ZERO)),
        Arc::new(ScriptedSynthesizer { fail: true }),
        Arc::new(RecordingClipboard::new()),
    );
    engine.dispatch(WorkflowEvent::ConsentGranted);
    submit(&mut engine, "idea");
    engine.wait_until(|state| !state.is_composing()).await;

    engine.dispatch(WorkflowEvent::ListenRequested);
    engine
        .wait_until(|state| !state.is_synthesizing_audio)
        .await;
    assert_eq!(engine.state().draft_text.as_deref(), Some("draft"));
}

#[tokio::test(start_paused = true)]
async fn image_and_audio_run_concurrently() {
    let composer = Arc::new(ScriptedComposer::instant("draft"));
    let mut engine = engine_with(
        composer,
        Arc::new(ScriptedRenderer::ok(Duration::from_millis(100))),
        Arc::new(ScriptedSynthesizer { fail: false }),
        Arc::new(RecordingClipboard::new()),
    );
    engine.dispatch(WorkflowEvent::ConsentGranted);
    submit(&mut engine, "idea");
    engine.wait_until(|state| !state.is_composing()).await;

    engine.dispatch(WorkflowEvent::ImageRequested);
    engine.dispatch(WorkflowEvent::ListenRequested);
    assert!(engine.state().is_rendering_image);
    assert!(engine.state().is_synthesizing_audio);

    engine
        .wait_until(|state| !state.is_rendering_image && !state.is_synthesizing_audio)
        .await;
    assert!(engine.state().image.is_some());
}

#[tokio::test(start_paused = true)]
async fn copy_ack_restarts_instead_of_stacking() {
    let composer = Arc::new(ScriptedComposer::instant("testo da copiare"));
    let clipboard = Arc::new(RecordingClipboard::new());
    let mut engine = engine_with(
        composer,
        Arc::new(ScriptedRenderer::ok(Duration::ZERO)),
        Arc::new(ScriptedSynthesizer { fail: false }),
        clipboard.clone(),
    );
    engine.dispatch(WorkflowEvent::ConsentGranted);
    submit(&mut engine, "idea");
    engine.wait_until(|state| !state.is_composing()).await;
    engine
        .wait_until(|state| state.recurring_prompt_visible)
        .await;

    // first copy at t0, second at t0+1s
    engine.dispatch(WorkflowEvent::CopyRequested);
    assert!(engine.state().is_draft_copied);
    tokio::time::advance(Duration::from_secs(1)).await;
    engine.dispatch(WorkflowEvent::CopyRequested);

    // first window elapses at t0+2s: ack must survive it
    let event = engine.next().await.expect("first ack timer");
    assert!(matches!(event, WorkflowEvent::CopyAckElapsed { .. }));
    assert!(engine.state().is_draft_copied);

    // second window elapses at t0+3s
    let event = engine.next().await.expect("second ack timer");
    assert!(matches!(event, WorkflowEvent::CopyAckElapsed { .. }));
    assert!(!engine.state().is_draft_copied);

    let copied = clipboard.copied.lock().await;
    assert_eq!(copied.as_slice(), &["testo da copiare", "testo da copiare"]);
}

#[tokio::test(start_paused = true)]
async fn second_submit_while_composing_is_ignored() {
    let composer = Arc::new(ScriptedComposer::new(vec![(
        Duration::from_secs(5),
        Ok("slow draft".into()),
    )]));
    let mut engine = default_engine(composer.clone());
    engine.dispatch(WorkflowEvent::ConsentGranted);

    submit(&mut engine, "one");
    submit(&mut engine, "two");
    engine.wait_until(|state| !state.is_composing()).await;

    assert_eq!(composer.call_count(), 1);
    assert_eq!(engine.state().draft_text.as_deref(), Some("slow draft"));
}
