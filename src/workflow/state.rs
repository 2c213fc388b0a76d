//! Reducer for the atelier composition workflow.
//!
//! Every input — user actions and async completions alike — is a
//! [`WorkflowEvent`] consumed by [`apply`], which mutates the owned
//! [`WorkflowState`] and hands back [`Effect`] commands for the engine to
//! execute. Timers and playback-end callbacks re-enter through the same
//! function, so the machine has a single entry point.

use crate::mail::MailIntent;
use crate::providers::ImageArtifact;

/// Stored as the draft when the text call fails. The original surface shows
/// this literal instead of a distinct error state, and it is not retried.
pub const DRAFT_FAILURE_PLACEHOLDER: &str = "Error";

/// Catalog category used for atelier commissions and recurring plans.
pub const BESPOKE_CATEGORY: &str = "bespoke";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// AI panel locked until the visitor consents. One-way.
    Gated,
    /// Consented, nothing composed yet.
    Idle,
    /// Text generation in flight.
    Composing,
    /// A draft (or its failure placeholder) is on display.
    Composed,
}

#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub phase: Phase,
    pub draft_text: Option<String>,
    pub image: Option<ImageArtifact>,
    pub is_rendering_image: bool,
    pub is_synthesizing_audio: bool,
    pub is_draft_copied: bool,
    pub recurring_prompt_visible: bool,
    pub consent_granted: bool,
    /// Monotonic id stamped on every issued call; completions carrying a
    /// stale id are discarded so an old response cannot overwrite newer state.
    composition_id: u64,
    /// Bumped on every copy so an earlier ack timer cannot clear a later ack.
    copy_ack_token: u64,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Gated,
            draft_text: None,
            image: None,
            is_rendering_image: false,
            is_synthesizing_audio: false,
            is_draft_copied: false,
            recurring_prompt_visible: false,
            consent_granted: false,
            composition_id: 0,
            copy_ack_token: 0,
        }
    }

    pub fn is_composing(&self) -> bool {
        self.phase == Phase::Composing
    }

    pub fn composition_id(&self) -> u64 {
        self.composition_id
    }

    fn draft(&self) -> Option<&str> {
        self.draft_text.as_deref().filter(|text| !text.is_empty())
    }
}

/// One input to the state machine: a user action or an async completion.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    // ── User actions ─────────────────────────────────────────────────────
    ConsentGranted,
    PromptSubmitted { text: String },
    ListenRequested,
    ImageRequested,
    CopyRequested,
    CommissionRequested,
    RecurringRequested,
    PersonalizeRequested { category: String },

    // ── Async completions, fed back by the engine ────────────────────────
    DraftReady { id: u64, text: String },
    DraftFailed { id: u64 },
    ImageReady { id: u64, artifact: ImageArtifact },
    ImageFailed { id: u64 },
    PlaybackFinished { id: u64 },
    SpeechFailed { id: u64 },
    RecurringDelayElapsed { id: u64 },
    CopyAckElapsed { token: u64 },
}

/// Side effect requested by a transition. Executed outside the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    IssueDraft { id: u64, prompt: String },
    IssueImage { id: u64, theme: String },
    IssueSpeech { id: u64, text: String },
    StartRecurringTimer { id: u64 },
    StartCopyAckTimer { token: u64 },
    CopyToClipboard { text: String },
    OpenMail { intent: MailIntent },
}

/// The single transition function.
#[allow(clippy::too_many_lines)]
pub fn apply(state: &mut WorkflowState, event: WorkflowEvent) -> Vec<Effect> {
    match event {
        WorkflowEvent::ConsentGranted => {
            if !state.consent_granted {
                state.consent_granted = true;
                state.phase = Phase::Idle;
            }
            Vec::new()
        }

        WorkflowEvent::PromptSubmitted { text } => {
            let prompt = text.trim();
            if !state.consent_granted || state.is_composing() || prompt.is_empty() {
                return Vec::new();
            }
            state.phase = Phase::Composing;
            state.draft_text = None;
            state.image = None;
            state.recurring_prompt_visible = false;
            state.composition_id += 1;
            vec![Effect::IssueDraft {
                id: state.composition_id,
                prompt: prompt.to_string(),
            }]
        }

        WorkflowEvent::DraftReady { id, text } => {
            if id != state.composition_id {
                return Vec::new();
            }
            state.phase = Phase::Composed;
            state.draft_text = Some(text);
            vec![Effect::StartRecurringTimer { id }]
        }

        WorkflowEvent::DraftFailed { id } => {
            if id != state.composition_id {
                return Vec::new();
            }
            state.phase = Phase::Composed;
            state.draft_text = Some(DRAFT_FAILURE_PLACEHOLDER.to_string());
            Vec::new()
        }

        WorkflowEvent::RecurringDelayElapsed { id } => {
            if id == state.composition_id && state.phase == Phase::Composed {
                state.recurring_prompt_visible = true;
            }
            Vec::new()
        }

        WorkflowEvent::ListenRequested => {
            let Some(draft) = state.draft().map(str::to_string) else {
                return Vec::new();
            };
            if state.is_synthesizing_audio {
                return Vec::new();
            }
            state.is_synthesizing_audio = true;
            vec![Effect::IssueSpeech {
                id: state.composition_id,
                text: draft,
            }]
        }

        // The loading flag doubles as the single-flight guard, so a stale
        // completion must still release it; only the artifact is id-gated.
        WorkflowEvent::PlaybackFinished { id: _ } | WorkflowEvent::SpeechFailed { id: _ } => {
            state.is_synthesizing_audio = false;
            Vec::new()
        }

        WorkflowEvent::ImageRequested => {
            let Some(draft) = state.draft().map(str::to_string) else {
                return Vec::new();
            };
            if state.is_rendering_image {
                return Vec::new();
            }
            state.is_rendering_image = true;
            vec![Effect::IssueImage {
                id: state.composition_id,
                theme: draft,
            }]
        }

        WorkflowEvent::ImageReady { id, artifact } => {
            state.is_rendering_image = false;
            if id == state.composition_id {
                state.image = Some(artifact);
            }
            Vec::new()
        }

        WorkflowEvent::ImageFailed { id: _ } => {
            state.is_rendering_image = false;
            Vec::new()
        }

        WorkflowEvent::CopyRequested => {
            let Some(draft) = state.draft().map(str::to_string) else {
                return Vec::new();
            };
            state.is_draft_copied = true;
            state.copy_ack_token += 1;
            vec![
                Effect::CopyToClipboard {
                    text: draft,
                },
                Effect::StartCopyAckTimer {
                    token: state.copy_ack_token,
                },
            ]
        }

        WorkflowEvent::CopyAckElapsed { token } => {
            if token == state.copy_ack_token {
                state.is_draft_copied = false;
            }
            Vec::new()
        }

        WorkflowEvent::CommissionRequested => {
            let Some(draft) = state.draft() else {
                return Vec::new();
            };
            vec![Effect::OpenMail {
                intent: MailIntent {
                    category: BESPOKE_CATEGORY.to_string(),
                    recurring: false,
                    draft: Some(draft.to_string()),
                },
            }]
        }

        WorkflowEvent::RecurringRequested => {
            if !state.recurring_prompt_visible {
                return Vec::new();
            }
            vec![Effect::OpenMail {
                intent: MailIntent {
                    category: BESPOKE_CATEGORY.to_string(),
                    recurring: true,
                    draft: state.draft().map(str::to_string),
                },
            }]
        }

        // Catalog "personalize" buttons live outside the gated panel.
        WorkflowEvent::PersonalizeRequested { category } => {
            vec![Effect::OpenMail {
                intent: MailIntent {
                    category,
                    recurring: false,
                    draft: None,
                },
            }]
        }
    }
}
