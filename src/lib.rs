#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en");

pub mod clipboard;
pub mod config;
pub mod language;
pub mod mail;
pub mod playback;
pub mod providers;
pub mod workflow;

pub use config::Config;
pub use language::Language;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Omaggio.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum OmaggioError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Generation services ─────────────────────────────────────────────
    #[error("compose: {0}")]
    Compose(#[from] ComposeError),

    // ── Mail handoff ────────────────────────────────────────────────────
    #[error("mail: {0}")]
    Mail(#[from] MailError),

    // ── Speech playback ─────────────────────────────────────────────────
    #[error("playback: {0}")]
    Playback(#[from] PlaybackError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("failed to save config: {0}")]
    Save(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Generation service errors ──────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("{service} request failed: {message}")]
    Request { service: String, message: String },

    #[error(
        "{service} authentication failed (set GEMINI_API_KEY or api_key in ~/.omaggio/config.toml)"
    )]
    Auth { service: String },

    #[error("{service} returned no usable content")]
    EmptyResponse { service: String },
}

// ─── Mail handoff errors ────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to launch mail client: {0}")]
    Opener(String),
}

// ─── Playback errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device available")]
    NoDevice,

    #[error("output stream failed: {0}")]
    Stream(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, OmaggioError>;
