pub mod gemini;
mod gemini_types;
pub mod http_client;
pub mod traits;

pub use gemini::{GeminiStudio, TTS_SAMPLE_RATE, decode_pcm16};
pub use traits::{DraftComposer, ImageArtifact, ImageRenderer, SpeechClip, SpeechSynthesizer};
