use crate::language::Language;
use async_trait::async_trait;
use std::time::Duration;

/// A generated background image, kept as the wire payload (base64) so it can
/// be handed to any surface as a data URI without re-encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub mime_type: String,
    pub data: String,
}

impl ImageArtifact {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Synthesized speech: raw 16-bit PCM, mono.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl SpeechClip {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}

/// Drafts the greeting message from the visitor's prompt.
#[async_trait]
pub trait DraftComposer: Send + Sync {
    async fn compose(&self, prompt: &str, language: Language) -> anyhow::Result<String>;
}

/// Renders the 16:9 artistic background for a composed draft.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn render(&self, theme: &str) -> anyhow::Result<ImageArtifact>;
}

/// Reads a composed draft aloud.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> anyhow::Result<SpeechClip>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_embeds_mime_and_payload() {
        let artifact = ImageArtifact {
            mime_type: "image/png".into(),
            data: "aGVsbG8=".into(),
        };
        assert_eq!(artifact.data_uri(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn clip_duration_from_sample_count() {
        let clip = SpeechClip {
            samples: vec![0; 24_000],
            sample_rate: 24_000,
        };
        assert_eq!(clip.duration(), Duration::from_secs(1));
    }

    #[test]
    fn zero_rate_clip_has_zero_duration() {
        let clip = SpeechClip {
            samples: vec![0; 100],
            sample_rate: 0,
        };
        assert_eq!(clip.duration(), Duration::ZERO);
    }
}
