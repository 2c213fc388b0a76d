//! Google Gemini client backing all three atelier services: message drafting,
//! background image rendering, and speech synthesis. One HTTP client, three
//! models, all through the `generateContent` endpoint.

use crate::ComposeError;
use crate::config::Config;
use crate::language::Language;
use crate::providers::http_client::build_provider_client;
use crate::providers::traits::{
    DraftComposer, ImageArtifact, ImageRenderer, SpeechClip, SpeechSynthesizer,
};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;

use super::gemini_types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, ImageConfig, Part,
    PrebuiltVoiceConfig, ResponsePart, SpeechConfig, VoiceConfig,
};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini TTS returns raw PCM16 at a fixed rate, mono.
pub const TTS_SAMPLE_RATE: u32 = 24_000;

const COMPOSER_INSTRUCTION: &str = "You are an elite greeting card copywriter for a high-end \
     agency. Focus on luxury, sincerity and timelessness.";

/// Gemini-backed studio implementing all three generation seams.
pub struct GeminiStudio {
    api_key: Option<String>,
    base_url: String,
    text_model: String,
    image_model: String,
    tts_model: String,
    voice: String,
    temperature: f64,
    client: Client,
}

impl GeminiStudio {
    /// Create a studio from config.
    ///
    /// API key priority: explicit config value, then `GEMINI_API_KEY`, then
    /// `GOOGLE_API_KEY`.
    pub fn new(config: &Config) -> Self {
        let resolved_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok());

        Self {
            api_key: resolved_key,
            base_url: GEMINI_BASE_URL.to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            tts_model: config.tts_model.clone(),
            voice: config.voice.clone(),
            temperature: config.temperature,
            client: build_provider_client(),
        }
    }

    /// Point the studio at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url: String = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    async fn call_api(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ComposeError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| ComposeError::Auth {
            service: model.to_string(),
        })?;

        let request_failed = |message: String| ComposeError::Request {
            service: model.to_string(),
            message,
        };

        let model_path = Self::model_path(model);
        let url = format!(
            "{}/v1beta/{model_path}:generateContent?key={api_key}",
            self.base_url
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| request_failed(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(request_failed(format!("{status}: {error_text}")));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| request_failed(err.to_string()))?;

        if let Some(err) = result.error.as_ref() {
            return Err(request_failed(err.message.clone()));
        }

        Ok(result)
    }

    fn first_candidate_parts(result: GenerateContentResponse) -> Vec<ResponsePart> {
        result
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|candidate| candidate.content.parts)
            .unwrap_or_default()
    }

    fn user_content(text: String) -> Content {
        Content {
            role: Some("user".to_string()),
            parts: vec![Part { text }],
        }
    }
}

#[async_trait]
impl DraftComposer for GeminiStudio {
    async fn compose(&self, prompt: &str, language: Language) -> anyhow::Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Self::user_content(format!(
                "Generate an elegant, sophisticated, and deeply emotional message in {} \
                 based on: {prompt}. Max 50 words. Output ONLY the message text.",
                language.name()
            ))],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: COMPOSER_INSTRUCTION.to_string(),
                }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: Some(self.temperature),
                max_output_tokens: Some(8192),
                ..GenerationConfig::default()
            }),
        };

        let result = self.call_api(&self.text_model, &request).await?;
        let text = Self::first_candidate_parts(result)
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(ComposeError::EmptyResponse {
                service: self.text_model.clone(),
            }
            .into());
        }

        Ok(text)
    }
}

#[async_trait]
impl ImageRenderer for GeminiStudio {
    async fn render(&self, theme: &str) -> anyhow::Result<ImageArtifact> {
        let request = GenerateContentRequest {
            contents: vec![Self::user_content(format!(
                "A high-end, artistic, abstract and elegant background for a luxury digital \
                 tribute card. Theme: {theme}. Minimalist, soft lighting, gold and ivory \
                 colors, cinematic quality, high resolution."
            ))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: "16:9".to_string(),
                }),
                ..GenerationConfig::default()
            }),
        };

        let result = self.call_api(&self.image_model, &request).await?;
        let inline = Self::first_candidate_parts(result)
            .into_iter()
            .find_map(|part| part.inline_data)
            .ok_or_else(|| ComposeError::EmptyResponse {
                service: self.image_model.clone(),
            })?;

        Ok(ImageArtifact {
            mime_type: inline.mime_type.unwrap_or_else(|| "image/png".to_string()),
            data: inline.data,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiStudio {
    async fn synthesize(&self, text: &str) -> anyhow::Result<SpeechClip> {
        let request = GenerateContentRequest {
            contents: vec![Self::user_content(text.to_string())],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice.clone(),
                        },
                    },
                }),
                ..GenerationConfig::default()
            }),
        };

        let result = self.call_api(&self.tts_model, &request).await?;
        let inline = Self::first_candidate_parts(result)
            .into_iter()
            .find_map(|part| part.inline_data)
            .ok_or_else(|| ComposeError::EmptyResponse {
                service: self.tts_model.clone(),
            })?;

        let bytes = BASE64.decode(inline.data.as_bytes())?;
        Ok(SpeechClip {
            samples: decode_pcm16(&bytes),
            sample_rate: TTS_SAMPLE_RATE,
        })
    }
}

/// Decode little-endian PCM16 bytes into samples. A trailing odd byte is
/// dropped.
pub fn decode_pcm16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
