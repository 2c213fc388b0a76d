//! Speech playback seam. Playback is a single fire-and-forget stream with no
//! pause or seek; the workflow learns about completion through the `done`
//! signal, which is what clears its loading flag.

use crate::providers::SpeechClip;
use tokio::sync::oneshot;

pub trait SpeechPlayer: Send + Sync {
    /// Start playing the clip and signal `done` when it finishes. If playback
    /// cannot start, `done` is signalled immediately.
    fn play(&self, clip: SpeechClip, done: oneshot::Sender<()>);
}

/// Swallows the clip and completes immediately. Used in tests and headless
/// runs, and as the fallback when the `playback` feature is disabled.
pub struct NoopPlayer;

impl SpeechPlayer for NoopPlayer {
    fn play(&self, _clip: SpeechClip, done: oneshot::Sender<()>) {
        let _ = done.send(());
    }
}

#[cfg(feature = "playback")]
pub use cpal_player::CpalPlayer;

#[cfg(feature = "playback")]
mod cpal_player {
    use super::{SpeechClip, SpeechPlayer, oneshot};
    use crate::PlaybackError;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Default output device, mono, at the clip's sample rate.
    pub struct CpalPlayer;

    impl CpalPlayer {
        pub fn new() -> Self {
            Self
        }
    }

    impl SpeechPlayer for CpalPlayer {
        fn play(&self, clip: SpeechClip, done: oneshot::Sender<()>) {
            // cpal streams are not Send; the whole lifetime of the stream
            // stays on one dedicated thread.
            std::thread::spawn(move || {
                if let Err(err) = run_stream(&clip) {
                    tracing::warn!("speech playback failed: {err}");
                }
                let _ = done.send(());
            });
        }
    }

    fn run_stream(clip: &SpeechClip) -> Result<(), PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlaybackError::NoDevice)?;

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(clip.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let samples: Arc<Vec<f32>> = Arc::new(
            clip.samples
                .iter()
                .map(|sample| f32::from(*sample) / 32_768.0)
                .collect(),
        );
        let position = Arc::new(Mutex::new(0_usize));
        let drained = Arc::new(AtomicBool::new(false));
        let drained_writer = Arc::clone(&drained);

        let stream = device
            .build_output_stream(
                &config,
                move |out: &mut [f32], _| {
                    let Ok(mut pos) = position.lock() else {
                        return;
                    };
                    for slot in out.iter_mut() {
                        if *pos < samples.len() {
                            *slot = samples[*pos];
                            *pos += 1;
                        } else {
                            *slot = 0.0;
                            drained_writer.store(true, Ordering::Release);
                        }
                    }
                },
                |err| tracing::warn!("output stream error: {err}"),
                None,
            )
            .map_err(|err| PlaybackError::Stream(err.to_string()))?;

        stream
            .play()
            .map_err(|err| PlaybackError::Stream(err.to_string()))?;

        while !drained.load(Ordering::Acquire) {
            std::thread::sleep(Duration::from_millis(25));
        }
        // short tail so the device flushes its final buffer
        std::thread::sleep(Duration::from_millis(100));
        Ok(())
    }
}
