use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::ProviderError;

/// Source of synthesized pronunciation audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech for the exact text.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network or API faults.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Playback device, supplied by the presentation layer.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play the audio to completion.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the device rejects the audio.
    async fn play(&self, audio: &[u8]) -> Result<(), ProviderError>;
}

//
// ─── HTTP ADAPTER ──────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub voice: String,
}

impl SpeechConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("DRILL_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("DRILL_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("DRILL_TTS_MODEL").unwrap_or_else(|_| "gpt-4o-mini-tts".into());
        let voice = env::var("DRILL_TTS_VOICE").unwrap_or_else(|_| "alloy".into());
        Some(Self {
            base_url,
            api_key,
            model,
            voice,
        })
    }
}

/// Synthesizer backed by an OpenAI-style `audio/speech` endpoint.
#[derive(Clone)]
pub struct GenerativeSpeechProvider {
    client: Client,
    config: Option<SpeechConfig>,
}

impl GenerativeSpeechProvider {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(SpeechConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<SpeechConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest {
    model: String,
    input: String,
    voice: String,
}

#[async_trait]
impl SpeechSynthesizer for GenerativeSpeechProvider {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let config = self.config.as_ref().ok_or(ProviderError::Disabled)?;

        let url = format!("{}/audio/speech", config.base_url.trim_end_matches('/'));
        let payload = SpeechRequest {
            model: config.model.clone(),
            input: text.to_owned(),
            voice: config.voice.clone(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

//
// ─── AUDIO SERVICE ─────────────────────────────────────────────────────────────
//

/// Coordinates pronunciation fetches and playback.
///
/// Audio for a given text is fetched at most once and cached by the exact
/// text. Playback is serialized by a busy flag: a play request while a
/// previous one is still running is ignored outright, not queued. Fetch
/// and playback errors never surface to the caller; playback simply does
/// not happen.
#[derive(Clone)]
pub struct AudioService {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    cache: Arc<Mutex<HashMap<String, Arc<Vec<u8>>>>>,
    busy: Arc<AtomicBool>,
}

impl AudioService {
    #[must_use]
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            synthesizer,
            sink,
            cache: Arc::new(Mutex::new(HashMap::new())),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    fn cached(&self, text: &str) -> Option<Arc<Vec<u8>>> {
        self.cache
            .lock()
            .ok()
            .and_then(|guard| guard.get(text).cloned())
    }

    fn insert(&self, text: &str, audio: Vec<u8>) -> Arc<Vec<u8>> {
        let audio = Arc::new(audio);
        if let Ok(mut guard) = self.cache.lock() {
            guard.insert(text.to_owned(), Arc::clone(&audio));
        }
        audio
    }

    /// Warm the cache for `text`. A no-op once the text has been fetched
    /// successfully; synthesis failures are logged and swallowed.
    pub async fn preload(&self, text: &str) {
        if self.cached(text).is_some() {
            return;
        }
        match self.synthesizer.synthesize(text).await {
            Ok(audio) => {
                self.insert(text, audio);
            }
            Err(err) => {
                tracing::warn!(error = %err, text, "pronunciation preload failed");
            }
        }
    }

    /// Play the pronunciation for `text`, fetching it first on a cache
    /// miss. Returns `false` when the request was ignored because another
    /// playback is in progress, or when fetch/playback failed.
    pub async fn play(&self, text: &str) -> bool {
        if self.busy.swap(true, Ordering::SeqCst) {
            return false;
        }

        let played = self.play_inner(text).await;
        self.busy.store(false, Ordering::SeqCst);
        played
    }

    async fn play_inner(&self, text: &str) -> bool {
        let audio = match self.cached(text) {
            Some(audio) => audio,
            None => match self.synthesizer.synthesize(text).await {
                Ok(audio) => self.insert(text, audio),
                Err(err) => {
                    tracing::warn!(error = %err, text, "pronunciation fetch failed");
                    return false;
                }
            },
        };

        if let Err(err) = self.sink.play(&audio).await {
            tracing::warn!(error = %err, text, "pronunciation playback failed");
            return false;
        }
        true
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    struct CountingSynth {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSynth {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for CountingSynth {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::EmptyBatch);
            }
            Ok(text.as_bytes().to_vec())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        played: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl AudioSink for RecordingSink {
        async fn play(&self, audio: &[u8]) -> Result<(), ProviderError> {
            self.played.lock().unwrap().push(audio.to_vec());
            Ok(())
        }
    }

    /// Sink that signals entry and waits to be released, to hold the
    /// service busy for as long as a test needs.
    struct GatedSink {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl AudioSink for GatedSink {
        async fn play(&self, _audio: &[u8]) -> Result<(), ProviderError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn preload_fetches_once_per_text() {
        let synth = CountingSynth::new(false);
        let service = AudioService::new(synth.clone(), Arc::new(RecordingSink::default()));

        service.preload("abandon").await;
        service.preload("abandon").await;
        assert_eq!(synth.calls(), 1);

        // Playback hits the cache too.
        assert!(service.play("abandon").await);
        assert_eq!(synth.calls(), 1);
    }

    #[tokio::test]
    async fn preload_failure_is_swallowed_and_not_cached() {
        let synth = CountingSynth::new(true);
        let service = AudioService::new(synth.clone(), Arc::new(RecordingSink::default()));

        service.preload("abandon").await;
        assert_eq!(synth.calls(), 1);

        // Nothing was cached, so the next attempt asks again.
        service.preload("abandon").await;
        assert_eq!(synth.calls(), 2);
    }

    #[tokio::test]
    async fn play_failure_reports_false() {
        let synth = CountingSynth::new(true);
        let service = AudioService::new(synth, Arc::new(RecordingSink::default()));
        assert!(!service.play("abandon").await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn play_while_busy_is_ignored() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let sink = Arc::new(GatedSink {
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        });
        let service = AudioService::new(CountingSynth::new(false), sink);

        let running = {
            let service = service.clone();
            tokio::spawn(async move { service.play("first").await })
        };
        entered.notified().await;

        // A second request while the first is still playing is dropped.
        assert!(!service.play("second").await);

        release.notify_one();
        assert!(running.await.unwrap());
    }

    #[tokio::test]
    async fn sink_receives_synthesized_bytes() {
        let sink = Arc::new(RecordingSink::default());
        let service = AudioService::new(CountingSynth::new(false), sink.clone());

        assert!(service.play("word").await);
        let played = sink.played.lock().unwrap();
        assert_eq!(played.as_slice(), [b"word".to_vec()]);
    }
}
