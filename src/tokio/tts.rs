use std::ops::Deref;
use std::sync::Arc;

use crate::config::SpeechConfig;
use crate::tts::{Speech, SpeechOutput, SynthesisResult, Synthesizer};
use crate::Result;

use super::run_blocking;

#[cfg_attr(docsrs, doc(cfg(feature = "tokio-tts")))]
/// A speech synthesizer whose rendering can be awaited.
///
/// Blocking native calls run on the Tokio blocking thread pool.
pub struct AsyncSynthesizer {
    base: Arc<Synthesizer>,
}

impl AsyncSynthesizer {
    /// Creates a new synthesizer rendering audio to `output`.
    pub fn new(config: &SpeechConfig, output: SpeechOutput) -> Result<Self> {
        Ok(Self {
            base: Arc::new(Synthesizer::new(config, output)?),
        })
    }

    /// Completes when the synthesizer has finished rendering the given
    /// speech, yielding the result that carries the audio.
    pub async fn speak<'s, S: Into<Speech<'s>>>(&self, speech: S) -> Result<SynthesisResult> {
        let speech = speech.into().into_owned();
        let base = self.base.clone();
        run_blocking(move || base.speak(speech)).await
    }

    /// Queues up the rendering of the given speech and forgets about it.
    /// Completion can still be observed through the
    /// [`completed`](Synthesizer::completed) event. Must be called from
    /// within a Tokio runtime.
    pub fn speak_and_forget<'s, S: Into<Speech<'s>>>(&self, speech: S) -> Result<()> {
        let speech = speech.into().into_owned();
        let base = self.base.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(err) = base.speak(speech) {
                log::error!("fire-and-forget synthesis failed: {err}");
            }
        });
        Ok(())
    }
}

impl Deref for AsyncSynthesizer {
    type Target = Synthesizer;
    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
