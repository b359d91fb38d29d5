use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::mpsc::Receiver;

use crate::config::SpeechConfig;
use crate::stt::{RecognitionEvent, RecognitionInput, RecognitionResult, Recognizer};
use crate::{Error, Result};

use super::run_blocking;

#[cfg_attr(docsrs, doc(cfg(feature = "tokio-stt")))]
/// A recognizer whose operations can be awaited.
///
/// Blocking native calls run on the Tokio blocking thread pool; final
/// recognitions from continuous sessions are buffered into an awaitable
/// queue.
pub struct AsyncRecognizer {
    base: Arc<Recognizer>,
    rx: Receiver<RecognitionEvent>,
}

impl AsyncRecognizer {
    /// Creates a new recognizer reading audio from `input`, configured to
    /// buffer up to the given number of recognized utterances. If a new
    /// utterance is recognized while the buffer is full, it is silently
    /// dropped.
    pub fn new(config: &SpeechConfig, input: RecognitionInput, buffer: usize) -> Result<Self> {
        let base = Arc::new(Recognizer::new(config, input)?);
        let (tx, rx) = tokio::sync::mpsc::channel::<RecognitionEvent>(buffer);
        base.recognized().subscribe(move |event| {
            let _ = tx.try_send(event);
        })?;
        Ok(Self { base, rx })
    }

    /// Completes when the next utterance of a continuous session has been
    /// recognized. Fails once the recognizer has been closed.
    pub async fn recognize(&mut self) -> Result<RecognitionEvent> {
        self.rx.recv().await.ok_or(Error::Disposed("recognizer"))
    }

    /// Recognizes a single utterance without blocking the async runtime.
    pub async fn recognize_once(&self) -> Result<RecognitionResult> {
        let base = self.base.clone();
        run_blocking(move || base.recognize_once()).await
    }

    /// Starts continuous recognition; see
    /// [`Recognizer::start_continuous`].
    pub async fn start_continuous(&self) -> Result<()> {
        let base = self.base.clone();
        run_blocking(move || base.start_continuous()).await
    }

    /// Stops continuous recognition; see
    /// [`Recognizer::stop_continuous`].
    pub async fn stop_continuous(&self) -> Result<()> {
        let base = self.base.clone();
        run_blocking(move || base.stop_continuous()).await
    }
}

impl Deref for AsyncRecognizer {
    type Target = Recognizer;
    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
