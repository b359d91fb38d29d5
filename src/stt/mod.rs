//! Support for speech recognition.

use std::path::PathBuf;
use std::sync::Arc;

use crate::audio::PushStream;
use crate::config::SpeechConfig;
use crate::error::{check, Error, Result};
use crate::ffi::{SPXASYNCHANDLE, SPXHR, SPXRECOHANDLE, SPX_WAIT_INFINITE};
use crate::guard::ActivityGate;
use crate::handle::SmartHandle;
use crate::marshal::{c_string, out_to_ret};
use crate::properties::{PropertyBag, PropertyId};
use crate::relay::{EventSignal, NativeHook};

mod event;
mod result;

pub use event::{CanceledEvent, RecognitionEvent, SessionEvent};
pub use result::RecognitionResult;

/// Where a recognizer takes its audio from.
pub enum RecognitionInput {
    /// The host's default capture device.
    Default,
    /// A WAV file on disk.
    File(PathBuf),
    /// A push stream fed by the application.
    Stream(PushStream),
}

impl RecognitionInput {
    fn to_native(&self) -> Result<SmartHandle> {
        let api = crate::api()?;
        let raw = match self {
            Self::Default => unsafe {
                out_to_ret(|out| {
                    (api.audio_config_create_audio_input_from_default_microphone)(out)
                })?
            },
            Self::File(path) => {
                let path = path
                    .to_str()
                    .ok_or(Error::InvalidArg("audio path is not valid UTF-8"))?;
                let path = c_string(path, "audio path")?;
                unsafe {
                    out_to_ret(|out| {
                        (api.audio_config_create_audio_input_from_wav_file_name)(
                            out,
                            path.as_ptr(),
                        )
                    })?
                }
            }
            Self::Stream(stream) => {
                let hstream = stream.handle().get()?;
                unsafe {
                    out_to_ret(|out| {
                        (api.audio_config_create_audio_input_from_stream)(out, hstream)
                    })?
                }
            }
        };
        SmartHandle::new(raw, api.audio_config_release, "audio input")
    }
}

/// Transcribes speech to text, one utterance at a time or continuously.
///
/// A recognizer is `Send + Sync`; blocking calls, event subscription and
/// [`close`](Recognizer::close) may all happen from different threads.
pub struct Recognizer {
    recognizing: EventSignal<RecognitionEvent>,
    recognized: EventSignal<RecognitionEvent>,
    canceled: EventSignal<CanceledEvent>,
    session_started: EventSignal<SessionEvent>,
    session_stopped: EventSignal<SessionEvent>,
    bag: PropertyBag,
    gate: Arc<ActivityGate>,
    handle: Arc<SmartHandle>,
}

impl Recognizer {
    /// Creates a recognizer reading audio from `input`.
    pub fn new(config: &SpeechConfig, input: RecognitionInput) -> Result<Self> {
        let api = crate::api()?;
        let audio = input.to_native()?;
        let hconfig = config.handle().get()?;
        let haudio = audio.get()?;
        let raw = unsafe {
            out_to_ret(|out| {
                (api.recognizer_create_speech_recognizer_from_config)(out, hconfig, haudio)
            })?
        };
        // The recognizer retains what it needs from the audio input; the
        // audio config handle itself is released when `audio` drops.
        let handle = Arc::new(SmartHandle::new(raw, api.recognizer_handle_release, "recognizer")?);
        let bag = PropertyBag::open(&handle, api.recognizer_get_property_bag)?;
        let gate = ActivityGate::new("recognizer");
        Ok(Self {
            recognizing: EventSignal::new(
                NativeHook::new(handle.clone(), api.recognizer_recognizing_set_callback),
                gate.clone(),
            ),
            recognized: EventSignal::new(
                NativeHook::new(handle.clone(), api.recognizer_recognized_set_callback),
                gate.clone(),
            ),
            canceled: EventSignal::new(
                NativeHook::new(handle.clone(), api.recognizer_canceled_set_callback),
                gate.clone(),
            ),
            session_started: EventSignal::new(
                NativeHook::new(handle.clone(), api.recognizer_session_started_set_callback),
                gate.clone(),
            ),
            session_stopped: EventSignal::new(
                NativeHook::new(handle.clone(), api.recognizer_session_stopped_set_callback),
                gate.clone(),
            ),
            bag,
            gate,
            handle,
        })
    }

    /// Recognizes a single utterance, blocking until the service returns
    /// a final result.
    pub fn recognize_once(&self) -> Result<RecognitionResult> {
        let api = crate::api()?;
        let _permit = self.gate.enter()?;
        let hreco = self.handle.get()?;
        let hasync =
            unsafe { out_to_ret(|out| (api.recognizer_recognize_once_async)(hreco, out))? };
        let hasync =
            SmartHandle::new(hasync, api.recognizer_async_handle_release, "async operation")?;
        let raw_async = hasync.get()?;
        let hresult = unsafe {
            out_to_ret(|out| {
                (api.recognizer_recognize_once_async_wait_for)(raw_async, SPX_WAIT_INFINITE, out)
            })?
        };
        RecognitionResult::from_handle(hresult)
    }

    /// Starts continuous recognition. Results arrive through the
    /// [`recognizing`](Recognizer::recognizing) and
    /// [`recognized`](Recognizer::recognized) events until
    /// [`stop_continuous`](Recognizer::stop_continuous) is called.
    pub fn start_continuous(&self) -> Result<()> {
        let api = crate::api()?;
        self.continuous_op(
            api.recognizer_start_continuous_recognition_async,
            api.recognizer_start_continuous_recognition_async_wait_for,
        )
    }

    /// Stops continuous recognition. Blocks until the service has
    /// acknowledged the stop; already queued events may still arrive.
    pub fn stop_continuous(&self) -> Result<()> {
        let api = crate::api()?;
        self.continuous_op(
            api.recognizer_stop_continuous_recognition_async,
            api.recognizer_stop_continuous_recognition_async_wait_for,
        )
    }

    fn continuous_op(
        &self,
        begin: unsafe extern "C" fn(SPXRECOHANDLE, *mut SPXASYNCHANDLE) -> SPXHR,
        wait: unsafe extern "C" fn(SPXASYNCHANDLE, u32) -> SPXHR,
    ) -> Result<()> {
        let api = crate::api()?;
        let _permit = self.gate.enter()?;
        let hreco = self.handle.get()?;
        let hasync = unsafe { out_to_ret(|out| begin(hreco, out))? };
        let hasync =
            SmartHandle::new(hasync, api.recognizer_async_handle_release, "async operation")?;
        let raw_async = hasync.get()?;
        check(unsafe { wait(raw_async, SPX_WAIT_INFINITE) })
    }

    /// Raised with intermediate hypotheses during an utterance.
    pub fn recognizing(&self) -> &EventSignal<RecognitionEvent> {
        &self.recognizing
    }

    /// Raised with the final transcription of each utterance.
    pub fn recognized(&self) -> &EventSignal<RecognitionEvent> {
        &self.recognized
    }

    /// Raised when recognition is canceled by an error or end of stream.
    pub fn canceled(&self) -> &EventSignal<CanceledEvent> {
        &self.canceled
    }

    /// Raised when a recognition session starts.
    pub fn session_started(&self) -> &EventSignal<SessionEvent> {
        &self.session_started
    }

    /// Raised when a recognition session stops.
    pub fn session_stopped(&self) -> &EventSignal<SessionEvent> {
        &self.session_stopped
    }

    /// The id of the most recent recognition session.
    pub fn session_id(&self) -> Result<String> {
        self.bag.get(PropertyId::SessionId)
    }

    /// The authorization token currently in use.
    pub fn authorization_token(&self) -> Result<String> {
        self.bag.get(PropertyId::AuthorizationToken)
    }

    /// Replaces the authorization token. A refreshed token takes effect
    /// on the next recognition.
    pub fn set_authorization_token(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(Error::InvalidArg("authorization token must not be empty"));
        }
        self.bag.set(PropertyId::AuthorizationToken, token)
    }

    /// The recognizer's property bag.
    pub fn properties(&self) -> &PropertyBag {
        &self.bag
    }

    pub(crate) fn native_handle(&self) -> &SmartHandle {
        &self.handle
    }

    /// Closes the recognizer: unregisters its callbacks and releases its
    /// native handles. Refused with
    /// [`OperationPending`](crate::Error::OperationPending) while a
    /// blocking call is in flight; closing an already closed recognizer
    /// is a no-op.
    pub fn close(&self) -> Result<()> {
        self.gate.begin_close()?;
        self.recognizing.detach();
        self.recognized.detach();
        self.canceled.detach();
        self.session_started.detach();
        self.session_stopped.detach();
        self.bag.release();
        self.handle.release();
        Ok(())
    }
}

impl Drop for Recognizer {
    fn drop(&mut self) {
        // The following call is expected to succeed, but failure shouldn't cause panic
        if let Err(err) = self.close() {
            log::error!("recognizer dropped while busy: {err}");
        }
    }
}
