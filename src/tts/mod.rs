//! Support for speech synthesis.

use std::path::PathBuf;
use std::ptr::null_mut;
use std::sync::Arc;

use strum_macros::{EnumString, IntoStaticStr};

use crate::config::SpeechConfig;
use crate::error::{Error, Result};
use crate::guard::ActivityGate;
use crate::handle::SmartHandle;
use crate::marshal::{c_string, out_to_ret};
use crate::properties::PropertyBag;
use crate::relay::{EventSignal, NativeHook};

mod event;
mod result;
mod speech;

pub use self::event::{SynthesisEvent, WordBoundaryEvent};
pub use self::result::SynthesisResult;
pub use self::speech::{Pitch, Rate, SayAs, Speech, SpeechBuilder, Volume};

/// Specifies where the output of speech synthesis should go.
pub enum SpeechOutput {
    /// Play through the default audio device on the system.
    Default,
    /// Write a WAV file at the given path.
    File(PathBuf),
    /// Play nowhere; the audio is only available on the results.
    Null,
}

impl SpeechOutput {
    fn to_native(&self) -> Result<Option<SmartHandle>> {
        let api = crate::api()?;
        let raw = match self {
            Self::Default => unsafe {
                out_to_ret(|out| {
                    (api.audio_config_create_audio_output_from_default_speaker)(out)
                })?
            },
            Self::File(path) => {
                let path = path
                    .to_str()
                    .ok_or(Error::InvalidArg("audio path is not valid UTF-8"))?;
                let path = c_string(path, "audio path")?;
                unsafe {
                    out_to_ret(|out| {
                        (api.audio_config_create_audio_output_from_wav_file_name)(
                            out,
                            path.as_ptr(),
                        )
                    })?
                }
            }
            Self::Null => return Ok(None),
        };
        Ok(Some(SmartHandle::new(raw, api.audio_config_release, "audio output")?))
    }
}

/// The wire format synthesized audio is requested in.
///
/// The serialized form of each variant is the format name the service
/// expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr)]
#[non_exhaustive]
#[allow(missing_docs)]
pub enum SpeechSynthesisOutputFormat {
    #[strum(serialize = "riff-8khz-16bit-mono-pcm")]
    Riff8Khz16BitMonoPcm,
    #[strum(serialize = "riff-16khz-16bit-mono-pcm")]
    Riff16Khz16BitMonoPcm,
    #[strum(serialize = "riff-24khz-16bit-mono-pcm")]
    Riff24Khz16BitMonoPcm,
    #[strum(serialize = "riff-48khz-16bit-mono-pcm")]
    Riff48Khz16BitMonoPcm,
    #[strum(serialize = "raw-8khz-16bit-mono-pcm")]
    Raw8Khz16BitMonoPcm,
    #[strum(serialize = "raw-16khz-16bit-mono-pcm")]
    Raw16Khz16BitMonoPcm,
    #[strum(serialize = "raw-24khz-16bit-mono-pcm")]
    Raw24Khz16BitMonoPcm,
    #[strum(serialize = "raw-48khz-16bit-mono-pcm")]
    Raw48Khz16BitMonoPcm,
    #[strum(serialize = "audio-16khz-32kbitrate-mono-mp3")]
    Audio16Khz32KBitRateMonoMp3,
    #[strum(serialize = "audio-16khz-64kbitrate-mono-mp3")]
    Audio16Khz64KBitRateMonoMp3,
    #[strum(serialize = "audio-16khz-128kbitrate-mono-mp3")]
    Audio16Khz128KBitRateMonoMp3,
    #[strum(serialize = "audio-24khz-48kbitrate-mono-mp3")]
    Audio24Khz48KBitRateMonoMp3,
    #[strum(serialize = "audio-24khz-96kbitrate-mono-mp3")]
    Audio24Khz96KBitRateMonoMp3,
    #[strum(serialize = "audio-24khz-160kbitrate-mono-mp3")]
    Audio24Khz160KBitRateMonoMp3,
    #[strum(serialize = "ogg-16khz-16bit-mono-opus")]
    Ogg16Khz16BitMonoOpus,
    #[strum(serialize = "ogg-24khz-16bit-mono-opus")]
    Ogg24Khz16BitMonoOpus,
}

impl SpeechSynthesisOutputFormat {
    pub(crate) fn wire_name(self) -> &'static str {
        self.into()
    }
}

/// Renders text or SSML to speech.
///
/// A synthesizer is `Send + Sync`; blocking calls, event subscription and
/// [`close`](Synthesizer::close) may all happen from different threads.
pub struct Synthesizer {
    started: EventSignal<SynthesisEvent>,
    completed: EventSignal<SynthesisEvent>,
    canceled: EventSignal<SynthesisEvent>,
    word_boundary: EventSignal<WordBoundaryEvent>,
    bag: PropertyBag,
    gate: Arc<ActivityGate>,
    handle: Arc<SmartHandle>,
}

impl Synthesizer {
    /// Creates a synthesizer rendering audio to `output`.
    pub fn new(config: &SpeechConfig, output: SpeechOutput) -> Result<Self> {
        let api = crate::api()?;
        let audio = output.to_native()?;
        let hconfig = config.handle().get()?;
        let haudio = match &audio {
            Some(handle) => handle.get()?,
            None => null_mut(),
        };
        let raw = unsafe {
            out_to_ret(|out| {
                (api.synthesizer_create_speech_synthesizer_from_config)(out, hconfig, haudio)
            })?
        };
        let handle =
            Arc::new(SmartHandle::new(raw, api.synthesizer_handle_release, "synthesizer")?);
        let bag = PropertyBag::open(&handle, api.synthesizer_get_property_bag)?;
        let gate = ActivityGate::new("synthesizer");
        Ok(Self {
            started: EventSignal::new(
                NativeHook::new(handle.clone(), api.synthesizer_started_set_callback),
                gate.clone(),
            ),
            completed: EventSignal::new(
                NativeHook::new(handle.clone(), api.synthesizer_completed_set_callback),
                gate.clone(),
            ),
            canceled: EventSignal::new(
                NativeHook::new(handle.clone(), api.synthesizer_canceled_set_callback),
                gate.clone(),
            ),
            word_boundary: EventSignal::new(
                NativeHook::new(handle.clone(), api.synthesizer_word_boundary_set_callback),
                gate.clone(),
            ),
            bag,
            gate,
            handle,
        })
    }

    /// Renders the given speech, blocking until synthesis has finished,
    /// and returns the result carrying the audio.
    pub fn speak<'s, S: Into<Speech<'s>>>(&self, speech: S) -> Result<SynthesisResult> {
        let api = crate::api()?;
        let _permit = self.gate.enter()?;
        let hsynth = self.handle.get()?;
        let speech = speech.into();
        let speak = match &speech {
            Speech::Text(_) => api.synthesizer_speak_text,
            Speech::Ssml(_) => api.synthesizer_speak_ssml,
        };
        let contents = speech.contents();
        let length: u32 = contents
            .len()
            .try_into()
            .map_err(|_| Error::InvalidArg("speech too long"))?;
        let hresult = unsafe {
            out_to_ret(|out| speak(hsynth, contents.as_ptr().cast(), length, out))?
        };
        SynthesisResult::from_handle(hresult)
    }

    /// Raised when a synthesis request starts being processed.
    pub fn started(&self) -> &EventSignal<SynthesisEvent> {
        &self.started
    }

    /// Raised when a synthesis request has produced all of its audio.
    pub fn completed(&self) -> &EventSignal<SynthesisEvent> {
        &self.completed
    }

    /// Raised when a synthesis request is canceled.
    pub fn canceled(&self) -> &EventSignal<SynthesisEvent> {
        &self.canceled
    }

    /// Raised as each word of the input is reached in the output audio.
    pub fn word_boundary(&self) -> &EventSignal<WordBoundaryEvent> {
        &self.word_boundary
    }

    /// The synthesizer's property bag.
    pub fn properties(&self) -> &PropertyBag {
        &self.bag
    }

    /// Closes the synthesizer: unregisters its callbacks and releases its
    /// native handles. Refused with
    /// [`OperationPending`](crate::Error::OperationPending) while a
    /// blocking call is in flight; closing an already closed synthesizer
    /// is a no-op.
    pub fn close(&self) -> Result<()> {
        self.gate.begin_close()?;
        self.started.detach();
        self.completed.detach();
        self.canceled.detach();
        self.word_boundary.detach();
        self.bag.release();
        self.handle.release();
        Ok(())
    }
}

impl Drop for Synthesizer {
    fn drop(&mut self) {
        // The following call is expected to succeed, but failure shouldn't cause panic
        if let Err(err) = self.close() {
            log::error!("synthesizer dropped while busy: {err}");
        }
    }
}
