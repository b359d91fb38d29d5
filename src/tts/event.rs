use std::time::Duration;

use crate::error::{check, Result};
use crate::ffi::{ApiTable, ReleaseFn, SPXEVENTHANDLE};
use crate::marshal::out_to_ret;
use crate::relay::{private, EventArgs};
use crate::result::ticks_to_duration;

use super::SynthesisResult;

/// Raised as a synthesis request starts, produces audio, finishes or is
/// canceled.
#[derive(Debug)]
pub struct SynthesisEvent {
    result: SynthesisResult,
}

impl SynthesisEvent {
    /// The result snapshot carried by this event.
    pub fn result(&self) -> &SynthesisResult {
        &self.result
    }
}

impl private::Sealed for SynthesisEvent {}

impl EventArgs for SynthesisEvent {
    fn from_event(hevent: SPXEVENTHANDLE) -> Result<Self> {
        let api = crate::api()?;
        let hresult = unsafe {
            out_to_ret(|out| (api.synthesizer_synthesis_event_get_result)(hevent, out))?
        };
        Ok(Self {
            result: SynthesisResult::from_handle(hresult)?,
        })
    }

    fn event_release(api: &'static ApiTable) -> ReleaseFn {
        api.synthesizer_event_handle_release
    }
}

/// Raised once per word as the synthesized audio aligns with the input
/// text.
#[derive(Debug, Clone, Copy)]
pub struct WordBoundaryEvent {
    audio_offset: Duration,
    text_offset: u32,
    word_length: u32,
}

impl WordBoundaryEvent {
    /// Where the word starts in the output audio.
    pub fn audio_offset(&self) -> Duration {
        self.audio_offset
    }

    /// Where the word starts in the input text, in characters.
    pub fn text_offset(&self) -> u32 {
        self.text_offset
    }

    /// The length of the word, in characters.
    pub fn word_length(&self) -> u32 {
        self.word_length
    }
}

impl private::Sealed for WordBoundaryEvent {}

impl EventArgs for WordBoundaryEvent {
    fn from_event(hevent: SPXEVENTHANDLE) -> Result<Self> {
        let api = crate::api()?;
        let mut audio_offset = 0u64;
        let mut text_offset = 0u32;
        let mut word_length = 0u32;
        check(unsafe {
            (api.synthesizer_word_boundary_event_get_values)(
                hevent,
                &mut audio_offset,
                &mut text_offset,
                &mut word_length,
            )
        })?;
        Ok(Self {
            audio_offset: ticks_to_duration(audio_offset),
            text_offset,
            word_length,
        })
    }

    fn event_release(api: &'static ApiTable) -> ReleaseFn {
        api.synthesizer_event_handle_release
    }
}
