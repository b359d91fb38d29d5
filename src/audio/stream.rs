use std::sync::Arc;

use crate::error::{check, Error, Result};
use crate::handle::SmartHandle;
use crate::marshal::out_to_ret;

use super::AudioFormat;

/// An audio input stream the application pushes PCM data into.
///
/// Cloning yields another handle to the same underlying stream, so one
/// part of a program can feed audio while another owns the recognizer
/// reading from it. [`close`](PushStream::close) marks the end of the
/// audio; the native stream itself is released when the last clone is
/// dropped.
#[derive(Clone)]
pub struct PushStream {
    handle: Arc<SmartHandle>,
}

impl PushStream {
    /// Creates a push stream carrying audio in the given format.
    pub fn new(format: &AudioFormat) -> Result<Self> {
        let api = crate::api()?;
        let (rate, bits, channels) = format.to_native();
        let hformat = unsafe {
            out_to_ret(|out| {
                (api.audio_stream_format_create_from_waveformat_pcm)(out, rate, bits, channels)
            })?
        };
        // The stream keeps whatever it needs from the format; the format
        // handle itself is released as soon as creation returns.
        let hformat = SmartHandle::new(hformat, api.audio_stream_format_release, "audio format")?;
        let raw_format = hformat.get()?;
        let raw = unsafe {
            out_to_ret(|out| {
                (api.audio_stream_create_push_audio_input_stream)(out, raw_format)
            })?
        };
        Ok(Self {
            handle: Arc::new(SmartHandle::new(raw, api.audio_stream_release, "push stream")?),
        })
    }

    /// Appends a chunk of PCM data to the stream.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        let api = crate::api()?;
        let handle = self.handle.get()?;
        let size: u32 = data
            .len()
            .try_into()
            .map_err(|_| Error::InvalidArg("audio chunk too large"))?;
        check(unsafe { (api.push_audio_input_stream_write)(handle, data.as_ptr(), size) })
    }

    /// Marks the end of the audio. A recognizer reading this stream will
    /// finish its session once it has consumed what was written.
    pub fn close(&self) -> Result<()> {
        let api = crate::api()?;
        let handle = self.handle.get()?;
        check(unsafe { (api.push_audio_input_stream_close)(handle) })
    }

    pub(crate) fn handle(&self) -> &SmartHandle {
        &self.handle
    }
}
