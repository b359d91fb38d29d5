use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::ffi::SPXRESULTHANDLE;
use crate::handle::SmartHandle;
use crate::marshal::{out_to_ret, read_string};
use crate::properties::{PropertyBag, PropertyId};
use crate::result::{
    ticks_to_duration, CancellationDetails, CancellationErrorCode, CancellationReason,
    ResultReason,
};

/// The outcome of one recognition attempt.
///
/// All scalar fields are copied out of the native result when it is
/// constructed; only the [property bag](RecognitionResult::properties)
/// still reads through to native state.
pub struct RecognitionResult {
    result_id: String,
    reason: ResultReason,
    text: String,
    offset: Duration,
    duration: Duration,
    cancellation: Option<CancellationDetails>,
    bag: PropertyBag,
    _handle: SmartHandle,
}

impl RecognitionResult {
    pub(crate) fn from_handle(raw: SPXRESULTHANDLE) -> Result<Self> {
        let api = crate::api()?;
        let handle = SmartHandle::new(raw, api.result_handle_release, "recognition result")?;
        let hresult = handle.get()?;
        let bag = PropertyBag::open(&handle, api.result_get_property_bag)?;
        let result_id =
            unsafe { read_string(|buf, len| (api.result_get_result_id)(hresult, buf, len))? };
        let text = unsafe { read_string(|buf, len| (api.result_get_text)(hresult, buf, len))? };
        let reason = unsafe { out_to_ret(|out| (api.result_get_reason)(hresult, out))? };
        let reason = ResultReason::from_repr(reason)
            .ok_or(Error::Unexpected("unknown result reason"))?;
        let offset = unsafe { out_to_ret(|out| (api.result_get_offset)(hresult, out))? };
        let duration = unsafe { out_to_ret(|out| (api.result_get_duration)(hresult, out))? };
        let cancellation = if reason == ResultReason::Canceled {
            let creason =
                unsafe { out_to_ret(|out| (api.result_get_reason_canceled)(hresult, out))? };
            let code =
                unsafe { out_to_ret(|out| (api.result_get_canceled_error_code)(hresult, out))? };
            Some(CancellationDetails {
                reason: CancellationReason::from_repr(creason)
                    .ok_or(Error::Unexpected("unknown cancellation reason"))?,
                error_code: CancellationErrorCode::from_repr(code)
                    .ok_or(Error::Unexpected("unknown cancellation error code"))?,
                error_details: bag.get(PropertyId::JsonErrorDetails)?,
            })
        } else {
            None
        };
        Ok(Self {
            result_id,
            reason,
            text,
            offset: ticks_to_duration(offset),
            duration: ticks_to_duration(duration),
            cancellation,
            bag,
            _handle: handle,
        })
    }

    /// The unique id the service assigned this result.
    pub fn result_id(&self) -> &str {
        &self.result_id
    }

    /// Why this result was produced.
    pub fn reason(&self) -> ResultReason {
        self.reason
    }

    /// The transcribed text. Empty unless the reason is
    /// [`RecognizingSpeech`](ResultReason::RecognizingSpeech) or
    /// [`RecognizedSpeech`](ResultReason::RecognizedSpeech).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the recognized audio starts, measured from the beginning of
    /// the stream.
    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// How much audio the result covers.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Cancellation details, present when the reason is
    /// [`Canceled`](ResultReason::Canceled).
    pub fn cancellation_details(&self) -> Option<&CancellationDetails> {
        self.cancellation.as_ref()
    }

    /// The result's property bag, home of the raw service JSON and
    /// latency measurements.
    pub fn properties(&self) -> &PropertyBag {
        &self.bag
    }
}

impl fmt::Debug for RecognitionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionResult")
            .field("result_id", &self.result_id)
            .field("reason", &self.reason)
            .field("text", &self.text)
            .field("offset", &self.offset)
            .field("duration", &self.duration)
            .field("cancellation", &self.cancellation)
            .finish()
    }
}
