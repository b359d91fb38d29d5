use std::fmt;

use crate::error::{Error, Result};
use crate::ffi::SPXSYNTHRESULTHANDLE;
use crate::handle::SmartHandle;
use crate::marshal::{out_to_ret, read_bytes, read_string};
use crate::properties::{PropertyBag, PropertyId};
use crate::result::{
    CancellationDetails, CancellationErrorCode, CancellationReason, ResultReason,
};

/// The outcome of one synthesis request, audio included.
///
/// The audio payload is copied out of the native result when it is
/// constructed; only the [property bag](SynthesisResult::properties)
/// still reads through to native state.
pub struct SynthesisResult {
    result_id: String,
    reason: ResultReason,
    audio: Vec<u8>,
    cancellation: Option<CancellationDetails>,
    bag: PropertyBag,
    _handle: SmartHandle,
}

impl SynthesisResult {
    pub(crate) fn from_handle(raw: SPXSYNTHRESULTHANDLE) -> Result<Self> {
        let api = crate::api()?;
        let handle = SmartHandle::new(raw, api.synth_result_handle_release, "synthesis result")?;
        let hresult = handle.get()?;
        let bag = PropertyBag::open(&handle, api.synth_result_get_property_bag)?;
        let result_id = unsafe {
            read_string(|buf, len| (api.synth_result_get_result_id)(hresult, buf, len))?
        };
        let reason = unsafe { out_to_ret(|out| (api.synth_result_get_reason)(hresult, out))? };
        let reason = ResultReason::from_repr(reason)
            .ok_or(Error::Unexpected("unknown result reason"))?;
        let audio = unsafe {
            read_bytes(|buf, len| (api.synth_result_get_audio_data)(hresult, buf, len))?
        };
        let cancellation = if reason == ResultReason::Canceled {
            let creason =
                unsafe { out_to_ret(|out| (api.synth_result_get_reason_canceled)(hresult, out))? };
            let code = unsafe {
                out_to_ret(|out| (api.synth_result_get_canceled_error_code)(hresult, out))?
            };
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
            audio,
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

    /// The synthesized audio, in the configured output format.
    pub fn audio(&self) -> &[u8] {
        &self.audio
    }

    /// Takes the synthesized audio out of the result.
    pub fn into_audio(self) -> Vec<u8> {
        self.audio
    }

    /// Cancellation details, present when the reason is
    /// [`Canceled`](ResultReason::Canceled).
    pub fn cancellation_details(&self) -> Option<&CancellationDetails> {
        self.cancellation.as_ref()
    }

    /// The result's property bag.
    pub fn properties(&self) -> &PropertyBag {
        &self.bag
    }
}

impl fmt::Debug for SynthesisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisResult")
            .field("result_id", &self.result_id)
            .field("reason", &self.reason)
            .field("audio_len", &self.audio.len())
            .field("cancellation", &self.cancellation)
            .finish()
    }
}
