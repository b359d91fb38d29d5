//! The C boundary of the native speech SDK.
//!
//! Everything the crate knows about the native core is collected in
//! [`ApiTable`]: one `unsafe extern "C"` function pointer per native entry
//! point, grouped by the handle type they operate on. The table is supplied
//! by the embedder through [`initialize`](crate::initialize), or resolved
//! from the SDK's shared library when the `dynamic` feature is enabled.
//!
//! Conventions shared by every entry point:
//!
//! * Functions return an [`SPXHR`] status code; [`SPX_NOERROR`] is success.
//! * Every `*_create_*` function has a matching `*_release` function, and a
//!   handle must be released through the function it was created with.
//! * Variable-length payloads (text, session ids, audio bytes) use a
//!   two-call protocol: pass a null buffer to receive the required size in
//!   the in/out length argument, then call again with a buffer of at least
//!   that size. Text buffers carry UTF-8 without a terminating NUL.
//! * Callback registration takes a single opaque context pointer which the
//!   native layer threads back to the callback unchanged. Passing a null
//!   callback unregisters.

use std::ffi::{c_char, c_int, c_void};

#[cfg(feature = "dynamic")]
mod dynamic;

#[cfg(feature = "dynamic")]
pub(crate) use dynamic::load_api;

/// An opaque handle to a native resource.
pub type SPXHANDLE = *mut c_void;

/// Status code returned by every native entry point.
pub type SPXHR = usize;

/// Handle to a speech configuration.
pub type SPXSPEECHCONFIGHANDLE = SPXHANDLE;
/// Handle to an audio input or output configuration.
pub type SPXAUDIOCONFIGHANDLE = SPXHANDLE;
/// Handle to an audio stream.
pub type SPXAUDIOSTREAMHANDLE = SPXHANDLE;
/// Handle to an audio stream format description.
pub type SPXAUDIOSTREAMFORMATHANDLE = SPXHANDLE;
/// Handle to a property bag.
pub type SPXPROPERTYBAGHANDLE = SPXHANDLE;
/// Handle to a speech recognizer.
pub type SPXRECOHANDLE = SPXHANDLE;
/// Handle to an in-flight asynchronous operation.
pub type SPXASYNCHANDLE = SPXHANDLE;
/// Handle to a recognition result.
pub type SPXRESULTHANDLE = SPXHANDLE;
/// Handle to a speech synthesizer.
pub type SPXSYNTHHANDLE = SPXHANDLE;
/// Handle to a speech synthesis result.
pub type SPXSYNTHRESULTHANDLE = SPXHANDLE;
/// Handle to a connection object.
pub type SPXCONNECTIONHANDLE = SPXHANDLE;
/// Handle to an event raised by the native core.
pub type SPXEVENTHANDLE = SPXHANDLE;

/// The success status code.
pub const SPX_NOERROR: SPXHR = 0;

/// An argument failed validation inside the native core.
pub const SPXERR_INVALID_ARG: SPXHR = 0x8f30_0003;
/// A handle was null, released, or of the wrong type.
pub const SPXERR_INVALID_HANDLE: SPXHR = 0x8f30_0005;
/// A blocking wait exceeded its timeout.
pub const SPXERR_TIMEOUT: SPXHR = 0x8f30_0006;
/// The supplied buffer was smaller than the size reported by the sizing call.
pub const SPXERR_BUFFER_TOO_SMALL: SPXHR = 0x8f30_0007;
/// The native core has not been set up for the requested operation.
pub const SPXERR_UNINITIALIZED: SPXHR = 0x8f30_0008;

/// Waits without a deadline when passed as a timeout in milliseconds.
pub const SPX_WAIT_INFINITE: u32 = u32::MAX;

/// Releases a native handle. Every handle type pairs its create function
/// with exactly one function of this shape.
pub type ReleaseFn = unsafe extern "C" fn(SPXHANDLE) -> SPXHR;

/// A native event callback: the originating object's handle, the event
/// handle (owned by the callee), and the opaque context registered with
/// the callback.
#[allow(non_camel_case_types)]
pub type PEVENT_CALLBACK_FUNC =
    unsafe extern "C" fn(hobj: SPXHANDLE, hevent: SPXEVENTHANDLE, context: *mut c_void);

/// Registers or (with a null callback) unregisters an event callback.
pub type SetCallbackFn =
    unsafe extern "C" fn(SPXHANDLE, Option<PEVENT_CALLBACK_FUNC>, *mut c_void) -> SPXHR;

/// The complete set of native entry points used by this crate.
///
/// Field names follow the SDK's exported symbol names, so a table can be
/// filled mechanically from a loaded library. All pointers must refer to a
/// single, consistent build of the native core; mixing symbols from two
/// builds is undefined behavior on the native side.
#[allow(missing_docs)]
#[derive(Clone, Copy)]
pub struct ApiTable {
    // speech configuration
    pub speech_config_from_subscription:
        unsafe extern "C" fn(*mut SPXSPEECHCONFIGHANDLE, *const c_char, *const c_char) -> SPXHR,
    pub speech_config_from_endpoint:
        unsafe extern "C" fn(*mut SPXSPEECHCONFIGHANDLE, *const c_char, *const c_char) -> SPXHR,
    pub speech_config_from_authorization_token:
        unsafe extern "C" fn(*mut SPXSPEECHCONFIGHANDLE, *const c_char, *const c_char) -> SPXHR,
    pub speech_config_get_property_bag:
        unsafe extern "C" fn(SPXSPEECHCONFIGHANDLE, *mut SPXPROPERTYBAGHANDLE) -> SPXHR,
    pub speech_config_release: ReleaseFn,

    // property bags
    pub property_bag_set_string:
        unsafe extern "C" fn(SPXPROPERTYBAGHANDLE, c_int, *const c_char, *const c_char) -> SPXHR,
    pub property_bag_get_string: unsafe extern "C" fn(
        SPXPROPERTYBAGHANDLE,
        c_int,
        *const c_char,
        *const c_char,
    ) -> *mut c_char,
    pub property_bag_free_string: unsafe extern "C" fn(*mut c_char) -> SPXHR,
    pub property_bag_release: ReleaseFn,

    // audio configuration
    pub audio_config_create_audio_input_from_default_microphone:
        unsafe extern "C" fn(*mut SPXAUDIOCONFIGHANDLE) -> SPXHR,
    pub audio_config_create_audio_input_from_wav_file_name:
        unsafe extern "C" fn(*mut SPXAUDIOCONFIGHANDLE, *const c_char) -> SPXHR,
    pub audio_config_create_audio_input_from_stream:
        unsafe extern "C" fn(*mut SPXAUDIOCONFIGHANDLE, SPXAUDIOSTREAMHANDLE) -> SPXHR,
    pub audio_config_create_audio_output_from_default_speaker:
        unsafe extern "C" fn(*mut SPXAUDIOCONFIGHANDLE) -> SPXHR,
    pub audio_config_create_audio_output_from_wav_file_name:
        unsafe extern "C" fn(*mut SPXAUDIOCONFIGHANDLE, *const c_char) -> SPXHR,
    pub audio_config_release: ReleaseFn,

    // audio streams
    pub audio_stream_format_create_from_waveformat_pcm:
        unsafe extern "C" fn(*mut SPXAUDIOSTREAMFORMATHANDLE, u32, u8, u8) -> SPXHR,
    pub audio_stream_format_release: ReleaseFn,
    pub audio_stream_create_push_audio_input_stream:
        unsafe extern "C" fn(*mut SPXAUDIOSTREAMHANDLE, SPXAUDIOSTREAMFORMATHANDLE) -> SPXHR,
    pub push_audio_input_stream_write:
        unsafe extern "C" fn(SPXAUDIOSTREAMHANDLE, *const u8, u32) -> SPXHR,
    pub push_audio_input_stream_close: unsafe extern "C" fn(SPXAUDIOSTREAMHANDLE) -> SPXHR,
    pub audio_stream_release: ReleaseFn,

    // speech recognizer
    pub recognizer_create_speech_recognizer_from_config: unsafe extern "C" fn(
        *mut SPXRECOHANDLE,
        SPXSPEECHCONFIGHANDLE,
        SPXAUDIOCONFIGHANDLE,
    ) -> SPXHR,
    pub recognizer_handle_release: ReleaseFn,
    pub recognizer_get_property_bag:
        unsafe extern "C" fn(SPXRECOHANDLE, *mut SPXPROPERTYBAGHANDLE) -> SPXHR,
    pub recognizer_recognize_once_async:
        unsafe extern "C" fn(SPXRECOHANDLE, *mut SPXASYNCHANDLE) -> SPXHR,
    pub recognizer_recognize_once_async_wait_for:
        unsafe extern "C" fn(SPXASYNCHANDLE, u32, *mut SPXRESULTHANDLE) -> SPXHR,
    pub recognizer_start_continuous_recognition_async:
        unsafe extern "C" fn(SPXRECOHANDLE, *mut SPXASYNCHANDLE) -> SPXHR,
    pub recognizer_start_continuous_recognition_async_wait_for:
        unsafe extern "C" fn(SPXASYNCHANDLE, u32) -> SPXHR,
    pub recognizer_stop_continuous_recognition_async:
        unsafe extern "C" fn(SPXRECOHANDLE, *mut SPXASYNCHANDLE) -> SPXHR,
    pub recognizer_stop_continuous_recognition_async_wait_for:
        unsafe extern "C" fn(SPXASYNCHANDLE, u32) -> SPXHR,
    pub recognizer_async_handle_release: ReleaseFn,
    pub recognizer_recognizing_set_callback: SetCallbackFn,
    pub recognizer_recognized_set_callback: SetCallbackFn,
    pub recognizer_canceled_set_callback: SetCallbackFn,
    pub recognizer_session_started_set_callback: SetCallbackFn,
    pub recognizer_session_stopped_set_callback: SetCallbackFn,
    pub recognizer_event_handle_release: ReleaseFn,
    pub recognizer_recognition_event_get_result:
        unsafe extern "C" fn(SPXEVENTHANDLE, *mut SPXRESULTHANDLE) -> SPXHR,
    pub recognizer_session_event_get_session_id:
        unsafe extern "C" fn(SPXEVENTHANDLE, *mut c_char, *mut u32) -> SPXHR,

    // recognition results
    pub result_get_result_id:
        unsafe extern "C" fn(SPXRESULTHANDLE, *mut c_char, *mut u32) -> SPXHR,
    pub result_get_text: unsafe extern "C" fn(SPXRESULTHANDLE, *mut c_char, *mut u32) -> SPXHR,
    pub result_get_reason: unsafe extern "C" fn(SPXRESULTHANDLE, *mut c_int) -> SPXHR,
    pub result_get_offset: unsafe extern "C" fn(SPXRESULTHANDLE, *mut u64) -> SPXHR,
    pub result_get_duration: unsafe extern "C" fn(SPXRESULTHANDLE, *mut u64) -> SPXHR,
    pub result_get_reason_canceled: unsafe extern "C" fn(SPXRESULTHANDLE, *mut c_int) -> SPXHR,
    pub result_get_canceled_error_code: unsafe extern "C" fn(SPXRESULTHANDLE, *mut c_int) -> SPXHR,
    pub result_get_property_bag:
        unsafe extern "C" fn(SPXRESULTHANDLE, *mut SPXPROPERTYBAGHANDLE) -> SPXHR,
    pub result_handle_release: ReleaseFn,

    // speech synthesizer
    pub synthesizer_create_speech_synthesizer_from_config: unsafe extern "C" fn(
        *mut SPXSYNTHHANDLE,
        SPXSPEECHCONFIGHANDLE,
        SPXAUDIOCONFIGHANDLE,
    ) -> SPXHR,
    pub synthesizer_handle_release: ReleaseFn,
    pub synthesizer_get_property_bag:
        unsafe extern "C" fn(SPXSYNTHHANDLE, *mut SPXPROPERTYBAGHANDLE) -> SPXHR,
    pub synthesizer_speak_text: unsafe extern "C" fn(
        SPXSYNTHHANDLE,
        *const c_char,
        u32,
        *mut SPXSYNTHRESULTHANDLE,
    ) -> SPXHR,
    pub synthesizer_speak_ssml: unsafe extern "C" fn(
        SPXSYNTHHANDLE,
        *const c_char,
        u32,
        *mut SPXSYNTHRESULTHANDLE,
    ) -> SPXHR,
    pub synthesizer_started_set_callback: SetCallbackFn,
    pub synthesizer_completed_set_callback: SetCallbackFn,
    pub synthesizer_canceled_set_callback: SetCallbackFn,
    pub synthesizer_word_boundary_set_callback: SetCallbackFn,
    pub synthesizer_event_handle_release: ReleaseFn,
    pub synthesizer_synthesis_event_get_result:
        unsafe extern "C" fn(SPXEVENTHANDLE, *mut SPXSYNTHRESULTHANDLE) -> SPXHR,
    pub synthesizer_word_boundary_event_get_values:
        unsafe extern "C" fn(SPXEVENTHANDLE, *mut u64, *mut u32, *mut u32) -> SPXHR,

    // synthesis results
    pub synth_result_get_result_id:
        unsafe extern "C" fn(SPXSYNTHRESULTHANDLE, *mut c_char, *mut u32) -> SPXHR,
    pub synth_result_get_reason:
        unsafe extern "C" fn(SPXSYNTHRESULTHANDLE, *mut c_int) -> SPXHR,
    pub synth_result_get_reason_canceled:
        unsafe extern "C" fn(SPXSYNTHRESULTHANDLE, *mut c_int) -> SPXHR,
    pub synth_result_get_canceled_error_code:
        unsafe extern "C" fn(SPXSYNTHRESULTHANDLE, *mut c_int) -> SPXHR,
    pub synth_result_get_audio_data:
        unsafe extern "C" fn(SPXSYNTHRESULTHANDLE, *mut u8, *mut u32) -> SPXHR,
    pub synth_result_get_property_bag:
        unsafe extern "C" fn(SPXSYNTHRESULTHANDLE, *mut SPXPROPERTYBAGHANDLE) -> SPXHR,
    pub synth_result_handle_release: ReleaseFn,

    // connection
    pub connection_from_recognizer:
        unsafe extern "C" fn(SPXRECOHANDLE, *mut SPXCONNECTIONHANDLE) -> SPXHR,
    pub connection_handle_release: ReleaseFn,
    pub connection_open: unsafe extern "C" fn(SPXCONNECTIONHANDLE, bool) -> SPXHR,
    pub connection_close: unsafe extern "C" fn(SPXCONNECTIONHANDLE) -> SPXHR,
    pub connection_connected_set_callback: SetCallbackFn,
    pub connection_disconnected_set_callback: SetCallbackFn,
    pub connection_event_get_session_id:
        unsafe extern "C" fn(SPXEVENTHANDLE, *mut c_char, *mut u32) -> SPXHR,
    pub connection_event_handle_release: ReleaseFn,
}
