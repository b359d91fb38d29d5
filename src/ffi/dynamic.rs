use std::path::Path;

use libloading::Library;

use crate::error::{Error, Result};

use super::ApiTable;

/// Resolves every [`ApiTable`] entry from the SDK's shared library.
///
/// The library is intentionally never unloaded: native handles created
/// through the table may outlive any scope this crate can observe.
pub(crate) fn load_api<P: AsRef<Path>>(path: P) -> Result<ApiTable> {
    let lib = unsafe { Library::new(path.as_ref()) }
        .map_err(|source| Error::Library(source.to_string()))?;

    macro_rules! sym {
        ($name:ident) => {
            *unsafe { lib.get(concat!(stringify!($name), "\0").as_bytes()) }
                .map_err(|source| Error::Library(format!("{}: {}", stringify!($name), source)))?
        };
    }

    let table = ApiTable {
        speech_config_from_subscription: sym!(speech_config_from_subscription),
        speech_config_from_endpoint: sym!(speech_config_from_endpoint),
        speech_config_from_authorization_token: sym!(speech_config_from_authorization_token),
        speech_config_get_property_bag: sym!(speech_config_get_property_bag),
        speech_config_release: sym!(speech_config_release),
        property_bag_set_string: sym!(property_bag_set_string),
        property_bag_get_string: sym!(property_bag_get_string),
        property_bag_free_string: sym!(property_bag_free_string),
        property_bag_release: sym!(property_bag_release),
        audio_config_create_audio_input_from_default_microphone: sym!(
            audio_config_create_audio_input_from_default_microphone
        ),
        audio_config_create_audio_input_from_wav_file_name: sym!(
            audio_config_create_audio_input_from_wav_file_name
        ),
        audio_config_create_audio_input_from_stream: sym!(
            audio_config_create_audio_input_from_stream
        ),
        audio_config_create_audio_output_from_default_speaker: sym!(
            audio_config_create_audio_output_from_default_speaker
        ),
        audio_config_create_audio_output_from_wav_file_name: sym!(
            audio_config_create_audio_output_from_wav_file_name
        ),
        audio_config_release: sym!(audio_config_release),
        audio_stream_format_create_from_waveformat_pcm: sym!(
            audio_stream_format_create_from_waveformat_pcm
        ),
        audio_stream_format_release: sym!(audio_stream_format_release),
        audio_stream_create_push_audio_input_stream: sym!(
            audio_stream_create_push_audio_input_stream
        ),
        push_audio_input_stream_write: sym!(push_audio_input_stream_write),
        push_audio_input_stream_close: sym!(push_audio_input_stream_close),
        audio_stream_release: sym!(audio_stream_release),
        recognizer_create_speech_recognizer_from_config: sym!(
            recognizer_create_speech_recognizer_from_config
        ),
        recognizer_handle_release: sym!(recognizer_handle_release),
        recognizer_get_property_bag: sym!(recognizer_get_property_bag),
        recognizer_recognize_once_async: sym!(recognizer_recognize_once_async),
        recognizer_recognize_once_async_wait_for: sym!(recognizer_recognize_once_async_wait_for),
        recognizer_start_continuous_recognition_async: sym!(
            recognizer_start_continuous_recognition_async
        ),
        recognizer_start_continuous_recognition_async_wait_for: sym!(
            recognizer_start_continuous_recognition_async_wait_for
        ),
        recognizer_stop_continuous_recognition_async: sym!(
            recognizer_stop_continuous_recognition_async
        ),
        recognizer_stop_continuous_recognition_async_wait_for: sym!(
            recognizer_stop_continuous_recognition_async_wait_for
        ),
        recognizer_async_handle_release: sym!(recognizer_async_handle_release),
        recognizer_recognizing_set_callback: sym!(recognizer_recognizing_set_callback),
        recognizer_recognized_set_callback: sym!(recognizer_recognized_set_callback),
        recognizer_canceled_set_callback: sym!(recognizer_canceled_set_callback),
        recognizer_session_started_set_callback: sym!(recognizer_session_started_set_callback),
        recognizer_session_stopped_set_callback: sym!(recognizer_session_stopped_set_callback),
        recognizer_event_handle_release: sym!(recognizer_event_handle_release),
        recognizer_recognition_event_get_result: sym!(recognizer_recognition_event_get_result),
        recognizer_session_event_get_session_id: sym!(recognizer_session_event_get_session_id),
        result_get_result_id: sym!(result_get_result_id),
        result_get_text: sym!(result_get_text),
        result_get_reason: sym!(result_get_reason),
        result_get_offset: sym!(result_get_offset),
        result_get_duration: sym!(result_get_duration),
        result_get_reason_canceled: sym!(result_get_reason_canceled),
        result_get_canceled_error_code: sym!(result_get_canceled_error_code),
        result_get_property_bag: sym!(result_get_property_bag),
        result_handle_release: sym!(result_handle_release),
        synthesizer_create_speech_synthesizer_from_config: sym!(
            synthesizer_create_speech_synthesizer_from_config
        ),
        synthesizer_handle_release: sym!(synthesizer_handle_release),
        synthesizer_get_property_bag: sym!(synthesizer_get_property_bag),
        synthesizer_speak_text: sym!(synthesizer_speak_text),
        synthesizer_speak_ssml: sym!(synthesizer_speak_ssml),
        synthesizer_started_set_callback: sym!(synthesizer_started_set_callback),
        synthesizer_completed_set_callback: sym!(synthesizer_completed_set_callback),
        synthesizer_canceled_set_callback: sym!(synthesizer_canceled_set_callback),
        synthesizer_word_boundary_set_callback: sym!(synthesizer_word_boundary_set_callback),
        synthesizer_event_handle_release: sym!(synthesizer_event_handle_release),
        synthesizer_synthesis_event_get_result: sym!(synthesizer_synthesis_event_get_result),
        synthesizer_word_boundary_event_get_values: sym!(
            synthesizer_word_boundary_event_get_values
        ),
        synth_result_get_result_id: sym!(synth_result_get_result_id),
        synth_result_get_reason: sym!(synth_result_get_reason),
        synth_result_get_reason_canceled: sym!(synth_result_get_reason_canceled),
        synth_result_get_canceled_error_code: sym!(synth_result_get_canceled_error_code),
        synth_result_get_audio_data: sym!(synth_result_get_audio_data),
        synth_result_get_property_bag: sym!(synth_result_get_property_bag),
        synth_result_handle_release: sym!(synth_result_handle_release),
        connection_from_recognizer: sym!(connection_from_recognizer),
        connection_handle_release: sym!(connection_handle_release),
        connection_open: sym!(connection_open),
        connection_close: sym!(connection_close),
        connection_connected_set_callback: sym!(connection_connected_set_callback),
        connection_disconnected_set_callback: sym!(connection_disconnected_set_callback),
        connection_event_get_session_id: sym!(connection_event_get_session_id),
        connection_event_handle_release: sym!(connection_event_handle_release),
    };

    std::mem::forget(lib);
    Ok(table)
}
