//! Result classification shared by recognition and synthesis.

use std::time::Duration;

use strum_macros::FromRepr;

// Native timing values are in 100-nanosecond ticks.
pub(crate) fn ticks_to_duration(ticks: u64) -> Duration {
    Duration::from_nanos(ticks.saturating_mul(100))
}

/// Why a result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[non_exhaustive]
#[repr(i32)]
pub enum ResultReason {
    /// Speech could not be matched to anything.
    NoMatch = 0,
    /// The operation was canceled; consult the cancellation details.
    Canceled = 1,
    /// An intermediate hypothesis, still subject to change.
    RecognizingSpeech = 2,
    /// A final transcription of an utterance.
    RecognizedSpeech = 3,
    /// A chunk of audio from an ongoing synthesis.
    SynthesizingAudio = 8,
    /// Synthesis finished and the full audio is available.
    SynthesizingAudioCompleted = 9,
    /// Synthesis has started.
    SynthesizingAudioStarted = 12,
}

/// Why an operation was canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[non_exhaustive]
#[repr(i32)]
pub enum CancellationReason {
    /// The service or transport reported an error.
    Error = 1,
    /// The input stream ran out of audio.
    EndOfStream = 2,
}

/// The service-level error behind a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[non_exhaustive]
#[repr(i32)]
#[allow(missing_docs)]
pub enum CancellationErrorCode {
    NoError = 0,
    AuthenticationFailure = 1,
    BadRequest = 2,
    TooManyRequests = 3,
    Forbidden = 4,
    ConnectionFailure = 5,
    ServiceTimeout = 6,
    ServiceError = 7,
    ServiceUnavailable = 8,
    RuntimeError = 9,
}

/// Details of a canceled result.
#[derive(Debug, Clone)]
pub struct CancellationDetails {
    /// Whether cancellation came from an error or end of stream.
    pub reason: CancellationReason,
    /// The service-level error code; [`NoError`] for end of stream.
    ///
    /// [`NoError`]: CancellationErrorCode::NoError
    pub error_code: CancellationErrorCode,
    /// The service's error payload, empty when none was reported.
    pub error_details: String,
}
