#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A simplified, safe wrapper around a cloud speech SDK's native core.
//!
//! # Features
//!
//! The goal of this crate is to expose the speech-to-text and
//! text-to-speech surface of the SDK in a way that is easy to use in Rust.
//! It does not aim to cover the full set of features the native core
//! offers; the focus is on the session, result and event lifecycle, made
//! safe without giving up the C API's flexibility.
//!
//! ## Initialization
//!
//! The native core is reached exclusively through a table of entry points,
//! [`ffi::ApiTable`]. Install one with [`initialize`] before creating any
//! other object. With the `dynamic` feature enabled,
//! [`initialize_from_library`] resolves the table from the SDK's shared
//! library; embedders that link the core some other way, and test
//! harnesses that stub it out, can fill the table themselves.
//!
//! ## Speech recognition
//!
//! The [stt] module provides the API to recognize speech and convert it to
//! text. A [`Recognizer`](stt::Recognizer) is created from a
//! [`SpeechConfig`] carrying service credentials, and reads audio from the
//! default capture device, from a WAV file, or from a
//! [`PushStream`](audio::PushStream) the application feeds. You can
//! transcribe one utterance at a time with a blocking call, or start a
//! continuous session and receive utterances through events.
//!
//! ## Text-to-speech
//!
//! The [tts] module provides the API to render text as speech. A
//! [`Synthesizer`](tts::Synthesizer) plays through the default audio
//! device, writes a WAV file, or keeps the audio in the result only. The
//! speech it renders can be a simple string, SSML markup, or a
//! [`SpeechBuilder`](tts::SpeechBuilder) recipe that controls voice,
//! rate, volume, pitch and pronunciation.
//!
//! ## Events and threads
//!
//! Every recognizer, synthesizer and [`Connection`](connection::Connection)
//! exposes its events as [`EventSignal`]s. Handlers run on native SDK
//! threads, so they must be `Send + Sync`; panics in handlers are caught
//! and logged rather than crossing back into native code. All wrapper
//! objects are themselves `Send + Sync` and may be shared across threads.
//!
//! # Handles and Lifetime
//!
//! Every wrapper owns one native handle and releases it exactly once,
//! when the wrapper is dropped or explicitly closed with its `close`
//! method. `close` refuses with
//! [`Error::OperationPending`] while a blocking call is still running on
//! another thread, which keeps a native call from ever returning into a
//! released handle. After a successful close, further operations fail
//! with an error instead of touching freed native state, and already
//! registered callbacks quietly stop delivering events.

use std::sync::OnceLock;

pub mod audio;
mod config;
pub mod connection;
mod error;
pub mod ffi;
mod guard;
mod handle;
mod marshal;
mod properties;
mod relay;
mod result;
pub mod stt;
pub mod tts;

#[cfg(any(feature = "tokio-stt", feature = "tokio-tts"))]
pub mod tokio;

pub use config::SpeechConfig;
pub use error::{Error, Result};
pub use properties::{PropertyBag, PropertyId, PropertyKey};
pub use relay::{EventArgs, EventHandler, EventSignal, EventToken};
pub use result::{
    CancellationDetails, CancellationErrorCode, CancellationReason, ResultReason,
};

use ffi::ApiTable;

static API: OnceLock<ApiTable> = OnceLock::new();

/// Installs the native API table for the whole process. Must be called
/// once, before any other object is created; a second call fails with
/// [`Error::AlreadyInitialized`].
pub fn initialize(api: ApiTable) -> Result<()> {
    API.set(api).map_err(|_| Error::AlreadyInitialized)
}

/// Loads the SDK's shared library from the given path and installs its
/// entry points as the process-wide API table.
#[cfg(feature = "dynamic")]
#[cfg_attr(docsrs, doc(cfg(feature = "dynamic")))]
pub fn initialize_from_library<P: AsRef<std::path::Path>>(path: P) -> Result<()> {
    initialize(ffi::load_api(path)?)
}

pub(crate) fn api() -> Result<&'static ApiTable> {
    API.get().ok_or(Error::NotInitialized)
}
