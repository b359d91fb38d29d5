//! Support for async operations running on Tokio.

#[cfg(feature = "tokio-stt")]
mod stt;
#[cfg(feature = "tokio-tts")]
mod tts;

#[cfg(feature = "tokio-stt")]
pub use stt::AsyncRecognizer;
#[cfg(feature = "tokio-tts")]
pub use tts::AsyncSynthesizer;

async fn run_blocking<T, F>(f: F) -> crate::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> crate::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|_| crate::Error::Unexpected("blocking speech task failed"))?
}
