use thiserror::Error;

use crate::ffi::{SPXHR, SPX_NOERROR};

/// The error type returned by every fallible function in this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A native call returned a failure status. The code is the raw
    /// [`SPXHR`] reported by the native core.
    #[error("native speech call failed with status {code:#x}")]
    Native {
        /// The raw status code.
        code: SPXHR,
    },

    /// A handle was null or has already been released. Raised before the
    /// handle would have been passed to the native core.
    #[error("{0} handle is null or already released")]
    NullHandle(&'static str),

    /// The object has been closed, or is in the middle of closing.
    #[error("{0} has been closed")]
    Disposed(&'static str),

    /// An argument failed validation before any native call was made.
    #[error("invalid argument: {0}")]
    InvalidArg(&'static str),

    /// Closing was refused because native operations are still in flight.
    /// Wait for them to finish and close again.
    #[error("{pending} operation(s) still in flight")]
    OperationPending {
        /// Number of operations that were in flight when closing was
        /// attempted.
        pending: usize,
    },

    /// No [`ApiTable`](crate::ffi::ApiTable) has been installed yet.
    #[error("the native API table has not been installed; call initialize() first")]
    NotInitialized,

    /// [`initialize`](crate::initialize) was called more than once.
    #[error("the native API table has already been installed")]
    AlreadyInitialized,

    /// The native core broke one of its documented contracts.
    #[error("unexpected value from the native core: {0}")]
    Unexpected(&'static str),

    /// Loading the SDK's shared library failed.
    #[cfg(feature = "dynamic")]
    #[error("failed to load the native library: {0}")]
    Library(String),
}

/// The result type returned by every fallible function in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Translates a native status code into a `Result`.
pub(crate) fn check(hr: SPXHR) -> Result<()> {
    if hr == SPX_NOERROR {
        Ok(())
    } else {
        Err(Error::Native { code: hr })
    }
}
