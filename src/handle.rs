use std::ffi::c_void;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::error::{Error, Result};
use crate::ffi::{ReleaseFn, SPXHANDLE, SPX_NOERROR};

/// Owns exactly one native handle together with the release function it
/// was created with.
///
/// The handle is released at most once, no matter how often [`release`]
/// is called or whether the owner is dropped afterwards. After release,
/// [`get`] fails with [`Error::NullHandle`], which keeps a released handle
/// from ever reaching the native core.
///
/// [`release`]: SmartHandle::release
/// [`get`]: SmartHandle::get
#[derive(Debug)]
pub(crate) struct SmartHandle {
    raw: AtomicPtr<c_void>,
    release: ReleaseFn,
    what: &'static str,
}

impl SmartHandle {
    /// Takes ownership of `raw`. Fails if the native factory produced a
    /// null handle.
    pub(crate) fn new(raw: SPXHANDLE, release: ReleaseFn, what: &'static str) -> Result<Self> {
        if raw.is_null() {
            return Err(Error::NullHandle(what));
        }
        Ok(Self {
            raw: AtomicPtr::new(raw),
            release,
            what,
        })
    }

    /// Returns the raw handle, or [`Error::NullHandle`] once released.
    pub(crate) fn get(&self) -> Result<SPXHANDLE> {
        let raw = self.raw.load(Ordering::Acquire);
        if raw.is_null() {
            Err(Error::NullHandle(self.what))
        } else {
            Ok(raw)
        }
    }

    /// Releases the handle. Idempotent; a second call is a no-op.
    pub(crate) fn release(&self) {
        let raw = self.raw.swap(std::ptr::null_mut(), Ordering::AcqRel);
        if raw.is_null() {
            return;
        }
        let hr = unsafe { (self.release)(raw) };
        if hr != SPX_NOERROR {
            // Nowhere to propagate from a release path; keep a record.
            log::error!("releasing {} handle failed with status {:#x}", self.what, hr);
        }
    }
}

impl Drop for SmartHandle {
    fn drop(&mut self) {
        self.release();
    }
}
