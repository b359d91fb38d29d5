use std::ffi::{c_char, CStr, CString};
use std::mem::MaybeUninit;
use std::ptr::null_mut;

use crate::error::{check, Error, Result};
use crate::ffi::SPXHR;

/// Calls a native function that returns its result through an out
/// parameter, converting the out parameter into a return value.
pub(crate) unsafe fn out_to_ret<T, F: FnOnce(*mut T) -> SPXHR>(f: F) -> Result<T> {
    let mut result = MaybeUninit::uninit();
    check(f(result.as_mut_ptr()))?;
    Ok(result.assume_init())
}

/// Reads a variable-length UTF-8 payload through the two-call protocol:
/// a sizing call with a null buffer, then a fill call with a buffer of the
/// reported size.
///
/// The size from the sizing call is treated as a cap. A smaller fill size
/// truncates; a larger one is a contract violation and fails the read.
pub(crate) unsafe fn read_string<F>(mut fill: F) -> Result<String>
where
    F: FnMut(*mut c_char, *mut u32) -> SPXHR,
{
    let mut len: u32 = 0;
    check(fill(null_mut(), &mut len))?;
    if len == 0 {
        return Ok(String::new());
    }
    let mut buf = vec![0u8; len as usize];
    let mut filled = len;
    check(fill(buf.as_mut_ptr().cast(), &mut filled))?;
    if filled > len {
        return Err(Error::Unexpected("payload grew between sizing and fill"));
    }
    buf.truncate(filled as usize);
    String::from_utf8(buf).map_err(|_| Error::Unexpected("text payload is not valid UTF-8"))
}

/// Byte-buffer flavor of [`read_string`], for audio and other binary
/// payloads. A zero-length payload yields an empty vector.
pub(crate) unsafe fn read_bytes<F>(mut fill: F) -> Result<Vec<u8>>
where
    F: FnMut(*mut u8, *mut u32) -> SPXHR,
{
    let mut len: u32 = 0;
    check(fill(null_mut(), &mut len))?;
    if len == 0 {
        return Ok(Vec::new());
    }
    let mut buf = vec![0u8; len as usize];
    let mut filled = len;
    check(fill(buf.as_mut_ptr(), &mut filled))?;
    if filled > len {
        return Err(Error::Unexpected("payload grew between sizing and fill"));
    }
    buf.truncate(filled as usize);
    Ok(buf)
}

/// Owns a NUL-terminated string allocated by the native core and frees it
/// through the function registered at construction.
pub(crate) struct NativeString {
    ptr: *mut c_char,
    free: unsafe extern "C" fn(*mut c_char) -> SPXHR,
}

impl NativeString {
    /// Takes ownership of `ptr`. Returns `None` for a null pointer.
    pub(crate) unsafe fn from_raw(
        ptr: *mut c_char,
        free: unsafe extern "C" fn(*mut c_char) -> SPXHR,
    ) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self { ptr, free })
        }
    }

    /// Copies the string out as UTF-8.
    pub(crate) fn to_string_lossy(&self) -> String {
        unsafe { CStr::from_ptr(self.ptr) }
            .to_string_lossy()
            .into_owned()
    }
}

impl Drop for NativeString {
    fn drop(&mut self) {
        // The free function is expected to succeed; nothing useful can be
        // done with a failure here.
        let _ = unsafe { (self.free)(self.ptr) };
    }
}

/// Builds a NUL-terminated copy of `s` for a `const char*` parameter,
/// rejecting interior NUL bytes before any native call is made.
pub(crate) fn c_string(s: &str, what: &'static str) -> Result<CString> {
    CString::new(s).map_err(|_| Error::InvalidArg(what))
}
