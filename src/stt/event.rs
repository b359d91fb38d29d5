use std::ops::Deref;

use crate::error::Result;
use crate::ffi::{ApiTable, ReleaseFn, SPXEVENTHANDLE};
use crate::marshal::{out_to_ret, read_string};
use crate::relay::{private, EventArgs};
use crate::result::CancellationDetails;

use super::RecognitionResult;

/// Raised when a recognition session starts or stops.
#[derive(Debug)]
pub struct SessionEvent {
    session_id: String,
}

impl SessionEvent {
    /// The id of the session this event belongs to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl private::Sealed for SessionEvent {}

impl EventArgs for SessionEvent {
    fn from_event(hevent: SPXEVENTHANDLE) -> Result<Self> {
        let api = crate::api()?;
        let session_id = unsafe {
            read_string(|buf, len| (api.recognizer_session_event_get_session_id)(hevent, buf, len))?
        };
        Ok(Self { session_id })
    }

    fn event_release(api: &'static ApiTable) -> ReleaseFn {
        api.recognizer_event_handle_release
    }
}

/// Raised for intermediate hypotheses and final transcriptions.
#[derive(Debug)]
pub struct RecognitionEvent {
    session_id: String,
    result: RecognitionResult,
}

impl RecognitionEvent {
    /// The id of the session this event belongs to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The result carried by this event.
    pub fn result(&self) -> &RecognitionResult {
        &self.result
    }
}

impl private::Sealed for RecognitionEvent {}

impl EventArgs for RecognitionEvent {
    fn from_event(hevent: SPXEVENTHANDLE) -> Result<Self> {
        let api = crate::api()?;
        let session_id = unsafe {
            read_string(|buf, len| (api.recognizer_session_event_get_session_id)(hevent, buf, len))?
        };
        let hresult = unsafe {
            out_to_ret(|out| (api.recognizer_recognition_event_get_result)(hevent, out))?
        };
        Ok(Self {
            session_id,
            result: RecognitionResult::from_handle(hresult)?,
        })
    }

    fn event_release(api: &'static ApiTable) -> ReleaseFn {
        api.recognizer_event_handle_release
    }
}

/// Raised when recognition is canceled. Derefs to the underlying
/// [`RecognitionEvent`].
#[derive(Debug)]
pub struct CanceledEvent {
    base: RecognitionEvent,
}

impl CanceledEvent {
    /// Why recognition was canceled.
    pub fn cancellation(&self) -> Option<&CancellationDetails> {
        self.base.result().cancellation_details()
    }
}

impl Deref for CanceledEvent {
    type Target = RecognitionEvent;
    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl private::Sealed for CanceledEvent {}

impl EventArgs for CanceledEvent {
    fn from_event(hevent: SPXEVENTHANDLE) -> Result<Self> {
        Ok(Self {
            base: RecognitionEvent::from_event(hevent)?,
        })
    }

    fn event_release(api: &'static ApiTable) -> ReleaseFn {
        api.recognizer_event_handle_release
    }
}
