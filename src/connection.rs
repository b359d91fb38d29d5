//! Explicit control over the service connection behind a recognizer.

use std::sync::Arc;

use crate::error::{check, Result};
use crate::ffi::{ApiTable, ReleaseFn, SPXEVENTHANDLE};
use crate::guard::ActivityGate;
use crate::handle::SmartHandle;
use crate::marshal::{out_to_ret, read_string};
use crate::relay::{private, EventArgs, EventSignal, NativeHook};
use crate::stt::Recognizer;

/// Raised when the service connection is established or dropped.
#[derive(Debug)]
pub struct ConnectionEvent {
    session_id: String,
}

impl ConnectionEvent {
    /// The id of the session the connection belongs to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl private::Sealed for ConnectionEvent {}

impl EventArgs for ConnectionEvent {
    fn from_event(hevent: SPXEVENTHANDLE) -> Result<Self> {
        let api = crate::api()?;
        let session_id = unsafe {
            read_string(|buf, len| (api.connection_event_get_session_id)(hevent, buf, len))?
        };
        Ok(Self { session_id })
    }

    fn event_release(api: &'static ApiTable) -> ReleaseFn {
        api.connection_event_handle_release
    }
}

/// The service connection behind a recognizer.
///
/// Recognizers connect on demand; this object lets an application connect
/// ahead of the first utterance to avoid its setup latency, drop the
/// connection when it knows a long pause is coming, and observe
/// connectivity changes. It does not change what the recognizer does,
/// only when the network work happens.
pub struct Connection {
    connected: EventSignal<ConnectionEvent>,
    disconnected: EventSignal<ConnectionEvent>,
    gate: Arc<ActivityGate>,
    handle: Arc<SmartHandle>,
}

impl Connection {
    /// Obtains the connection object of a recognizer.
    pub fn from_recognizer(recognizer: &Recognizer) -> Result<Self> {
        let api = crate::api()?;
        let hreco = recognizer.native_handle().get()?;
        let raw = unsafe { out_to_ret(|out| (api.connection_from_recognizer)(hreco, out))? };
        let handle = Arc::new(SmartHandle::new(raw, api.connection_handle_release, "connection")?);
        let gate = ActivityGate::new("connection");
        Ok(Self {
            connected: EventSignal::new(
                NativeHook::new(handle.clone(), api.connection_connected_set_callback),
                gate.clone(),
            ),
            disconnected: EventSignal::new(
                NativeHook::new(handle.clone(), api.connection_disconnected_set_callback),
                gate.clone(),
            ),
            gate,
            handle,
        })
    }

    /// Starts connecting to the service ahead of the next operation. Pass
    /// `true` when the recognizer will be used for continuous recognition
    /// so the right kind of connection is set up. Connection setup
    /// proceeds in the background; subscribe to
    /// [`connected`](Connection::connected) to observe it completing.
    pub fn open(&self, for_continuous_recognition: bool) -> Result<()> {
        let _permit = self.gate.enter()?;
        let api = crate::api()?;
        let handle = self.handle.get()?;
        check(unsafe { (api.connection_open)(handle, for_continuous_recognition) })
    }

    /// Drops the network connection. The recognizer reconnects on its
    /// next operation; nothing is lost but the setup latency.
    pub fn disconnect(&self) -> Result<()> {
        let _permit = self.gate.enter()?;
        let api = crate::api()?;
        let handle = self.handle.get()?;
        check(unsafe { (api.connection_close)(handle) })
    }

    /// Raised when the connection to the service is established.
    pub fn connected(&self) -> &EventSignal<ConnectionEvent> {
        &self.connected
    }

    /// Raised when the connection to the service is dropped.
    pub fn disconnected(&self) -> &EventSignal<ConnectionEvent> {
        &self.disconnected
    }

    /// Closes the connection object: unregisters its callbacks and
    /// releases its native handle. The recognizer it came from is not
    /// affected. Refused with
    /// [`OperationPending`](crate::Error::OperationPending) while a call
    /// is in flight; closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        self.gate.begin_close()?;
        self.connected.detach();
        self.disconnected.detach();
        self.handle.release();
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // The following call is expected to succeed, but failure shouldn't cause panic
        if let Err(err) = self.close() {
            log::error!("connection dropped while busy: {err}");
        }
    }
}
