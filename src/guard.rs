use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

struct GateState {
    in_flight: usize,
    closed: bool,
}

/// Serializes blocking native calls against closing.
///
/// Every blocking native operation holds an [`ActivityPermit`] for its
/// duration. Closing is refused while any permit is outstanding, so a
/// native call can never return into a handle that was released under it.
/// Once closing has been marked, new permits are refused with a
/// disposed-object error.
pub(crate) struct ActivityGate {
    state: Mutex<GateState>,
    what: &'static str,
}

impl ActivityGate {
    pub(crate) fn new(what: &'static str) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(GateState {
                in_flight: 0,
                closed: false,
            }),
            what,
        })
    }

    /// Registers one in-flight operation. Fails once the gate is closed.
    pub(crate) fn enter(self: &Arc<Self>) -> Result<ActivityPermit> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(Error::Disposed(self.what));
        }
        state.in_flight += 1;
        Ok(ActivityPermit { gate: self.clone() })
    }

    /// Marks the gate closed. Refuses while operations are in flight;
    /// closing an already closed gate is a no-op.
    pub(crate) fn begin_close(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Ok(());
        }
        if state.in_flight > 0 {
            return Err(Error::OperationPending {
                pending: state.in_flight,
            });
        }
        state.closed = true;
        Ok(())
    }

    /// Fails with a disposed-object error once the gate is closed. For
    /// non-blocking operations that do not need a permit.
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::Disposed(self.what))
        } else {
            Ok(())
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

/// Live token for one in-flight native call. Decrements the gate's
/// counter when dropped, on every exit path.
pub(crate) struct ActivityPermit {
    gate: Arc<ActivityGate>,
}

impl Drop for ActivityPermit {
    fn drop(&mut self) {
        self.gate.state.lock().unwrap().in_flight -= 1;
    }
}
