use std::collections::HashMap;
use std::ffi::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use crate::error::{check, Result};
use crate::ffi::{
    ApiTable, ReleaseFn, SetCallbackFn, PEVENT_CALLBACK_FUNC, SPXEVENTHANDLE, SPXHANDLE,
};
use crate::guard::ActivityGate;
use crate::handle::SmartHandle;

pub(crate) mod private {
    pub trait Sealed {}
}

/// Event argument types produced by the native core.
///
/// This trait is [sealed](https://rust-lang.github.io/api-guidelines/future-proofing.html);
/// it is implemented by the event types of this crate and cannot be
/// implemented outside it.
pub trait EventArgs: private::Sealed + Sized + Send + Sync + 'static {
    /// Copies the event's fields out of a native event handle. The handle
    /// stays owned by the caller.
    #[doc(hidden)]
    fn from_event(hevent: SPXEVENTHANDLE) -> Result<Self>;

    /// The release function paired with this event family's handles.
    #[doc(hidden)]
    fn event_release(api: &'static ApiTable) -> ReleaseFn;
}

/// A subscriber callback for one event kind.
///
/// Implemented for any `Fn(A)` closure that is `Send + Sync`, so a plain
/// closure can be passed wherever a handler is expected. Handlers are
/// invoked synchronously on whichever native thread reported the event,
/// and each handler gets its own copy of the event's arguments.
pub trait EventHandler<A>: Send + Sync {
    /// Called once per native event.
    fn on_event(&self, args: A);
}

impl<A, F: Fn(A) + Send + Sync> EventHandler<A> for F {
    fn on_event(&self, args: A) {
        self(args)
    }
}

/// Identifies one subscription on one [`EventSignal`], for
/// [`unsubscribe`](EventSignal::unsubscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventToken(u64);

// ---------------------------------------------------------------------------
// Callback context registry.
//
// The opaque context passed to a native callback registration is never a
// Rust pointer: it is a small integer token mapped here to a weak reference.
// A callback arriving after its owner died therefore dereferences nothing.
// ---------------------------------------------------------------------------

pub(crate) trait Deliverable: Send + Sync {
    fn deliver(&self, hevent: &SmartHandle);
}

struct Entry {
    target: Weak<dyn Deliverable>,
    release_event: ReleaseFn,
}

struct Registry {
    entries: Mutex<HashMap<usize, Entry>>,
    // Token 0 is never allocated; it would be indistinguishable from a
    // null context pointer.
    next: AtomicUsize,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry {
        entries: Mutex::new(HashMap::new()),
        next: AtomicUsize::new(1),
    })
}

fn register(target: Weak<dyn Deliverable>, release_event: ReleaseFn) -> usize {
    let reg = registry();
    let token = reg.next.fetch_add(1, Ordering::Relaxed);
    reg.entries.lock().unwrap().insert(
        token,
        Entry {
            target,
            release_event,
        },
    );
    token
}

fn unregister(token: usize) {
    registry().entries.lock().unwrap().remove(&token);
}

/// The one callback function ever handed to the native core. The context
/// is a registry token; everything else is resolved on this side of the
/// boundary.
pub(crate) unsafe extern "C" fn event_trampoline(
    _hobj: SPXHANDLE,
    hevent: SPXEVENTHANDLE,
    context: *mut c_void,
) {
    // Nothing may unwind into native code.
    if catch_unwind(AssertUnwindSafe(|| dispatch(context as usize, hevent))).is_err() {
        log::error!("panic while dispatching a native event; suppressed at the boundary");
    }
}

fn dispatch(token: usize, hevent: SPXEVENTHANDLE) {
    let entry = {
        let entries = registry().entries.lock().unwrap();
        entries
            .get(&token)
            .map(|entry| (entry.target.clone(), entry.release_event))
    };
    let Some((target, release_event)) = entry else {
        // The owner finished closing between the native side picking up the
        // callback and this point. The event handle cannot be safely
        // released without knowing its family; the native core quiesces
        // callbacks during unregistration, so this is not expected.
        log::warn!("native event for retired callback token {token}; dropped");
        return;
    };
    let Ok(hevent) = SmartHandle::new(hevent, release_event, "event") else {
        return;
    };
    if let Some(target) = target.upgrade() {
        target.deliver(&hevent);
    }
}

// ---------------------------------------------------------------------------
// Event signals.
// ---------------------------------------------------------------------------

/// Ties an event signal to the native callback setter of its owner.
pub(crate) struct NativeHook {
    owner: Arc<SmartHandle>,
    setter: SetCallbackFn,
}

impl NativeHook {
    pub(crate) fn new(owner: Arc<SmartHandle>, setter: SetCallbackFn) -> Self {
        Self { owner, setter }
    }

    fn set(&self, callback: Option<PEVENT_CALLBACK_FUNC>, context: usize) -> Result<()> {
        let handle = self.owner.get()?;
        check(unsafe { (self.setter)(handle, callback, context as *mut c_void) })
    }
}

struct HandlerList<A> {
    entries: Vec<(u64, Arc<dyn EventHandler<A>>)>,
    next_id: u64,
    registry_token: Option<usize>,
}

pub(crate) struct SignalCore<A: EventArgs> {
    list: Mutex<HandlerList<A>>,
    hook: NativeHook,
    gate: Arc<ActivityGate>,
}

impl<A: EventArgs> Deliverable for SignalCore<A> {
    fn deliver(&self, hevent: &SmartHandle) {
        // An owner that began closing no longer raises events; the native
        // event handle is still released by the caller.
        if self.gate.is_closed() {
            return;
        }
        let handlers: Vec<Arc<dyn EventHandler<A>>> = {
            let list = self.list.lock().unwrap();
            list.entries.iter().map(|(_, h)| h.clone()).collect()
        };
        if handlers.is_empty() {
            return;
        }
        let raw = match hevent.get() {
            Ok(raw) => raw,
            Err(_) => return,
        };
        for handler in handlers {
            // Each handler gets its own copy of the arguments, built from
            // the still-live event handle.
            let args = match A::from_event(raw) {
                Ok(args) => args,
                Err(err) => {
                    log::error!("failed to read native event: {err}");
                    return;
                }
            };
            // One panicking subscriber must not starve the rest, and no
            // panic may reach the native caller.
            if catch_unwind(AssertUnwindSafe(|| handler.on_event(args))).is_err() {
                log::error!("event handler panicked; continuing");
            }
        }
    }
}

/// One subscribable event of a wrapper object.
///
/// The first subscription registers a callback with the native core and
/// the last removal unregisters it, so an unobserved event costs nothing
/// on the native side. Handlers run synchronously on the native thread
/// that reported the event; panics are caught and logged, never forwarded
/// into native code.
pub struct EventSignal<A: EventArgs> {
    core: Arc<SignalCore<A>>,
}

impl<A: EventArgs> EventSignal<A> {
    pub(crate) fn new(hook: NativeHook, gate: Arc<ActivityGate>) -> Self {
        Self {
            core: Arc::new(SignalCore {
                list: Mutex::new(HandlerList {
                    entries: Vec::new(),
                    next_id: 1,
                    registry_token: None,
                }),
                hook,
                gate,
            }),
        }
    }

    /// Adds a handler. The first handler registers this signal's callback
    /// with the native core.
    pub fn subscribe<H: EventHandler<A> + 'static>(&self, handler: H) -> Result<EventToken> {
        self.core.gate.ensure_open()?;
        let api = crate::api()?;
        let mut list = self.core.list.lock().unwrap();
        if list.entries.is_empty() {
            let weak = Arc::downgrade(&self.core);
            let weak: Weak<dyn Deliverable> = weak;
            let token = register(weak, A::event_release(api));
            if let Err(err) = self.core.hook.set(Some(event_trampoline), token) {
                unregister(token);
                return Err(err);
            }
            log::debug!("native callback registered for token {token}");
            list.registry_token = Some(token);
        }
        let id = list.next_id;
        list.next_id += 1;
        list.entries.push((id, Arc::new(handler)));
        Ok(EventToken(id))
    }

    /// Removes the handler identified by `token`. Removing the last
    /// handler unregisters this signal's native callback. Returns `false`
    /// for a token that is not subscribed.
    pub fn unsubscribe(&self, token: EventToken) -> Result<bool> {
        let mut list = self.core.list.lock().unwrap();
        let before = list.entries.len();
        list.entries.retain(|(id, _)| *id != token.0);
        if list.entries.len() == before {
            return Ok(false);
        }
        if list.entries.is_empty() {
            if let Some(reg_token) = list.registry_token.take() {
                let outcome = self.core.hook.set(None, 0);
                unregister(reg_token);
                log::debug!("native callback unregistered for token {reg_token}");
                outcome?;
            }
        }
        Ok(true)
    }

    /// Unregisters the native callback and drops every handler. Errors
    /// from the native setter are ignored; the owner is going away.
    pub(crate) fn detach(&self) {
        let mut list = self.core.list.lock().unwrap();
        if let Some(reg_token) = list.registry_token.take() {
            let _ = self.core.hook.set(None, 0);
            unregister(reg_token);
        }
        list.entries.clear();
    }
}
