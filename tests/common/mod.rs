//! An in-process fake of the native speech core.
//!
//! Fills an [`ApiTable`] with entry points that operate on plain Rust
//! state behind a mutex, so the crate's surface can be exercised without
//! the real SDK. Behavior is scripted through ordinary properties set on
//! a configuration; the `stub.` prefix keeps them apart from real ones:
//!
//! * `stub.tag` names the objects created from the configuration, so a
//!   test can query creation and release counts for its own objects.
//! * `stub.recognize.text`, `.reason`, `.offset`, `.duration`,
//!   `.delay_ms` and `.cancel.*` shape recognition results.
//! * `stub.continuous.fire` / `stub.continuous.fire-stop` list the events
//!   fired while starting or stopping continuous recognition, from
//!   `session-started`, `session-stopped`, `recognizing`, `recognized`
//!   and `canceled`. With `stub.fire.thread` the events fire from a
//!   separate thread after `stub.fire.delay_ms` milliseconds.
//! * `stub.synth.events` lists the events fired while speaking, from
//!   `started`, `word`, `completed` and `canceled`; `stub.synth.fail`
//!   turns the final result into a cancellation. Synthesized audio is the
//!   input text itself, so payloads can be asserted byte for byte.
//! * `stub.result.grow` and `stub.result.shrink` make the result text
//!   misreport its size between the sizing call and the fill call.
//! * `stub.connection.fire` fires connection events on open and close.

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr::null_mut;
use std::slice;
use std::sync::{Mutex, Once, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use spx_lite::ffi::{
    ApiTable, PEVENT_CALLBACK_FUNC, SPXASYNCHANDLE, SPXAUDIOCONFIGHANDLE,
    SPXAUDIOSTREAMFORMATHANDLE, SPXAUDIOSTREAMHANDLE, SPXCONNECTIONHANDLE, SPXEVENTHANDLE,
    SPXHANDLE, SPXHR, SPXPROPERTYBAGHANDLE, SPXRECOHANDLE, SPXRESULTHANDLE,
    SPXSPEECHCONFIGHANDLE, SPXSYNTHHANDLE, SPXSYNTHRESULTHANDLE, SPXERR_INVALID_ARG,
    SPXERR_INVALID_HANDLE, SPX_NOERROR,
};
use spx_lite::{PropertyId, SpeechConfig};

// ---------------------------------------------------------------------------
// Engine state.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PropKey {
    Id(i32),
    Name(String),
}

impl PropKey {
    // Id- and name-addressed properties share one storage; a known id
    // resolves to the same entry as its canonical name.
    fn id(id: i32) -> Self {
        match PropertyId::from_repr(id) {
            Some(known) => PropKey::Name(known.name().to_string()),
            None => PropKey::Id(id),
        }
    }
}

type Props = HashMap<PropKey, String>;

#[derive(Clone, Copy)]
struct Callback {
    f: PEVENT_CALLBACK_FUNC,
    ctx: usize,
}

#[derive(Clone, Default)]
struct ResultData {
    id: String,
    text: String,
    reason: i32,
    offset: u64,
    duration: u64,
    cancel: Option<(i32, i32, String)>,
    grow: bool,
    shrink: bool,
    tag: String,
}

#[derive(Clone, Default)]
struct SynthData {
    id: String,
    reason: i32,
    audio: Vec<u8>,
    cancel: Option<(i32, i32, String)>,
    tag: String,
}

#[derive(Clone)]
enum EventPayload {
    Session { session: String },
    Recognition { session: String, data: ResultData },
    Synthesis { data: SynthData },
    WordBoundary { audio_offset: u64, text_offset: u32, word_length: u32 },
    Connection { session: String },
}

enum Obj {
    Config { props: Props },
    Bag { owner: usize },
    AudioConfig,
    AudioFormat,
    Stream { written: Vec<u8>, closed: bool },
    Reco { props: Props, callbacks: [Option<Callback>; 5] },
    Synth { props: Props, callbacks: [Option<Callback>; 4] },
    Conn { reco: usize, callbacks: [Option<Callback>; 2] },
    AsyncOp { target: usize, op: AsyncKind },
    RecoResult { data: ResultData, props: Props },
    SynthResult { data: SynthData, props: Props },
    Event { payload: EventPayload },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum AsyncKind {
    RecognizeOnce,
    StartContinuous,
    StopContinuous,
}

struct Entry {
    kind: &'static str,
    tag: String,
    obj: Obj,
}

#[derive(Default, Clone)]
struct TagStats {
    created: HashMap<&'static str, usize>,
    released: HashMap<&'static str, usize>,
    recognitions_started: usize,
    active_recognitions: usize,
}

struct Engine {
    next: usize,
    result_seq: usize,
    objects: HashMap<usize, Entry>,
    stats: HashMap<String, TagStats>,
}

impl Engine {
    fn new() -> Self {
        Self {
            next: 1,
            result_seq: 1,
            objects: HashMap::new(),
            stats: HashMap::new(),
        }
    }

    fn alloc(&mut self, kind: &'static str, tag: String, obj: Obj) -> usize {
        let handle = self.next;
        self.next += 1;
        *self
            .stats
            .entry(tag.clone())
            .or_default()
            .created
            .entry(kind)
            .or_default() += 1;
        self.objects.insert(handle, Entry { kind, tag, obj });
        handle
    }

    fn props_of(&self, handle: usize) -> Option<&Props> {
        match &self.objects.get(&handle)?.obj {
            Obj::Config { props }
            | Obj::Reco { props, .. }
            | Obj::Synth { props, .. }
            | Obj::RecoResult { props, .. }
            | Obj::SynthResult { props, .. } => Some(props),
            _ => None,
        }
    }

    fn props_of_mut(&mut self, handle: usize) -> Option<&mut Props> {
        match &mut self.objects.get_mut(&handle)?.obj {
            Obj::Config { props }
            | Obj::Reco { props, .. }
            | Obj::Synth { props, .. }
            | Obj::RecoResult { props, .. }
            | Obj::SynthResult { props, .. } => Some(props),
            _ => None,
        }
    }

    fn mint_result(&mut self, script: &Script, reason: i32, canceled: bool) -> ResultData {
        let id = format!("r-{}", self.result_seq);
        self.result_seq += 1;
        if canceled {
            let cancel = script
                .cancel
                .clone()
                .unwrap_or((1, 5, "connection failure".to_string()));
            ResultData {
                id,
                text: String::new(),
                reason: 1,
                offset: script.offset,
                duration: 0,
                cancel: Some(cancel),
                grow: script.grow,
                shrink: script.shrink,
                tag: script.tag.clone(),
            }
        } else {
            ResultData {
                id,
                text: script.text.clone(),
                reason,
                offset: script.offset,
                duration: script.duration,
                cancel: None,
                grow: script.grow,
                shrink: script.shrink,
                tag: script.tag.clone(),
            }
        }
    }

    fn store_result(&mut self, data: ResultData) -> usize {
        let mut props = Props::new();
        props.insert(
            PropKey::id(5000),
            format!("{{\"DisplayText\":\"{}\"}}", data.text),
        );
        if let Some((_, _, details)) = &data.cancel {
            if !details.is_empty() {
                props.insert(PropKey::id(5001), details.clone());
            }
        }
        let tag = data.tag.clone();
        self.alloc("result", tag, Obj::RecoResult { data, props })
    }

    fn store_synth_result(&mut self, data: SynthData) -> usize {
        let mut props = Props::new();
        if let Some((_, _, details)) = &data.cancel {
            if !details.is_empty() {
                props.insert(PropKey::id(5001), details.clone());
            }
        }
        let tag = data.tag.clone();
        self.alloc("synth-result", tag, Obj::SynthResult { data, props })
    }
}

fn engine() -> &'static Mutex<Engine> {
    static ENGINE: OnceLock<Mutex<Engine>> = OnceLock::new();
    ENGINE.get_or_init(|| Mutex::new(Engine::new()))
}

fn with_engine<T>(f: impl FnOnce(&mut Engine) -> T) -> T {
    f(&mut engine().lock().unwrap())
}

// ---------------------------------------------------------------------------
// Scripts.
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct Script {
    tag: String,
    session: String,
    text: String,
    reason: i32,
    offset: u64,
    duration: u64,
    delay_ms: u64,
    cancel: Option<(i32, i32, String)>,
    grow: bool,
    shrink: bool,
    fire_start: Vec<String>,
    fire_stop: Vec<String>,
    fire_thread: bool,
    fire_delay_ms: u64,
    synth_events: Vec<String>,
    synth_fail: bool,
    conn_fire: bool,
}

fn parse_script(props: &Props) -> Script {
    let get = |name: &str| props.get(&PropKey::Name(name.to_string())).cloned();
    let list = |name: &str| {
        get(name)
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    };
    let flag = |name: &str| get(name).as_deref() == Some("1");
    let num = |name: &str, default: u64| {
        get(name).and_then(|v| v.parse().ok()).unwrap_or(default)
    };
    let cancel = get("stub.recognize.cancel.reason").map(|reason| {
        (
            reason.parse().unwrap_or(1),
            num("stub.recognize.cancel.code", 0) as i32,
            get("stub.recognize.cancel.details").unwrap_or_default(),
        )
    });
    Script {
        tag: get("stub.tag").unwrap_or_default(),
        session: get("stub.session").unwrap_or_else(|| "sess-1".to_string()),
        text: get("stub.recognize.text").unwrap_or_else(|| "hello world".to_string()),
        reason: num("stub.recognize.reason", 3) as i32,
        offset: num("stub.recognize.offset", 1_000_000),
        duration: num("stub.recognize.duration", 20_000_000),
        delay_ms: num("stub.recognize.delay_ms", 0),
        cancel,
        grow: flag("stub.result.grow"),
        shrink: flag("stub.result.shrink"),
        fire_start: list("stub.continuous.fire"),
        fire_stop: list("stub.continuous.fire-stop"),
        fire_thread: flag("stub.fire.thread"),
        fire_delay_ms: num("stub.fire.delay_ms", 50),
        synth_events: list("stub.synth.events"),
        synth_fail: flag("stub.synth.fail"),
        conn_fire: flag("stub.connection.fire"),
    }
}

// ---------------------------------------------------------------------------
// Shared plumbing.
// ---------------------------------------------------------------------------

unsafe fn cstr(p: *const c_char) -> Option<String> {
    if p.is_null() {
        None
    } else {
        Some(CStr::from_ptr(p).to_string_lossy().into_owned())
    }
}

unsafe fn put_bytes(data: &[u8], buf: *mut u8, len: *mut u32) -> SPXHR {
    if len.is_null() {
        return SPXERR_INVALID_ARG;
    }
    if buf.is_null() {
        *len = data.len() as u32;
        return SPX_NOERROR;
    }
    let cap = *len as usize;
    let n = data.len().min(cap);
    std::ptr::copy_nonoverlapping(data.as_ptr(), buf, n);
    *len = n as u32;
    SPX_NOERROR
}

// The grow and shrink variants deliberately break the two-call contract
// to exercise the caller's handling of a misbehaving core.
unsafe fn put_text(data: &str, grow: bool, shrink: bool, buf: *mut c_char, len: *mut u32) -> SPXHR {
    if len.is_null() {
        return SPXERR_INVALID_ARG;
    }
    if buf.is_null() {
        *len = data.len() as u32;
        return SPX_NOERROR;
    }
    let cap = *len as usize;
    if grow {
        let n = data.len().min(cap);
        std::ptr::copy_nonoverlapping(data.as_ptr(), buf.cast::<u8>(), n);
        *len = (cap + 5) as u32;
        return SPX_NOERROR;
    }
    let wanted = if shrink {
        data.len().saturating_sub(3)
    } else {
        data.len()
    };
    let n = wanted.min(cap);
    std::ptr::copy_nonoverlapping(data.as_ptr(), buf.cast::<u8>(), n);
    *len = n as u32;
    SPX_NOERROR
}

fn release_kind(h: SPXHANDLE, kinds: &[&'static str]) -> SPXHR {
    with_engine(|e| {
        let key = h as usize;
        let matches = e
            .objects
            .get(&key)
            .map(|entry| kinds.contains(&entry.kind))
            .unwrap_or(false);
        if !matches {
            return SPXERR_INVALID_HANDLE;
        }
        let entry = e.objects.remove(&key).unwrap();
        // Configurations are created before the tag property is set, so
        // their tag is read at release time instead of creation time.
        let tag = match &entry.obj {
            Obj::Config { props } => props
                .get(&PropKey::Name("stub.tag".to_string()))
                .cloned()
                .unwrap_or_default(),
            _ => entry.tag.clone(),
        };
        *e.stats
            .entry(tag)
            .or_default()
            .released
            .entry(entry.kind)
            .or_default() += 1;
        SPX_NOERROR
    })
}

fn get_bag(owner: SPXHANDLE, out: *mut SPXPROPERTYBAGHANDLE) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let key = owner as usize;
        if e.props_of(key).is_none() {
            return SPXERR_INVALID_HANDLE;
        }
        let tag = e.objects[&key].tag.clone();
        let handle = e.alloc("bag", tag, Obj::Bag { owner: key });
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

struct Pending {
    cb: Callback,
    hevent: usize,
}

fn fire(pending: Vec<Pending>) {
    for p in pending {
        unsafe { (p.cb.f)(null_mut(), p.hevent as SPXHANDLE, p.ctx_ptr()) };
    }
}

impl Pending {
    fn ctx_ptr(&self) -> *mut c_void {
        self.cb.ctx as *mut c_void
    }
}

// ---------------------------------------------------------------------------
// Speech configuration.
// ---------------------------------------------------------------------------

unsafe extern "C" fn conf_from_subscription(
    out: *mut SPXSPEECHCONFIGHANDLE,
    key: *const c_char,
    region: *const c_char,
) -> SPXHR {
    let (Some(key), Some(region)) = (cstr(key), cstr(region)) else {
        return SPXERR_INVALID_ARG;
    };
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let mut props = Props::new();
        props.insert(PropKey::id(1000), key);
        props.insert(PropKey::id(1002), region);
        let handle = e.alloc("config", String::new(), Obj::Config { props });
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn conf_from_endpoint(
    out: *mut SPXSPEECHCONFIGHANDLE,
    endpoint: *const c_char,
    key: *const c_char,
) -> SPXHR {
    let Some(endpoint) = cstr(endpoint) else {
        return SPXERR_INVALID_ARG;
    };
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let mut props = Props::new();
        props.insert(PropKey::id(1001), endpoint);
        if let Some(key) = cstr(key) {
            props.insert(PropKey::id(1000), key);
        }
        let handle = e.alloc("config", String::new(), Obj::Config { props });
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn conf_from_authorization_token(
    out: *mut SPXSPEECHCONFIGHANDLE,
    token: *const c_char,
    region: *const c_char,
) -> SPXHR {
    let (Some(token), Some(region)) = (cstr(token), cstr(region)) else {
        return SPXERR_INVALID_ARG;
    };
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let mut props = Props::new();
        props.insert(PropKey::id(1003), token);
        props.insert(PropKey::id(1002), region);
        let handle = e.alloc("config", String::new(), Obj::Config { props });
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn conf_get_property_bag(
    h: SPXSPEECHCONFIGHANDLE,
    out: *mut SPXPROPERTYBAGHANDLE,
) -> SPXHR {
    get_bag(h, out)
}

unsafe extern "C" fn conf_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["config"])
}

// ---------------------------------------------------------------------------
// Property bags.
// ---------------------------------------------------------------------------

fn bag_key(id: c_int, name: *const c_char) -> Option<PropKey> {
    if id == -1 {
        unsafe { cstr(name) }.map(PropKey::Name)
    } else {
        Some(PropKey::id(id))
    }
}

unsafe extern "C" fn bag_set_string(
    hbag: SPXPROPERTYBAGHANDLE,
    id: c_int,
    name: *const c_char,
    value: *const c_char,
) -> SPXHR {
    let Some(key) = bag_key(id, name) else {
        return SPXERR_INVALID_ARG;
    };
    let Some(value) = cstr(value) else {
        return SPXERR_INVALID_ARG;
    };
    with_engine(|e| {
        let owner = match e.objects.get(&(hbag as usize)) {
            Some(Entry { obj: Obj::Bag { owner }, .. }) => *owner,
            _ => return SPXERR_INVALID_HANDLE,
        };
        match e.props_of_mut(owner) {
            Some(props) => {
                props.insert(key, value);
                SPX_NOERROR
            }
            None => SPXERR_INVALID_HANDLE,
        }
    })
}

unsafe extern "C" fn bag_get_string(
    hbag: SPXPROPERTYBAGHANDLE,
    id: c_int,
    name: *const c_char,
    default: *const c_char,
) -> *mut c_char {
    let Some(key) = bag_key(id, name) else {
        return null_mut();
    };
    let value = with_engine(|e| {
        let owner = match e.objects.get(&(hbag as usize)) {
            Some(Entry { obj: Obj::Bag { owner }, .. }) => *owner,
            _ => return None,
        };
        e.props_of(owner).and_then(|props| props.get(&key).cloned())
    });
    let value = match value {
        Some(value) => value,
        None => match cstr(default) {
            Some(default) => default,
            None => return null_mut(),
        },
    };
    CString::new(value)
        .map(CString::into_raw)
        .unwrap_or(null_mut())
}

unsafe extern "C" fn bag_free_string(p: *mut c_char) -> SPXHR {
    if !p.is_null() {
        drop(CString::from_raw(p));
    }
    SPX_NOERROR
}

unsafe extern "C" fn bag_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["bag"])
}

// ---------------------------------------------------------------------------
// Audio configuration and streams.
// ---------------------------------------------------------------------------

fn new_audio_config(out: *mut SPXAUDIOCONFIGHANDLE) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let handle = e.alloc("audio-config", String::new(), Obj::AudioConfig);
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn audio_in_default(out: *mut SPXAUDIOCONFIGHANDLE) -> SPXHR {
    new_audio_config(out)
}

unsafe extern "C" fn audio_in_file(
    out: *mut SPXAUDIOCONFIGHANDLE,
    path: *const c_char,
) -> SPXHR {
    if cstr(path).is_none() {
        return SPXERR_INVALID_ARG;
    }
    new_audio_config(out)
}

unsafe extern "C" fn audio_in_stream(
    out: *mut SPXAUDIOCONFIGHANDLE,
    hstream: SPXAUDIOSTREAMHANDLE,
) -> SPXHR {
    let live = with_engine(|e| {
        e.objects
            .get(&(hstream as usize))
            .map(|entry| entry.kind == "stream")
            .unwrap_or(false)
    });
    if !live {
        return SPXERR_INVALID_HANDLE;
    }
    new_audio_config(out)
}

unsafe extern "C" fn audio_out_default(out: *mut SPXAUDIOCONFIGHANDLE) -> SPXHR {
    new_audio_config(out)
}

unsafe extern "C" fn audio_out_file(
    out: *mut SPXAUDIOCONFIGHANDLE,
    path: *const c_char,
) -> SPXHR {
    if cstr(path).is_none() {
        return SPXERR_INVALID_ARG;
    }
    new_audio_config(out)
}

unsafe extern "C" fn audio_config_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["audio-config"])
}

unsafe extern "C" fn stream_format_create(
    out: *mut SPXAUDIOSTREAMFORMATHANDLE,
    rate: u32,
    bits: u8,
    channels: u8,
) -> SPXHR {
    if out.is_null() || rate == 0 || bits == 0 || channels == 0 {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let handle = e.alloc("format", String::new(), Obj::AudioFormat);
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn stream_format_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["format"])
}

unsafe extern "C" fn stream_create_push(
    out: *mut SPXAUDIOSTREAMHANDLE,
    hformat: SPXAUDIOSTREAMFORMATHANDLE,
) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let live = e
            .objects
            .get(&(hformat as usize))
            .map(|entry| entry.kind == "format")
            .unwrap_or(false);
        if !live {
            return SPXERR_INVALID_HANDLE;
        }
        let handle = e.alloc(
            "stream",
            String::new(),
            Obj::Stream {
                written: Vec::new(),
                closed: false,
            },
        );
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn stream_write(
    h: SPXAUDIOSTREAMHANDLE,
    data: *const u8,
    size: u32,
) -> SPXHR {
    if data.is_null() && size > 0 {
        return SPXERR_INVALID_ARG;
    }
    let chunk = if size == 0 {
        Vec::new()
    } else {
        slice::from_raw_parts(data, size as usize).to_vec()
    };
    with_engine(|e| match e.objects.get_mut(&(h as usize)) {
        Some(Entry { obj: Obj::Stream { written, closed }, .. }) => {
            if *closed {
                SPXERR_INVALID_ARG
            } else {
                written.extend_from_slice(&chunk);
                SPX_NOERROR
            }
        }
        _ => SPXERR_INVALID_HANDLE,
    })
}

unsafe extern "C" fn stream_close(h: SPXAUDIOSTREAMHANDLE) -> SPXHR {
    with_engine(|e| match e.objects.get_mut(&(h as usize)) {
        Some(Entry { obj: Obj::Stream { closed, .. }, .. }) => {
            *closed = true;
            SPX_NOERROR
        }
        _ => SPXERR_INVALID_HANDLE,
    })
}

unsafe extern "C" fn stream_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["stream"])
}

// ---------------------------------------------------------------------------
// Speech recognizer.
// ---------------------------------------------------------------------------

unsafe extern "C" fn reco_create(
    out: *mut SPXRECOHANDLE,
    hconfig: SPXSPEECHCONFIGHANDLE,
    haudio: SPXAUDIOCONFIGHANDLE,
) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let props = match e.objects.get(&(hconfig as usize)) {
            Some(Entry { obj: Obj::Config { props }, .. }) => props.clone(),
            _ => return SPXERR_INVALID_HANDLE,
        };
        let audio_live = e
            .objects
            .get(&(haudio as usize))
            .map(|entry| entry.kind == "audio-config")
            .unwrap_or(false);
        if !audio_live {
            return SPXERR_INVALID_HANDLE;
        }
        let tag = parse_script(&props).tag;
        let handle = e.alloc(
            "reco",
            tag,
            Obj::Reco {
                props,
                callbacks: [None; 5],
            },
        );
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn reco_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["reco"])
}

unsafe extern "C" fn reco_get_property_bag(
    h: SPXRECOHANDLE,
    out: *mut SPXPROPERTYBAGHANDLE,
) -> SPXHR {
    get_bag(h, out)
}

fn new_async(h: SPXRECOHANDLE, out: *mut SPXASYNCHANDLE, op: AsyncKind) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let target = h as usize;
        let tag = match e.objects.get(&target) {
            Some(entry) if entry.kind == "reco" => entry.tag.clone(),
            _ => return SPXERR_INVALID_HANDLE,
        };
        let handle = e.alloc("async", tag, Obj::AsyncOp { target, op });
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn reco_recognize_once(h: SPXRECOHANDLE, out: *mut SPXASYNCHANDLE) -> SPXHR {
    new_async(h, out, AsyncKind::RecognizeOnce)
}

fn resolve_async(e: &mut Engine, hasync: SPXASYNCHANDLE, op: AsyncKind) -> Option<(usize, Script)> {
    let target = match e.objects.get(&(hasync as usize)) {
        Some(Entry { obj: Obj::AsyncOp { target, op: kind }, .. }) if *kind == op => *target,
        _ => return None,
    };
    let script = parse_script(e.props_of(target)?);
    Some((target, script))
}

unsafe extern "C" fn reco_recognize_once_wait(
    hasync: SPXASYNCHANDLE,
    _timeout: u32,
    out: *mut SPXRESULTHANDLE,
) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    let script = with_engine(|e| {
        let (_, script) = resolve_async(e, hasync, AsyncKind::RecognizeOnce)?;
        let stats = e.stats.entry(script.tag.clone()).or_default();
        stats.recognitions_started += 1;
        stats.active_recognitions += 1;
        Some(script)
    });
    let Some(script) = script else {
        return SPXERR_INVALID_HANDLE;
    };
    if script.delay_ms > 0 {
        thread::sleep(Duration::from_millis(script.delay_ms));
    }
    with_engine(|e| {
        e.stats.entry(script.tag.clone()).or_default().active_recognitions -= 1;
        let canceled = script.cancel.is_some() || script.reason == 1;
        let data = e.mint_result(&script, script.reason, canceled);
        let handle = e.store_result(data);
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn reco_start_continuous(h: SPXRECOHANDLE, out: *mut SPXASYNCHANDLE) -> SPXHR {
    new_async(h, out, AsyncKind::StartContinuous)
}

unsafe extern "C" fn reco_stop_continuous(h: SPXRECOHANDLE, out: *mut SPXASYNCHANDLE) -> SPXHR {
    new_async(h, out, AsyncKind::StopContinuous)
}

fn reco_callbacks(e: &Engine, reco: usize) -> Option<[Option<Callback>; 5]> {
    match &e.objects.get(&reco)?.obj {
        Obj::Reco { callbacks, .. } => Some(*callbacks),
        _ => None,
    }
}

// Slots: 0 recognizing, 1 recognized, 2 canceled, 3 session started,
// 4 session stopped.
fn build_reco_fires(e: &mut Engine, reco: usize, script: &Script, names: &[String]) -> Vec<Pending> {
    let Some(callbacks) = reco_callbacks(e, reco) else {
        return Vec::new();
    };
    let mut pending = Vec::new();
    for name in names {
        let (slot, payload) = match name.as_str() {
            "recognizing" => {
                let data = e.mint_result(script, 2, false);
                (0, EventPayload::Recognition { session: script.session.clone(), data })
            }
            "recognized" => {
                let data = e.mint_result(script, script.reason, false);
                (1, EventPayload::Recognition { session: script.session.clone(), data })
            }
            "canceled" => {
                let data = e.mint_result(script, 1, true);
                (2, EventPayload::Recognition { session: script.session.clone(), data })
            }
            "session-started" => (3, EventPayload::Session { session: script.session.clone() }),
            "session-stopped" => (4, EventPayload::Session { session: script.session.clone() }),
            _ => continue,
        };
        if let Some(cb) = callbacks[slot] {
            let hevent = e.alloc("event-reco", script.tag.clone(), Obj::Event { payload });
            pending.push(Pending { cb, hevent });
        }
    }
    pending
}

fn continuous_wait(hasync: SPXASYNCHANDLE, op: AsyncKind) -> SPXHR {
    let fired = with_engine(|e| {
        let (reco, script) = resolve_async(e, hasync, op)?;
        let names = match op {
            AsyncKind::StartContinuous => script.fire_start.clone(),
            _ => script.fire_stop.clone(),
        };
        if op == AsyncKind::StartContinuous {
            if let Some(props) = e.props_of_mut(reco) {
                props.insert(PropKey::id(3002), script.session.clone());
            }
        }
        let pending = build_reco_fires(e, reco, &script, &names);
        Some((script, pending))
    });
    let Some((script, pending)) = fired else {
        return SPXERR_INVALID_HANDLE;
    };
    if script.fire_thread {
        let delay = Duration::from_millis(script.fire_delay_ms);
        thread::spawn(move || {
            thread::sleep(delay);
            fire(pending);
        });
    } else {
        fire(pending);
    }
    SPX_NOERROR
}

unsafe extern "C" fn reco_start_continuous_wait(hasync: SPXASYNCHANDLE, _timeout: u32) -> SPXHR {
    continuous_wait(hasync, AsyncKind::StartContinuous)
}

unsafe extern "C" fn reco_stop_continuous_wait(hasync: SPXASYNCHANDLE, _timeout: u32) -> SPXHR {
    continuous_wait(hasync, AsyncKind::StopContinuous)
}

unsafe extern "C" fn async_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["async"])
}

fn set_reco_callback(
    h: SPXHANDLE,
    slot: usize,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    with_engine(|e| match e.objects.get_mut(&(h as usize)) {
        Some(Entry { obj: Obj::Reco { callbacks, .. }, .. }) => {
            callbacks[slot] = cb.map(|f| Callback { f, ctx: ctx as usize });
            SPX_NOERROR
        }
        _ => SPXERR_INVALID_HANDLE,
    })
}

unsafe extern "C" fn reco_set_recognizing(
    h: SPXHANDLE,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    set_reco_callback(h, 0, cb, ctx)
}

unsafe extern "C" fn reco_set_recognized(
    h: SPXHANDLE,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    set_reco_callback(h, 1, cb, ctx)
}

unsafe extern "C" fn reco_set_canceled(
    h: SPXHANDLE,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    set_reco_callback(h, 2, cb, ctx)
}

unsafe extern "C" fn reco_set_session_started(
    h: SPXHANDLE,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    set_reco_callback(h, 3, cb, ctx)
}

unsafe extern "C" fn reco_set_session_stopped(
    h: SPXHANDLE,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    set_reco_callback(h, 4, cb, ctx)
}

unsafe extern "C" fn reco_event_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["event-reco"])
}

unsafe extern "C" fn reco_event_get_result(
    hevent: SPXEVENTHANDLE,
    out: *mut SPXRESULTHANDLE,
) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let data = match e.objects.get(&(hevent as usize)) {
            Some(Entry { obj: Obj::Event { payload: EventPayload::Recognition { data, .. } }, .. }) => {
                data.clone()
            }
            _ => return SPXERR_INVALID_HANDLE,
        };
        // Every caller owns its own copy of the result.
        let handle = e.store_result(data);
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn reco_event_get_session_id(
    hevent: SPXEVENTHANDLE,
    buf: *mut c_char,
    len: *mut u32,
) -> SPXHR {
    let session = with_engine(|e| match e.objects.get(&(hevent as usize)) {
        Some(Entry { obj: Obj::Event { payload }, .. }) => match payload {
            EventPayload::Session { session } => Some(session.clone()),
            EventPayload::Recognition { session, .. } => Some(session.clone()),
            _ => None,
        },
        _ => None,
    });
    match session {
        Some(session) => put_text(&session, false, false, buf, len),
        None => SPXERR_INVALID_HANDLE,
    }
}

// ---------------------------------------------------------------------------
// Recognition results.
// ---------------------------------------------------------------------------

fn with_result_data<T>(h: SPXRESULTHANDLE, f: impl FnOnce(&ResultData) -> T) -> Option<T> {
    with_engine(|e| match e.objects.get(&(h as usize)) {
        Some(Entry { obj: Obj::RecoResult { data, .. }, .. }) => Some(f(data)),
        _ => None,
    })
}

unsafe extern "C" fn result_get_result_id(
    h: SPXRESULTHANDLE,
    buf: *mut c_char,
    len: *mut u32,
) -> SPXHR {
    match with_result_data(h, |data| data.id.clone()) {
        Some(id) => put_text(&id, false, false, buf, len),
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn result_get_text(
    h: SPXRESULTHANDLE,
    buf: *mut c_char,
    len: *mut u32,
) -> SPXHR {
    match with_result_data(h, |data| (data.text.clone(), data.grow, data.shrink)) {
        Some((text, grow, shrink)) => put_text(&text, grow, shrink, buf, len),
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn result_get_reason(h: SPXRESULTHANDLE, out: *mut c_int) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    match with_result_data(h, |data| data.reason) {
        Some(reason) => {
            *out = reason;
            SPX_NOERROR
        }
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn result_get_offset(h: SPXRESULTHANDLE, out: *mut u64) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    match with_result_data(h, |data| data.offset) {
        Some(offset) => {
            *out = offset;
            SPX_NOERROR
        }
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn result_get_duration(h: SPXRESULTHANDLE, out: *mut u64) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    match with_result_data(h, |data| data.duration) {
        Some(duration) => {
            *out = duration;
            SPX_NOERROR
        }
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn result_get_reason_canceled(h: SPXRESULTHANDLE, out: *mut c_int) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    match with_result_data(h, |data| data.cancel.clone()) {
        Some(cancel) => {
            *out = cancel.map(|(reason, _, _)| reason).unwrap_or(1);
            SPX_NOERROR
        }
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn result_get_canceled_error_code(
    h: SPXRESULTHANDLE,
    out: *mut c_int,
) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    match with_result_data(h, |data| data.cancel.clone()) {
        Some(cancel) => {
            *out = cancel.map(|(_, code, _)| code).unwrap_or(0);
            SPX_NOERROR
        }
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn result_get_property_bag(
    h: SPXRESULTHANDLE,
    out: *mut SPXPROPERTYBAGHANDLE,
) -> SPXHR {
    get_bag(h, out)
}

unsafe extern "C" fn result_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["result"])
}

// ---------------------------------------------------------------------------
// Speech synthesizer.
// ---------------------------------------------------------------------------

unsafe extern "C" fn synth_create(
    out: *mut SPXSYNTHHANDLE,
    hconfig: SPXSPEECHCONFIGHANDLE,
    haudio: SPXAUDIOCONFIGHANDLE,
) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let mut props = match e.objects.get(&(hconfig as usize)) {
            Some(Entry { obj: Obj::Config { props }, .. }) => props.clone(),
            _ => return SPXERR_INVALID_HANDLE,
        };
        if haudio.is_null() {
            props.insert(PropKey::Name("stub.synth.audio-config".to_string()), "null".to_string());
        } else {
            let live = e
                .objects
                .get(&(haudio as usize))
                .map(|entry| entry.kind == "audio-config")
                .unwrap_or(false);
            if !live {
                return SPXERR_INVALID_HANDLE;
            }
            props.insert(PropKey::Name("stub.synth.audio-config".to_string()), "set".to_string());
        }
        let tag = parse_script(&props).tag;
        let handle = e.alloc(
            "synth",
            tag,
            Obj::Synth {
                props,
                callbacks: [None; 4],
            },
        );
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn synth_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["synth"])
}

unsafe extern "C" fn synth_get_property_bag(
    h: SPXSYNTHHANDLE,
    out: *mut SPXPROPERTYBAGHANDLE,
) -> SPXHR {
    get_bag(h, out)
}

fn first_word_len(text: &str) -> u32 {
    text.split_whitespace().next().map_or(0, |w| w.len() as u32)
}

// Slots: 0 started, 1 completed, 2 canceled, 3 word boundary.
fn speak(h: SPXSYNTHHANDLE, text: *const c_char, length: u32, out: *mut SPXSYNTHRESULTHANDLE, kind: &str) -> SPXHR {
    if out.is_null() || text.is_null() {
        return SPXERR_INVALID_ARG;
    }
    let payload = unsafe { slice::from_raw_parts(text.cast::<u8>(), length as usize) }.to_vec();
    let text = String::from_utf8_lossy(&payload).into_owned();
    let outcome = with_engine(|e| {
        let synth = h as usize;
        let (script, callbacks) = match e.objects.get_mut(&synth) {
            Some(Entry { obj: Obj::Synth { props, callbacks }, .. }) => {
                props.insert(PropKey::Name("stub.last-speak".to_string()), kind.to_string());
                (parse_script(props), *callbacks)
            }
            _ => return None,
        };
        let seq = e.result_seq;
        e.result_seq += 1;
        let cancel = script
            .cancel
            .clone()
            .unwrap_or((1, 7, "service error".to_string()));
        let mut pending = Vec::new();
        for name in &script.synth_events {
            let (slot, payload) = match name.as_str() {
                "started" => (
                    0,
                    EventPayload::Synthesis {
                        data: SynthData {
                            id: format!("s-{seq}"),
                            reason: 12,
                            audio: Vec::new(),
                            cancel: None,
                            tag: script.tag.clone(),
                        },
                    },
                ),
                "completed" => (
                    1,
                    EventPayload::Synthesis {
                        data: SynthData {
                            id: format!("s-{seq}"),
                            reason: 9,
                            audio: payload.clone(),
                            cancel: None,
                            tag: script.tag.clone(),
                        },
                    },
                ),
                "canceled" => (
                    2,
                    EventPayload::Synthesis {
                        data: SynthData {
                            id: format!("s-{seq}"),
                            reason: 1,
                            audio: Vec::new(),
                            cancel: Some(cancel.clone()),
                            tag: script.tag.clone(),
                        },
                    },
                ),
                "word" => (
                    3,
                    EventPayload::WordBoundary {
                        audio_offset: 1_000_000,
                        text_offset: 0,
                        word_length: first_word_len(&text),
                    },
                ),
                _ => continue,
            };
            if let Some(cb) = callbacks[slot] {
                let hevent = e.alloc("event-synth", script.tag.clone(), Obj::Event { payload });
                pending.push(Pending { cb, hevent });
            }
        }
        let data = if script.synth_fail {
            SynthData {
                id: format!("s-{seq}"),
                reason: 1,
                audio: Vec::new(),
                cancel: Some(cancel),
                tag: script.tag.clone(),
            }
        } else {
            SynthData {
                id: format!("s-{seq}"),
                reason: 9,
                audio: payload,
                cancel: None,
                tag: script.tag.clone(),
            }
        };
        let handle = e.store_synth_result(data);
        Some((pending, handle))
    });
    let Some((pending, handle)) = outcome else {
        return SPXERR_INVALID_HANDLE;
    };
    fire(pending);
    unsafe { *out = handle as SPXHANDLE };
    SPX_NOERROR
}

unsafe extern "C" fn synth_speak_text(
    h: SPXSYNTHHANDLE,
    text: *const c_char,
    length: u32,
    out: *mut SPXSYNTHRESULTHANDLE,
) -> SPXHR {
    speak(h, text, length, out, "text")
}

unsafe extern "C" fn synth_speak_ssml(
    h: SPXSYNTHHANDLE,
    text: *const c_char,
    length: u32,
    out: *mut SPXSYNTHRESULTHANDLE,
) -> SPXHR {
    speak(h, text, length, out, "ssml")
}

fn set_synth_callback(
    h: SPXHANDLE,
    slot: usize,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    with_engine(|e| match e.objects.get_mut(&(h as usize)) {
        Some(Entry { obj: Obj::Synth { callbacks, .. }, .. }) => {
            callbacks[slot] = cb.map(|f| Callback { f, ctx: ctx as usize });
            SPX_NOERROR
        }
        _ => SPXERR_INVALID_HANDLE,
    })
}

unsafe extern "C" fn synth_set_started(
    h: SPXHANDLE,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    set_synth_callback(h, 0, cb, ctx)
}

unsafe extern "C" fn synth_set_completed(
    h: SPXHANDLE,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    set_synth_callback(h, 1, cb, ctx)
}

unsafe extern "C" fn synth_set_canceled(
    h: SPXHANDLE,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    set_synth_callback(h, 2, cb, ctx)
}

unsafe extern "C" fn synth_set_word_boundary(
    h: SPXHANDLE,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    set_synth_callback(h, 3, cb, ctx)
}

unsafe extern "C" fn synth_event_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["event-synth"])
}

unsafe extern "C" fn synth_event_get_result(
    hevent: SPXEVENTHANDLE,
    out: *mut SPXSYNTHRESULTHANDLE,
) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let data = match e.objects.get(&(hevent as usize)) {
            Some(Entry { obj: Obj::Event { payload: EventPayload::Synthesis { data } }, .. }) => {
                data.clone()
            }
            _ => return SPXERR_INVALID_HANDLE,
        };
        let handle = e.store_synth_result(data);
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn synth_word_boundary_values(
    hevent: SPXEVENTHANDLE,
    audio_offset: *mut u64,
    text_offset: *mut u32,
    word_length: *mut u32,
) -> SPXHR {
    if audio_offset.is_null() || text_offset.is_null() || word_length.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| match e.objects.get(&(hevent as usize)) {
        Some(Entry {
            obj:
                Obj::Event {
                    payload:
                        EventPayload::WordBoundary { audio_offset: ao, text_offset: to, word_length: wl },
                },
            ..
        }) => {
            unsafe {
                *audio_offset = *ao;
                *text_offset = *to;
                *word_length = *wl;
            }
            SPX_NOERROR
        }
        _ => SPXERR_INVALID_HANDLE,
    })
}

// ---------------------------------------------------------------------------
// Synthesis results.
// ---------------------------------------------------------------------------

fn with_synth_data<T>(h: SPXSYNTHRESULTHANDLE, f: impl FnOnce(&SynthData) -> T) -> Option<T> {
    with_engine(|e| match e.objects.get(&(h as usize)) {
        Some(Entry { obj: Obj::SynthResult { data, .. }, .. }) => Some(f(data)),
        _ => None,
    })
}

unsafe extern "C" fn synth_result_get_result_id(
    h: SPXSYNTHRESULTHANDLE,
    buf: *mut c_char,
    len: *mut u32,
) -> SPXHR {
    match with_synth_data(h, |data| data.id.clone()) {
        Some(id) => put_text(&id, false, false, buf, len),
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn synth_result_get_reason(h: SPXSYNTHRESULTHANDLE, out: *mut c_int) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    match with_synth_data(h, |data| data.reason) {
        Some(reason) => {
            *out = reason;
            SPX_NOERROR
        }
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn synth_result_get_reason_canceled(
    h: SPXSYNTHRESULTHANDLE,
    out: *mut c_int,
) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    match with_synth_data(h, |data| data.cancel.clone()) {
        Some(cancel) => {
            *out = cancel.map(|(reason, _, _)| reason).unwrap_or(1);
            SPX_NOERROR
        }
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn synth_result_get_canceled_error_code(
    h: SPXSYNTHRESULTHANDLE,
    out: *mut c_int,
) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    match with_synth_data(h, |data| data.cancel.clone()) {
        Some(cancel) => {
            *out = cancel.map(|(_, code, _)| code).unwrap_or(0);
            SPX_NOERROR
        }
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn synth_result_get_audio_data(
    h: SPXSYNTHRESULTHANDLE,
    buf: *mut u8,
    len: *mut u32,
) -> SPXHR {
    match with_synth_data(h, |data| data.audio.clone()) {
        Some(audio) => put_bytes(&audio, buf, len),
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn synth_result_get_property_bag(
    h: SPXSYNTHRESULTHANDLE,
    out: *mut SPXPROPERTYBAGHANDLE,
) -> SPXHR {
    get_bag(h, out)
}

unsafe extern "C" fn synth_result_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["synth-result"])
}

// ---------------------------------------------------------------------------
// Connection.
// ---------------------------------------------------------------------------

unsafe extern "C" fn conn_from_recognizer(
    hreco: SPXRECOHANDLE,
    out: *mut SPXCONNECTIONHANDLE,
) -> SPXHR {
    if out.is_null() {
        return SPXERR_INVALID_ARG;
    }
    with_engine(|e| {
        let reco = hreco as usize;
        let tag = match e.objects.get(&reco) {
            Some(entry) if entry.kind == "reco" => entry.tag.clone(),
            _ => return SPXERR_INVALID_HANDLE,
        };
        let handle = e.alloc(
            "conn",
            tag,
            Obj::Conn {
                reco,
                callbacks: [None; 2],
            },
        );
        unsafe { *out = handle as SPXHANDLE };
        SPX_NOERROR
    })
}

unsafe extern "C" fn conn_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["conn"])
}

// Slots: 0 connected, 1 disconnected.
fn conn_fire(h: SPXCONNECTIONHANDLE, slot: usize, note: (&str, String)) -> SPXHR {
    let pending = with_engine(|e| {
        let (reco, callbacks) = match e.objects.get(&(h as usize)) {
            Some(Entry { obj: Obj::Conn { reco, callbacks }, .. }) => (*reco, *callbacks),
            _ => return None,
        };
        let script = parse_script(e.props_of(reco)?);
        if let Some(props) = e.props_of_mut(reco) {
            props.insert(PropKey::Name(note.0.to_string()), note.1);
        }
        if !script.conn_fire {
            return Some(Vec::new());
        }
        let mut pending = Vec::new();
        if let Some(cb) = callbacks[slot] {
            let hevent = e.alloc(
                "event-conn",
                script.tag.clone(),
                Obj::Event {
                    payload: EventPayload::Connection { session: script.session.clone() },
                },
            );
            pending.push(Pending { cb, hevent });
        }
        Some(pending)
    });
    let Some(pending) = pending else {
        return SPXERR_INVALID_HANDLE;
    };
    fire(pending);
    SPX_NOERROR
}

unsafe extern "C" fn conn_open(h: SPXCONNECTIONHANDLE, for_continuous: bool) -> SPXHR {
    conn_fire(h, 0, ("stub.connection.last-open", for_continuous.to_string()))
}

unsafe extern "C" fn conn_close(h: SPXCONNECTIONHANDLE) -> SPXHR {
    conn_fire(h, 1, ("stub.connection.last-close", "1".to_string()))
}

fn set_conn_callback(
    h: SPXHANDLE,
    slot: usize,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    with_engine(|e| match e.objects.get_mut(&(h as usize)) {
        Some(Entry { obj: Obj::Conn { callbacks, .. }, .. }) => {
            callbacks[slot] = cb.map(|f| Callback { f, ctx: ctx as usize });
            SPX_NOERROR
        }
        _ => SPXERR_INVALID_HANDLE,
    })
}

unsafe extern "C" fn conn_set_connected(
    h: SPXHANDLE,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    set_conn_callback(h, 0, cb, ctx)
}

unsafe extern "C" fn conn_set_disconnected(
    h: SPXHANDLE,
    cb: Option<PEVENT_CALLBACK_FUNC>,
    ctx: *mut c_void,
) -> SPXHR {
    set_conn_callback(h, 1, cb, ctx)
}

unsafe extern "C" fn conn_event_get_session_id(
    hevent: SPXEVENTHANDLE,
    buf: *mut c_char,
    len: *mut u32,
) -> SPXHR {
    let session = with_engine(|e| match e.objects.get(&(hevent as usize)) {
        Some(Entry { obj: Obj::Event { payload: EventPayload::Connection { session } }, .. }) => {
            Some(session.clone())
        }
        _ => None,
    });
    match session {
        Some(session) => put_text(&session, false, false, buf, len),
        None => SPXERR_INVALID_HANDLE,
    }
}

unsafe extern "C" fn conn_event_release(h: SPXHANDLE) -> SPXHR {
    release_kind(h, &["event-conn"])
}

// ---------------------------------------------------------------------------
// Test-facing interface.
// ---------------------------------------------------------------------------

/// The full API table backed by this fake engine.
pub fn table() -> ApiTable {
    ApiTable {
        speech_config_from_subscription: conf_from_subscription,
        speech_config_from_endpoint: conf_from_endpoint,
        speech_config_from_authorization_token: conf_from_authorization_token,
        speech_config_get_property_bag: conf_get_property_bag,
        speech_config_release: conf_release,

        property_bag_set_string: bag_set_string,
        property_bag_get_string: bag_get_string,
        property_bag_free_string: bag_free_string,
        property_bag_release: bag_release,

        audio_config_create_audio_input_from_default_microphone: audio_in_default,
        audio_config_create_audio_input_from_wav_file_name: audio_in_file,
        audio_config_create_audio_input_from_stream: audio_in_stream,
        audio_config_create_audio_output_from_default_speaker: audio_out_default,
        audio_config_create_audio_output_from_wav_file_name: audio_out_file,
        audio_config_release,

        audio_stream_format_create_from_waveformat_pcm: stream_format_create,
        audio_stream_format_release: stream_format_release,
        audio_stream_create_push_audio_input_stream: stream_create_push,
        push_audio_input_stream_write: stream_write,
        push_audio_input_stream_close: stream_close,
        audio_stream_release: stream_release,

        recognizer_create_speech_recognizer_from_config: reco_create,
        recognizer_handle_release: reco_release,
        recognizer_get_property_bag: reco_get_property_bag,
        recognizer_recognize_once_async: reco_recognize_once,
        recognizer_recognize_once_async_wait_for: reco_recognize_once_wait,
        recognizer_start_continuous_recognition_async: reco_start_continuous,
        recognizer_start_continuous_recognition_async_wait_for: reco_start_continuous_wait,
        recognizer_stop_continuous_recognition_async: reco_stop_continuous,
        recognizer_stop_continuous_recognition_async_wait_for: reco_stop_continuous_wait,
        recognizer_async_handle_release: async_release,
        recognizer_recognizing_set_callback: reco_set_recognizing,
        recognizer_recognized_set_callback: reco_set_recognized,
        recognizer_canceled_set_callback: reco_set_canceled,
        recognizer_session_started_set_callback: reco_set_session_started,
        recognizer_session_stopped_set_callback: reco_set_session_stopped,
        recognizer_event_handle_release: reco_event_release,
        recognizer_recognition_event_get_result: reco_event_get_result,
        recognizer_session_event_get_session_id: reco_event_get_session_id,

        result_get_result_id,
        result_get_text,
        result_get_reason,
        result_get_offset,
        result_get_duration,
        result_get_reason_canceled,
        result_get_canceled_error_code,
        result_get_property_bag,
        result_handle_release: result_release,

        synthesizer_create_speech_synthesizer_from_config: synth_create,
        synthesizer_handle_release: synth_release,
        synthesizer_get_property_bag: synth_get_property_bag,
        synthesizer_speak_text: synth_speak_text,
        synthesizer_speak_ssml: synth_speak_ssml,
        synthesizer_started_set_callback: synth_set_started,
        synthesizer_completed_set_callback: synth_set_completed,
        synthesizer_canceled_set_callback: synth_set_canceled,
        synthesizer_word_boundary_set_callback: synth_set_word_boundary,
        synthesizer_event_handle_release: synth_event_release,
        synthesizer_synthesis_event_get_result: synth_event_get_result,
        synthesizer_word_boundary_event_get_values: synth_word_boundary_values,

        synth_result_get_result_id,
        synth_result_get_reason,
        synth_result_get_reason_canceled,
        synth_result_get_canceled_error_code,
        synth_result_get_audio_data,
        synth_result_get_property_bag,
        synth_result_handle_release: synth_result_release,

        connection_from_recognizer: conn_from_recognizer,
        connection_handle_release: conn_release,
        connection_open: conn_open,
        connection_close: conn_close,
        connection_connected_set_callback: conn_set_connected,
        connection_disconnected_set_callback: conn_set_disconnected,
        connection_event_get_session_id: conn_event_get_session_id,
        connection_event_handle_release: conn_event_release,
    }
}

/// Installs the fake engine as the process-wide API table. Safe to call
/// from every test; only the first call does anything.
pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        spx_lite::initialize(table()).expect("install the fake engine");
    });
}

/// A configuration whose objects are tagged for stats queries. Tags must
/// be unique per test; tests in one binary run concurrently against the
/// same engine.
pub fn scripted_config(tag: &str) -> SpeechConfig {
    init();
    let config = SpeechConfig::from_subscription("key", "westus").unwrap();
    config.properties().set("stub.tag", tag).unwrap();
    config
}

fn stats_of(tag: &str) -> TagStats {
    with_engine(|e| e.stats.get(tag).cloned().unwrap_or_default())
}

/// How many objects of `kind` were created under `tag`.
pub fn created(tag: &str, kind: &str) -> usize {
    stats_of(tag).created.get(kind).copied().unwrap_or(0)
}

/// How many objects of `kind` were released under `tag`.
pub fn released(tag: &str, kind: &str) -> usize {
    stats_of(tag).released.get(kind).copied().unwrap_or(0)
}

/// How many objects tagged `tag` are still live inside the engine.
pub fn live(tag: &str) -> usize {
    with_engine(|e| e.objects.values().filter(|entry| entry.tag == tag).count())
}

/// How many blocking recognitions have started under `tag`.
pub fn recognitions_started(tag: &str) -> usize {
    stats_of(tag).recognitions_started
}

/// How many blocking recognitions are running right now under `tag`.
pub fn active_recognitions(tag: &str) -> usize {
    stats_of(tag).active_recognitions
}

/// The callback and context currently registered for the named event of
/// the object tagged `tag`. Event names are the fire-list names plus
/// `started`, `completed`, `canceled-synth`, `word`, `connected` and
/// `disconnected`.
pub fn captured_callback(tag: &str, event: &str) -> Option<(PEVENT_CALLBACK_FUNC, usize)> {
    with_engine(|e| {
        for entry in e.objects.values() {
            if entry.tag != tag {
                continue;
            }
            let slot = match (&entry.obj, event) {
                (Obj::Reco { callbacks, .. }, "recognizing") => callbacks[0],
                (Obj::Reco { callbacks, .. }, "recognized") => callbacks[1],
                (Obj::Reco { callbacks, .. }, "canceled") => callbacks[2],
                (Obj::Reco { callbacks, .. }, "session-started") => callbacks[3],
                (Obj::Reco { callbacks, .. }, "session-stopped") => callbacks[4],
                (Obj::Synth { callbacks, .. }, "started") => callbacks[0],
                (Obj::Synth { callbacks, .. }, "completed") => callbacks[1],
                (Obj::Synth { callbacks, .. }, "canceled-synth") => callbacks[2],
                (Obj::Synth { callbacks, .. }, "word") => callbacks[3],
                (Obj::Conn { callbacks, .. }, "connected") => callbacks[0],
                (Obj::Conn { callbacks, .. }, "disconnected") => callbacks[1],
                _ => continue,
            };
            if let Some(cb) = slot {
                return Some((cb.f, cb.ctx));
            }
        }
        None
    })
}

/// Mints a recognizer-family session event, for driving a captured
/// callback by hand.
pub fn mint_session_event(session: &str) -> SPXEVENTHANDLE {
    with_engine(|e| {
        e.alloc(
            "event-reco",
            String::new(),
            Obj::Event {
                payload: EventPayload::Session { session: session.to_string() },
            },
        ) as SPXEVENTHANDLE
    })
}

/// Polls `f` until it returns true or the timeout elapses.
pub fn wait_until(timeout: Duration, f: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if f() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    f()
}
