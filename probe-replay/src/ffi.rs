//! C ABI shared with native analysis libraries
//!
//! Every analysis hook exported by a library has the [`CallbackFn`] signature and
//! receives its arguments as a borrowed array of [`ProbeValue`]s. All pointers are
//! valid only for the duration of the call; an empty argument list arrives as a
//! null pointer with length zero.
//!
//! Hooks are called from the replay worker threads. With more than one job, the
//! same state pointer may be passed to several hooks at once, so a library must
//! either be thread-safe or be run with `--jobs 1`.

use probe_dispatch::{AnalysisValue, CallbackError, ValueKind};
use std::ffi::CStr;
use std::marker::PhantomData;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

/// Analysis hook: `0` on success, anything else raises
pub type CallbackFn =
    unsafe extern "C" fn(state: *mut c_void, args: *const ProbeValue, len: usize) -> c_int;
/// Optional `probe_analysis_create`
pub type CreateFn = unsafe extern "C" fn() -> *mut c_void;
/// Optional `probe_analysis_destroy`
pub type DestroyFn = unsafe extern "C" fn(state: *mut c_void);
/// Optional `probe_last_error`
pub type LastErrorFn = unsafe extern "C" fn() -> *const c_char;

pub const CREATE_SYMBOL: &str = "probe_analysis_create";
pub const DESTROY_SYMBOL: &str = "probe_analysis_destroy";
pub const LAST_ERROR_SYMBOL: &str = "probe_last_error";

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTag {
    Undefined = 0,
    Null = 1,
    Boolean = 2,
    Number = 3,
    String = 4,
    List = 5,
    Object = 6,
    Function = 7,
    Array = 8,
    Symbol = 9,
}

/// One argument as seen from C
///
/// `text` holds the string payload or a handle's label (UTF-8, not NUL-terminated).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ProbeValue {
    pub tag: ProbeTag,
    pub boolean: u8,
    pub number: f64,
    pub text: *const u8,
    pub text_len: usize,
    pub handle_id: u64,
    pub items: *const ProbeValue,
    pub items_len: usize,
}

impl ProbeValue {
    fn with_tag(tag: ProbeTag) -> Self {
        Self {
            tag,
            boolean: 0,
            number: 0.0,
            text: ptr::null(),
            text_len: 0,
            handle_id: 0,
            items: ptr::null(),
            items_len: 0,
        }
    }

    fn with_text(mut self, text: &str) -> Self {
        self.text = text.as_ptr();
        self.text_len = text.len();
        self
    }
}

/// Encoded argument vector borrowing from the analysis values it was built from
pub struct ArgBuffer<'a> {
    values: Vec<ProbeValue>,
    // Heap storage of list items; inner buffers never move once pushed
    _nested: Vec<Vec<ProbeValue>>,
    _args: PhantomData<&'a [AnalysisValue]>,
}

impl<'a> ArgBuffer<'a> {
    pub fn new(args: &'a [AnalysisValue]) -> Self {
        let mut nested = Vec::new();
        let values = args.iter().map(|arg| encode(arg, &mut nested)).collect();
        Self {
            values,
            _nested: nested,
            _args: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *const ProbeValue {
        self.values.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn encode(value: &AnalysisValue, nested: &mut Vec<Vec<ProbeValue>>) -> ProbeValue {
    match value {
        AnalysisValue::Undefined => ProbeValue::with_tag(ProbeTag::Undefined),
        AnalysisValue::Null => ProbeValue::with_tag(ProbeTag::Null),
        AnalysisValue::Boolean(v) => {
            let mut out = ProbeValue::with_tag(ProbeTag::Boolean);
            out.boolean = u8::from(*v);
            out
        }
        AnalysisValue::Number(v) => {
            let mut out = ProbeValue::with_tag(ProbeTag::Number);
            out.number = *v;
            out
        }
        AnalysisValue::String(v) => ProbeValue::with_tag(ProbeTag::String).with_text(v),
        AnalysisValue::List(items) => {
            let encoded: Vec<ProbeValue> = items.iter().map(|item| encode(item, nested)).collect();
            let mut out = ProbeValue::with_tag(ProbeTag::List);
            out.items = encoded.as_ptr();
            out.items_len = encoded.len();
            nested.push(encoded);
            out
        }
        AnalysisValue::Handle(handle) => {
            let tag = match handle.kind {
                ValueKind::Object => ProbeTag::Object,
                ValueKind::Function => ProbeTag::Function,
                ValueKind::Array => ProbeTag::Array,
                ValueKind::Symbol => ProbeTag::Symbol,
            };
            let mut out = ProbeValue::with_tag(tag);
            out.handle_id = handle.id;
            match &handle.label {
                Some(label) => out.with_text(label),
                None => out,
            }
        }
    }
}

/// Call a native hook and translate its status code
///
/// # Safety
/// `hook` must follow the [`CallbackFn`] contract and `state` must be the pointer
/// the library expects as its receiver.
pub unsafe fn call_hook(
    hook: CallbackFn,
    state: *mut c_void,
    args: &[AnalysisValue],
    last_error: Option<LastErrorFn>,
) -> Result<(), CallbackError> {
    let buffer = ArgBuffer::new(args);
    let argv = if buffer.is_empty() {
        ptr::null()
    } else {
        buffer.as_ptr()
    };
    let status = hook(state, argv, buffer.len());
    if status == 0 {
        return Ok(());
    }
    let message = last_error
        .map(|f| error_message(f()))
        .unwrap_or_else(|| format!("status {}", status));
    Err(CallbackError::Raised(message))
}

unsafe fn error_message(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::from("Unknown error");
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}
