//! Binding to the RKLLM runtime (`librkllmrt`).
//!
//! Only the four entry points the shell uses are declared.  The parameter struct mirrors the
//! runtime's `RKLLMParam` field for field; it is obtained from `rkllm_createDefaultParam` and
//! then overwritten with the session configuration, so fields the shell does not know about keep
//! the runtime's defaults.

use std::ffi::{CStr, CString, c_void};
use std::os::raw::{c_char, c_float, c_int};
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Engine, EngineHandle, EngineParams, EventSink, GenerationEvent};

type LLMHandle = *mut c_void;
type LLMCallState = c_int;

const LLM_RUN_NORMAL: LLMCallState = 0;
const LLM_RUN_FINISH: LLMCallState = 1;
const LLM_RUN_ERROR: LLMCallState = 2;

/// Status reported when a string cannot cross the C boundary or no handle comes back.
const STATUS_INVALID: c_int = -1;

type LLMResultCallback =
    Option<extern "C" fn(text: *const c_char, userdata: *mut c_void, state: LLMCallState)>;

#[repr(C)]
#[derive(Clone, Copy)]
struct RKLLMParam {
    model_path: *const c_char,
    target_platform: *const c_char,
    num_npu_core: i32,
    max_context_len: i32,
    max_new_tokens: i32,
    top_k: i32,
    top_p: c_float,
    temperature: c_float,
    repeat_penalty: c_float,
    frequency_penalty: c_float,
    presence_penalty: c_float,
    mirostat: i32,
    mirostat_tau: c_float,
    mirostat_eta: c_float,
    logprobs: bool,
    top_logprobs: i32,
    use_gpu: bool,
}

#[link(name = "rkllmrt")]
unsafe extern "C" {
    fn rkllm_createDefaultParam() -> RKLLMParam;
    fn rkllm_init(handle: *mut LLMHandle, param: RKLLMParam, callback: LLMResultCallback)
    -> c_int;
    fn rkllm_run(handle: LLMHandle, prompt: *const c_char, userdata: *mut c_void) -> c_int;
    fn rkllm_destroy(handle: LLMHandle) -> c_int;
}

extern "C" fn result_callback(text: *const c_char, userdata: *mut c_void, state: LLMCallState) {
    if userdata.is_null() {
        return;
    }
    // SAFETY: `userdata` is the address of the `Arc<dyn EventSink>` that `generate` holds on its
    // stack for the whole duration of `rkllm_run`; callbacks only fire inside that call.
    let sink = unsafe { &*(userdata as *const Arc<dyn EventSink>) };
    match state {
        LLM_RUN_NORMAL => {
            if text.is_null() {
                return;
            }
            // SAFETY: the runtime hands us a NUL-terminated string valid for this callback.
            let bytes = unsafe { CStr::from_ptr(text) }.to_bytes();
            sink.on_event(GenerationEvent::Chunk(bytes));
        }
        LLM_RUN_FINISH => sink.on_event(GenerationEvent::Finished),
        LLM_RUN_ERROR => sink.on_event(GenerationEvent::Error),
        _ => {}
    }
}

/// The RKLLM runtime as an [`Engine`].
#[derive(Default)]
pub struct RkllmEngine {
    sink: Mutex<Option<Arc<dyn EventSink>>>,
    // The runtime keeps the model path and platform pointers; they live as long as the engine.
    strings: Mutex<Vec<CString>>,
}

impl RkllmEngine {
    /// Creates an engine that has not been initialized yet.
    pub fn new() -> Self {
        Self::default()
    }

    fn sink(&self) -> MutexGuard<'_, Option<Arc<dyn EventSink>>> {
        self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Engine for RkllmEngine {
    fn init(&self, params: &EngineParams, sink: Arc<dyn EventSink>) -> Result<EngineHandle, i32> {
        let model_path =
            CString::new(params.model_path.as_str()).map_err(|_| STATUS_INVALID)?;
        let target_platform =
            CString::new(params.target_platform.as_str()).map_err(|_| STATUS_INVALID)?;

        // SAFETY: plain constructor returning a struct by value.
        let mut param = unsafe { rkllm_createDefaultParam() };
        param.model_path = model_path.as_ptr();
        param.target_platform = target_platform.as_ptr();
        param.num_npu_core = params.num_npu_core;
        param.max_context_len = params.max_context_len;
        param.max_new_tokens = params.max_new_tokens;
        param.top_k = params.top_k;
        param.top_p = params.top_p;
        param.temperature = params.temperature;
        param.repeat_penalty = params.repeat_penalty;
        param.frequency_penalty = params.frequency_penalty;
        param.presence_penalty = params.presence_penalty;
        param.mirostat = params.mirostat;
        param.mirostat_tau = params.mirostat_tau;
        param.mirostat_eta = params.mirostat_eta;

        let mut handle: LLMHandle = ptr::null_mut();
        // SAFETY: `handle` is a valid out-pointer and the strings referenced by `param` are kept
        // alive in `self.strings` below.
        let status = unsafe { rkllm_init(&mut handle, param, Some(result_callback)) };
        if status != 0 {
            return Err(status);
        }
        let handle = EngineHandle::from_raw(handle).ok_or(STATUS_INVALID)?;

        *self.sink() = Some(sink);
        self.strings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend([model_path, target_platform]);
        Ok(handle)
    }

    fn generate(&self, handle: EngineHandle, prompt: &str) -> i32 {
        let Ok(prompt) = CString::new(prompt.replace('\0', "")) else {
            return STATUS_INVALID;
        };
        let Some(sink) = self.sink().clone() else {
            return STATUS_INVALID;
        };
        let userdata = &sink as *const Arc<dyn EventSink> as *mut c_void;
        // SAFETY: `handle` came from `rkllm_init`; `prompt` and `sink` outlive the call.
        unsafe { rkllm_run(handle.as_raw(), prompt.as_ptr(), userdata) }
    }

    fn destroy(&self, handle: EngineHandle) -> i32 {
        // SAFETY: the session hands each handle to `destroy` at most once.
        unsafe { rkllm_destroy(handle.as_raw()) }
    }
}
