//! The seam between the chat shell and the inference runtime.
//!
//! The runtime itself is an opaque native library: it loads the model, tokenizes, schedules work
//! on the NPU and samples.  The shell only ever initializes it, hands it prompts, receives
//! streamed events through an [`EventSink`], and tears it down.  Everything the shell needs from
//! the runtime is captured by the [`Engine`] trait so that the session logic can be exercised
//! without the vendor library present.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Arc;

#[cfg(feature = "rkllm")]
mod rkllm;

#[cfg(feature = "rkllm")]
pub use rkllm::RkllmEngine;

///////////////////////////////////////////// Events ////////////////////////////////////////////

/// An event emitted by the engine while it runs a single prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationEvent<'a> {
    /// The bytes of a chunk of generated text.
    ///
    /// Tokens are byte-level, so a multi-byte UTF-8 character may be split across consecutive
    /// chunks.  Consumers pass the bytes through rather than decoding each chunk on its own.
    Chunk(&'a [u8]),
    /// The turn is complete.
    Finished,
    /// The engine hit an error while generating.
    Error,
}

/// Receives generation events.
///
/// The engine may call `on_event` from any thread, including one it owns internally, so
/// implementations take `&self` and keep whatever state they have behind synchronization.
pub trait EventSink: Send + Sync {
    /// Handle one event, in emission order.
    fn on_event(&self, event: GenerationEvent<'_>);
}

///////////////////////////////////////////// Handles ///////////////////////////////////////////

/// An opaque reference to one live engine instance.
///
/// The handle is a plain pointer-sized token so that the session can keep it in an atomic slot.
/// Copying the token does not copy the instance; whoever clears the slot owns the right to
/// destroy it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EngineHandle(NonNull<c_void>);

// SAFETY: the handle is an opaque token.  The engine is responsible for the thread-safety of the
// instance it names; the session never dereferences it.
unsafe impl Send for EngineHandle {}
unsafe impl Sync for EngineHandle {}

impl EngineHandle {
    /// Wraps a raw pointer, returning `None` if it is null.
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Returns the raw pointer behind this handle.
    pub fn as_raw(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

//////////////////////////////////////////// Parameters /////////////////////////////////////////

/// Everything the engine needs to initialize.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineParams {
    /// Path to the model file.
    pub model_path: String,
    /// Target platform identifier, e.g. `rk3588`.
    pub target_platform: String,
    /// Number of NPU cores to use.
    pub num_npu_core: i32,
    /// Context window length.
    pub max_context_len: i32,
    /// Maximum new tokens per turn; `-1` is unbounded.
    pub max_new_tokens: i32,
    /// Top-k sampling width.
    pub top_k: i32,
    /// Nucleus sampling threshold.
    pub top_p: f32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Repetition penalty.
    pub repeat_penalty: f32,
    /// Frequency penalty.
    pub frequency_penalty: f32,
    /// Presence penalty.
    pub presence_penalty: f32,
    /// Mirostat mode (0, 1 or 2).
    pub mirostat: i32,
    /// Mirostat target entropy.
    pub mirostat_tau: f32,
    /// Mirostat learning rate.
    pub mirostat_eta: f32,
}

////////////////////////////////////////////// Engine ///////////////////////////////////////////

/// An external streaming text-generation engine.
///
/// Status codes follow the native convention: zero is success, anything else is a failure that
/// the engine defines.
pub trait Engine: Send + Sync {
    /// Create an engine instance that delivers its events to `sink`.
    fn init(&self, params: &EngineParams, sink: Arc<dyn EventSink>) -> Result<EngineHandle, i32>;

    /// Run one prompt to completion.
    ///
    /// Blocks until the engine has finished emitting events for the prompt.
    fn generate(&self, handle: EngineHandle, prompt: &str) -> i32;

    /// Release the instance named by `handle`.
    fn destroy(&self, handle: EngineHandle) -> i32;
}

impl<E: Engine + ?Sized> Engine for Arc<E> {
    fn init(&self, params: &EngineParams, sink: Arc<dyn EventSink>) -> Result<EngineHandle, i32> {
        (**self).init(params, sink)
    }

    fn generate(&self, handle: EngineHandle, prompt: &str) -> i32 {
        (**self).generate(handle, prompt)
    }

    fn destroy(&self, handle: EngineHandle) -> i32 {
        (**self).destroy(handle)
    }
}
