//! Core chat session management.
//!
//! This module provides the [`SessionController`], which owns the single live engine instance of
//! the process.  The controller is shared between the read loop and the interrupt handler, so
//! every method takes `&self` and the engine handle lives in an atomic slot.  Whoever swaps the
//! handle out of the slot is the only party allowed to destroy it; a second `shutdown` finds the
//! slot empty and does nothing.

use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicU8, AtomicU64, Ordering};
use std::time::Instant;

use crate::engine::{Engine, EngineHandle, EngineParams, EventSink};
use crate::error::{Error, Result};
use crate::observability::{
    SESSION_DESTROYS, SESSION_GENERATION_ERRORS, SESSION_INIT_FAILURES, SESSION_STARTS,
    SESSION_TURN_DURATION, SESSION_TURNS,
};

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// No engine instance has been created yet.
    Uninitialized = 0,
    /// An engine instance is live and accepts turns.
    Ready = 1,
    /// The engine instance is being destroyed.
    ShuttingDown = 2,
    /// The engine instance is gone, or never came up.
    Terminated = 3,
}

impl SessionState {
    /// Returns a lowercase name for this state.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Ready => "ready",
            SessionState::ShuttingDown => "shutting down",
            SessionState::Terminated => "terminated",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Uninitialized,
            1 => SessionState::Ready,
            2 => SessionState::ShuttingDown,
            _ => SessionState::Terminated,
        }
    }
}

/// Counters for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The state the session is in.
    pub state: SessionState,
    /// Turns handed to the engine.
    pub turns: u64,
    /// Turns for which the engine reported a failure.
    pub generation_failures: u64,
    /// Times the engine's teardown was invoked.
    pub destroys: u64,
}

/// Owns the lifecycle of one engine instance.
pub struct SessionController<E: Engine> {
    engine: E,
    handle: AtomicPtr<c_void>,
    state: AtomicU8,
    started: AtomicBool,
    turns: AtomicU64,
    generation_failures: AtomicU64,
    destroys: AtomicU64,
}

impl<E: Engine> SessionController<E> {
    /// Creates an uninitialized controller around `engine`.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            handle: AtomicPtr::new(ptr::null_mut()),
            state: AtomicU8::new(SessionState::Uninitialized as u8),
            started: AtomicBool::new(false),
            turns: AtomicU64::new(0),
            generation_failures: AtomicU64::new(0),
            destroys: AtomicU64::new(0),
        }
    }

    /// Returns the engine this controller drives.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the current state.
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns true while an engine instance is live.
    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    /// Initializes the engine and moves to [`SessionState::Ready`].
    ///
    /// Only valid once, from [`SessionState::Uninitialized`].  If the engine refuses to start, the
    /// session moves straight to [`SessionState::Terminated`] and the engine's status is returned
    /// in [`Error::EngineInit`].
    pub fn start(&self, params: &EngineParams, sink: Arc<dyn EventSink>) -> Result<EngineHandle> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(Error::invalid_state("start", self.state().as_str()));
        }
        if self.state() != SessionState::Uninitialized {
            return Err(Error::invalid_state("start", self.state().as_str()));
        }
        SESSION_STARTS.click();

        let handle = match self.engine.init(params, sink) {
            Ok(handle) => handle,
            Err(status) => {
                SESSION_INIT_FAILURES.click();
                self.state
                    .store(SessionState::Terminated as u8, Ordering::Release);
                return Err(Error::engine_init(status));
            }
        };

        self.handle.store(handle.as_raw(), Ordering::Release);
        if let Err(actual) = self.state.compare_exchange(
            SessionState::Uninitialized as u8,
            SessionState::Ready as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            // A shutdown arrived while the engine was initializing.
            self.shutdown();
            return Err(Error::invalid_state(
                "start",
                SessionState::from_u8(actual).as_str(),
            ));
        }
        Ok(handle)
    }

    /// Runs one formatted turn through the engine.
    ///
    /// Blocks until the engine has delivered every event for the turn.  A failed run is returned
    /// as [`Error::Generation`] and leaves the session ready for the next turn.
    pub fn submit(&self, prompt: &str) -> Result<()> {
        let state = self.state();
        if state != SessionState::Ready {
            return Err(Error::invalid_state("submit", state.as_str()));
        }
        let Some(handle) = EngineHandle::from_raw(self.handle.load(Ordering::Acquire)) else {
            return Err(Error::invalid_state("submit", self.state().as_str()));
        };

        self.turns.fetch_add(1, Ordering::Relaxed);
        SESSION_TURNS.click();
        let started = Instant::now();
        let status = self.engine.generate(handle, prompt);
        SESSION_TURN_DURATION.add(started.elapsed().as_secs_f64());

        if status != 0 {
            self.generation_failures.fetch_add(1, Ordering::Relaxed);
            SESSION_GENERATION_ERRORS.click();
            return Err(Error::generation(status));
        }
        Ok(())
    }

    /// Destroys the engine instance, if there is one.
    ///
    /// Safe to call from any thread, any number of times: the handle is taken out of its slot
    /// with a single atomic swap, so exactly one caller ever reaches the engine's teardown.
    /// Returns true if this call performed the teardown.
    pub fn shutdown(&self) -> bool {
        let raw = self.handle.swap(ptr::null_mut(), Ordering::AcqRel);
        let Some(handle) = EngineHandle::from_raw(raw) else {
            // Nothing live; make sure a start still in flight cannot come up afterwards.
            let _ = self.state.compare_exchange(
                SessionState::Uninitialized as u8,
                SessionState::Terminated as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            return false;
        };

        self.state
            .store(SessionState::ShuttingDown as u8, Ordering::Release);
        self.destroys.fetch_add(1, Ordering::Relaxed);
        SESSION_DESTROYS.click();
        self.engine.destroy(handle);
        self.state
            .store(SessionState::Terminated as u8, Ordering::Release);
        true
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            state: self.state(),
            turns: self.turns.load(Ordering::Relaxed),
            generation_failures: self.generation_failures.load(Ordering::Relaxed),
            destroys: self.destroys.load(Ordering::Relaxed),
        }
    }
}

impl<E: Engine> Drop for SessionController<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
