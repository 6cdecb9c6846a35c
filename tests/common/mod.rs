//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::ffi::c_void;
use std::io::{self, Write};
use std::sync::{Arc, Barrier, Mutex};

use rkllm_chat::chat::{LineReader, PlainTextRenderer, ReadOutcome, Renderer};
use rkllm_chat::{Engine, EngineHandle, EngineParams, EventSink, GenerationEvent, Result};

/// An event the scripted engine replays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Emit {
    Chunk(String),
    /// A chunk that is not valid UTF-8 on its own.
    Bytes(Vec<u8>),
    Finished,
    Error,
}

/// One scripted turn: the events to emit and the status to return.
#[derive(Clone, Debug)]
pub struct Turn {
    pub events: Vec<Emit>,
    pub status: i32,
}

impl Turn {
    pub fn ok(chunks: &[&str]) -> Self {
        let mut events: Vec<Emit> = chunks.iter().map(|c| Emit::Chunk(c.to_string())).collect();
        events.push(Emit::Finished);
        Self { events, status: 0 }
    }

    pub fn failed(status: i32) -> Self {
        Self {
            events: vec![Emit::Chunk("half an ans".to_string()), Emit::Error],
            status,
        }
    }
}

/// A call the engine received.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Init(EngineParams),
    Generate(String),
    Destroy,
}

/// Blocks `generate` until the test lets it go.
pub struct Gate {
    pub entered: Barrier,
    pub release: Barrier,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Barrier::new(2),
            release: Barrier::new(2),
        })
    }
}

/// An in-process engine that replays scripted turns and records every call.
#[derive(Default)]
pub struct ScriptedEngine {
    init_failure: Option<i32>,
    turns: Mutex<VecDeque<Turn>>,
    calls: Mutex<Vec<Call>>,
    sink: Mutex<Option<Arc<dyn EventSink>>>,
    gate: Mutex<Option<Arc<Gate>>>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_init(status: i32) -> Arc<Self> {
        Arc::new(Self {
            init_failure: Some(status),
            ..Self::default()
        })
    }

    pub fn with_turns(turns: Vec<Turn>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            ..Self::default()
        })
    }

    pub fn set_gate(&self, gate: Arc<Gate>) {
        *self.gate.lock().unwrap() = Some(gate);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Generate(prompt) => Some(prompt),
                _ => None,
            })
            .collect()
    }

    pub fn destroy_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Destroy))
            .count()
    }

    pub fn generate_count(&self) -> usize {
        self.prompts().len()
    }
}

impl Engine for ScriptedEngine {
    fn init(
        &self,
        params: &EngineParams,
        sink: Arc<dyn EventSink>,
    ) -> std::result::Result<EngineHandle, i32> {
        self.calls.lock().unwrap().push(Call::Init(params.clone()));
        if let Some(status) = self.init_failure {
            return Err(status);
        }
        *self.sink.lock().unwrap() = Some(sink);
        let instance: &'static mut u64 = Box::leak(Box::new(0u64));
        EngineHandle::from_raw(instance as *mut u64 as *mut c_void).ok_or(-1)
    }

    fn generate(&self, _: EngineHandle, prompt: &str) -> i32 {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Generate(prompt.to_string()));
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = &gate {
            gate.entered.wait();
            gate.release.wait();
        }
        let turn = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Turn::ok(&["ok"]));
        let sink = self.sink.lock().unwrap().clone();
        if let Some(sink) = sink {
            for event in &turn.events {
                match event {
                    Emit::Chunk(text) => sink.on_event(GenerationEvent::Chunk(text.as_bytes())),
                    Emit::Bytes(bytes) => sink.on_event(GenerationEvent::Chunk(bytes)),
                    Emit::Finished => sink.on_event(GenerationEvent::Finished),
                    Emit::Error => sink.on_event(GenerationEvent::Error),
                }
            }
        }
        turn.status
    }

    fn destroy(&self, _: EngineHandle) -> i32 {
        self.calls.lock().unwrap().push(Call::Destroy);
        0
    }
}

/// An event sink that records what it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<Emit>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Emit> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn on_event(&self, event: GenerationEvent<'_>) {
        let event = match event {
            GenerationEvent::Chunk(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Emit::Chunk(text.to_string()),
                Err(_) => Emit::Bytes(bytes.to_vec()),
            },
            GenerationEvent::Finished => Emit::Finished,
            GenerationEvent::Error => Emit::Error,
        };
        self.events.lock().unwrap().push(event);
    }
}

/// A [`LineReader`] over a fixed script.  Once the script runs out it reports end of input.
pub struct ScriptedReader {
    script: VecDeque<ReadOutcome>,
    pub prompts_shown: usize,
    pub history: Vec<String>,
}

impl ScriptedReader {
    pub fn lines(lines: &[&str]) -> Self {
        Self::outcomes(
            lines
                .iter()
                .map(|line| ReadOutcome::Line(line.to_string()))
                .collect(),
        )
    }

    pub fn outcomes(script: Vec<ReadOutcome>) -> Self {
        Self {
            script: script.into(),
            prompts_shown: 0,
            history: Vec::new(),
        }
    }
}

impl LineReader for ScriptedReader {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadOutcome> {
        self.prompts_shown += 1;
        Ok(self.script.pop_front().unwrap_or(ReadOutcome::Eof))
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }
}

/// A writer whose contents can be read while the renderer still owns it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A plain-text renderer over a [`SharedBuffer`] that also records what it sends to stderr.
pub struct RecordingRenderer {
    inner: PlainTextRenderer<SharedBuffer>,
    output: SharedBuffer,
    errors: Mutex<Vec<String>>,
}

impl RecordingRenderer {
    pub fn new() -> Arc<Self> {
        let output = SharedBuffer::default();
        Arc::new(Self {
            inner: PlainTextRenderer::with_writer(output.clone(), false),
            output,
            errors: Mutex::new(Vec::new()),
        })
    }

    pub fn output(&self) -> String {
        self.output.contents()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl EventSink for RecordingRenderer {
    fn on_event(&self, event: GenerationEvent<'_>) {
        self.inner.on_event(event);
    }
}

impl Renderer for RecordingRenderer {
    fn print_text(&self, text: &[u8]) {
        self.inner.print_text(text);
    }

    fn finish_response(&self) {
        self.inner.finish_response();
    }

    fn print_generation_error(&self) {
        self.inner.print_generation_error();
    }

    fn print_error(&self, error: &str) {
        self.errors.lock().unwrap().push(error.to_string());
    }

    fn print_info(&self, info: &str) {
        self.inner.print_info(info);
    }
}
