use biometrics::{Collector, Counter, Moments};

pub(crate) static SESSION_STARTS: Counter = Counter::new("rkllm_chat.session.starts");
pub(crate) static SESSION_INIT_FAILURES: Counter =
    Counter::new("rkllm_chat.session.init_failures");
pub(crate) static SESSION_TURNS: Counter = Counter::new("rkllm_chat.session.turns");
pub(crate) static SESSION_GENERATION_ERRORS: Counter =
    Counter::new("rkllm_chat.session.generation_errors");
pub(crate) static SESSION_DESTROYS: Counter = Counter::new("rkllm_chat.session.destroys");
pub(crate) static SESSION_TURN_DURATION: Moments =
    Moments::new("rkllm_chat.session.turn_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("rkllm_chat.stream.chunks");
pub(crate) static STREAM_BYTES: Counter = Counter::new("rkllm_chat.stream.bytes");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("rkllm_chat.stream.errors");

pub(crate) static INTERRUPTS: Counter = Counter::new("rkllm_chat.interrupts");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&SESSION_STARTS);
    collector.register_counter(&SESSION_INIT_FAILURES);
    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_GENERATION_ERRORS);
    collector.register_counter(&SESSION_DESTROYS);
    collector.register_moments(&SESSION_TURN_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_ERRORS);

    collector.register_counter(&INTERRUPTS);
}
