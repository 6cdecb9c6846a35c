//! Lifecycle tests for the session controller against a scripted engine.

mod common;

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use rkllm_chat::chat::{SessionConfig, SessionController, SessionState};
    use rkllm_chat::interrupt::handle_interrupt;
    use rkllm_chat::{EngineParams, Error, EventSink};

    use crate::common::{Call, Emit, Gate, RecordingSink, ScriptedEngine, Turn};

    fn params() -> EngineParams {
        SessionConfig::new("qwen.rkllm").engine_params()
    }

    fn started(engine: &Arc<ScriptedEngine>) -> SessionController<Arc<ScriptedEngine>> {
        let controller = SessionController::new(Arc::clone(engine));
        controller
            .start(&params(), Arc::new(RecordingSink::default()))
            .unwrap();
        controller
    }

    #[test]
    fn start_hands_params_to_engine() {
        let engine = ScriptedEngine::new();
        let controller = started(&engine);
        assert_eq!(controller.state(), SessionState::Ready);
        assert_eq!(engine.calls(), vec![Call::Init(params())]);
    }

    #[test]
    fn init_failure_terminates_with_engine_status() {
        let engine = ScriptedEngine::failing_init(-7);
        let controller = SessionController::new(Arc::clone(&engine));
        let err = controller
            .start(&params(), Arc::new(RecordingSink::default()))
            .unwrap_err();
        assert!(matches!(err, Error::EngineInit { status: -7 }));
        assert_eq!(err.exit_code(), -7);
        assert_eq!(controller.state(), SessionState::Terminated);

        assert!(controller.submit("hello").unwrap_err().is_invalid_state());
        assert!(!controller.shutdown());
        assert_eq!(engine.destroy_count(), 0);
        assert_eq!(engine.generate_count(), 0);
    }

    #[test]
    fn submit_before_start_is_rejected() {
        let engine = ScriptedEngine::new();
        let controller = SessionController::new(Arc::clone(&engine));
        let err = controller.submit("hello").unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(err.to_string(), "Cannot submit while session is uninitialized");
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn submit_after_shutdown_is_rejected() {
        let engine = ScriptedEngine::new();
        let controller = started(&engine);
        assert!(controller.shutdown());
        let err = controller.submit("hello").unwrap_err();
        assert_eq!(err.to_string(), "Cannot submit while session is terminated");
        assert_eq!(engine.generate_count(), 0);
    }

    #[test]
    fn events_reach_sink_before_submit_returns() {
        let engine = ScriptedEngine::with_turns(vec![Turn::ok(&["Hel", "lo"])]);
        let sink = Arc::new(RecordingSink::default());
        let controller = SessionController::new(Arc::clone(&engine));
        let dyn_sink: Arc<dyn EventSink> = sink.clone();
        controller.start(&params(), dyn_sink).unwrap();

        controller.submit("prompt").unwrap();
        assert_eq!(
            sink.events(),
            vec![
                Emit::Chunk("Hel".to_string()),
                Emit::Chunk("lo".to_string()),
                Emit::Finished,
            ]
        );
        assert_eq!(engine.prompts(), vec!["prompt".to_string()]);
    }

    #[test]
    fn generation_error_keeps_session_ready() {
        let engine = ScriptedEngine::with_turns(vec![Turn::failed(4), Turn::ok(&["fine"])]);
        let controller = started(&engine);

        let err = controller.submit("first").unwrap_err();
        assert!(matches!(err, Error::Generation { status: 4 }));
        assert!(controller.is_ready());

        controller.submit("second").unwrap();
        let stats = controller.stats();
        assert_eq!(stats.turns, 2);
        assert_eq!(stats.generation_failures, 1);
        assert_eq!(stats.state, SessionState::Ready);
    }

    #[test]
    fn double_shutdown_destroys_once() {
        let engine = ScriptedEngine::new();
        let controller = started(&engine);
        assert!(controller.shutdown());
        assert!(!controller.shutdown());
        assert_eq!(engine.destroy_count(), 1);
        assert_eq!(controller.stats().destroys, 1);
        assert_eq!(controller.state(), SessionState::Terminated);
    }

    #[test]
    fn racing_shutdowns_destroy_once() {
        const RACERS: usize = 8;
        let engine = ScriptedEngine::new();
        let controller = Arc::new(started(&engine));
        let barrier = Arc::new(Barrier::new(RACERS));

        let winners: usize = (0..RACERS)
            .map(|_| {
                let controller = Arc::clone(&controller);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    controller.shutdown()
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|racer| racer.join().unwrap() as usize)
            .sum();

        assert_eq!(winners, 1);
        assert_eq!(engine.destroy_count(), 1);
    }

    #[test]
    fn drop_destroys_live_instance() {
        let engine = ScriptedEngine::new();
        {
            let _controller = started(&engine);
        }
        assert_eq!(engine.destroy_count(), 1);
    }

    #[test]
    fn drop_after_shutdown_does_not_destroy_again() {
        let engine = ScriptedEngine::new();
        {
            let controller = started(&engine);
            controller.shutdown();
        }
        assert_eq!(engine.destroy_count(), 1);
    }

    #[test]
    fn interrupt_during_generation_destroys_once() {
        let engine = ScriptedEngine::new();
        let gate = Gate::new();
        engine.set_gate(Arc::clone(&gate));
        let controller = Arc::new(started(&engine));

        let turn = {
            let controller = Arc::clone(&controller);
            thread::spawn(move || controller.submit("long answer"))
        };
        gate.entered.wait();

        assert_eq!(handle_interrupt(&*controller), 2);
        assert_eq!(controller.state(), SessionState::Terminated);
        assert_eq!(engine.destroy_count(), 1);

        gate.release.wait();
        turn.join().unwrap().unwrap();

        // The read loop's own teardown after the interrupt is a no-op.
        assert!(!controller.shutdown());
        assert_eq!(engine.destroy_count(), 1);
        assert!(controller.submit("again").unwrap_err().is_invalid_state());
    }

    #[test]
    fn interrupt_before_start_still_exits_with_sigint() {
        let engine = ScriptedEngine::new();
        let controller = SessionController::new(Arc::clone(&engine));
        assert_eq!(handle_interrupt(&controller), 2);
        assert_eq!(controller.state(), SessionState::Terminated);
        assert!(controller
            .start(&params(), Arc::new(RecordingSink::default()))
            .is_err());
        assert_eq!(engine.destroy_count(), 0);
    }
}
