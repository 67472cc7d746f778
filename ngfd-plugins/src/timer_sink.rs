//! A sink that plays for a fixed duration before completing — the shape a
//! haptic output with no natural "done" signal of its own takes (a looping
//! audio sink would instead call `complete_sink` from its own
//! playback-finished callback).
//!
//! `play` spawns a worker thread that sleeps for the configured duration
//! and then posts `complete_sink` back through a cloned [`CoreHandle`];
//! this is how a sink whose work outlives the dispatcher's own call stack
//! does blocking work on its own thread while communicating results back
//! through a handle.

use std::thread;
use std::time::Duration;

use tracing::info;

use ngfd_core::{CoreHandle, Request, Sink};

const DEFAULT_DURATION_MS: u64 = 200;
const DURATION_KEY: &str = "vibrator.duration_ms";

pub struct TimerSink {
    name: String,
}

impl TimerSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Sink for TimerSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn play(&self, request: &mut Request, handle: &CoreHandle) -> bool {
        let duration_ms = request
            .properties
            .get_uint(DURATION_KEY)
            .map(u64::from)
            .unwrap_or(DEFAULT_DURATION_MS);

        let sink_name = self.name.clone();
        let id = request.id();
        let handle = handle.clone();

        info!(sink = %sink_name, duration_ms, "starting timed playback");
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(duration_ms));
            handle.complete_sink(id, sink_name);
        });

        true
    }

    fn stop(&self, request: &mut Request) {
        info!(sink = %self.name, request = %request.name, "stopping");
    }
}
