//! A sink that logs every lifecycle call instead of driving real hardware.
//! Useful standalone and as the reference implementation a concrete sink
//! (GStreamer, Immersion, MCE-over-D-Bus) would follow.

use tracing::info;

use ngfd_core::{CoreHandle, Request, Sink};

pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Sink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn play(&self, request: &mut Request, handle: &CoreHandle) -> bool {
        info!(sink = %self.name, request = %request.name, "playing");
        handle.complete_sink(request.id(), self.name.clone());
        true
    }

    fn stop(&self, request: &mut Request) {
        info!(sink = %self.name, request = %request.name, "stopping");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use ngfd_core::{Core, Event, EventCatalog, Input, PropList, Request};

    use super::LogSink;

    #[derive(Default, Clone)]
    struct RecordingInput {
        replies: Arc<Mutex<Vec<i32>>>,
    }

    impl Input for RecordingInput {
        fn name(&self) -> &str {
            "recording"
        }

        fn send_reply(&self, _request: &Request, status: i32) {
            self.replies.lock().unwrap().push(status);
        }
    }

    fn catalog_with(name: &str) -> EventCatalog {
        let mut catalog = EventCatalog::new();
        catalog.add_event(Event::new(name, PropList::new(), PropList::new()));
        catalog
    }

    #[test]
    fn play_reports_success_and_completes_itself_without_stalling_the_request() {
        let mut core = Core::new(catalog_with("tone"));
        core.register_sink(Box::new(LogSink::new("log")), 0).unwrap();

        let input = RecordingInput::default();
        let replies = input.replies.clone();
        core.register_input(Box::new(input)).unwrap();
        core.start().unwrap();

        let handle = core.handle();
        handle.play_request("recording", "tone", PropList::new());

        let mut turns = 0;
        while core.pump() > 0 && turns < 10 {
            turns += 1;
        }

        assert_eq!(*replies.lock().unwrap(), vec![0]);
    }
}
