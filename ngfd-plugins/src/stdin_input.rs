//! Reads whitespace-separated `event key=value...` lines from stdin and
//! turns each into a `play_request`. A stand-in for a real transport
//! (D-Bus, a Unix socket) good enough to drive the daemon interactively.

use std::io::{self, BufRead};
use std::thread;

use tracing::{info, warn};

use ngfd_core::{CoreHandle, Input, PropList, Request};

pub struct StdinInput;

impl Input for StdinInput {
    fn name(&self) -> &str {
        "stdin"
    }

    fn initialize(&self, handle: CoreHandle) -> bool {
        thread::spawn(move || run(handle));
        true
    }

    fn send_reply(&self, request: &Request, status: i32) {
        info!(request = %request.name, status, "request finished");
    }

    fn send_error(&self, request: &Request, message: &str) {
        warn!(request = %request.name, message, "request failed");
    }
}

fn run(handle: CoreHandle) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(event_name) = parts.next() else {
            continue;
        };

        let mut properties = PropList::new();
        for pair in parts {
            if let Some((key, value)) = pair.split_once('=') {
                properties.set(key.to_string(), value.to_string());
            } else {
                warn!(pair, "ignoring malformed key=value pair");
            }
        }

        handle.play_request("stdin", event_name, properties);
    }
}
