//! The request dispatcher: owns every sink, input, the event catalog and
//! context, and drives the per-request state machine described in
//! `core-player.c` (`play_request` → `prepare` → `synchronize_sink` →
//! play edge → `play` → `complete_sink`/`fail_sink` → stop edge → `stop`).
//!
//! Every sink/input-initiated call back into the dispatcher — even one made
//! from a callback running on the core's own thread — goes through
//! [`CoreHandle`], which only ever posts a [`CoreSignal`] onto a channel.
//! The original allows a sink to call `n_core_synchronize_sink` and friends
//! directly, reentrantly, from within its own callback stack frame; that
//! isn't expressible in safe Rust once `Core` is reached through `&mut
//! self`, so this port marshals every such call through the channel and
//! drains it in [`Core::pump`]. The two deferred edges (play, stop) keep
//! their original "never within the triggering call" contract for free as
//! a consequence — see `deferred_pending` below.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::CoreError;
use crate::event::EventCatalog;
use crate::hook::{Hook, HookBus, HookPayload, SinkCandidate};
use crate::input::Input;
use crate::proplist::PropList;
use crate::request::{Request, RequestId};
use crate::sink::{Sink, SinkRegistration};

enum CoreSignal {
    NewRequest {
        id: RequestId,
        input_name: String,
        event_name: String,
        properties: PropList,
    },
    PauseRequest {
        id: RequestId,
    },
    StopRequest {
        id: RequestId,
    },
    SynchronizeSink {
        id: RequestId,
        sink_name: String,
    },
    CompleteSink {
        id: RequestId,
        sink_name: String,
    },
    FailSink {
        id: RequestId,
        sink_name: String,
    },
    SetResyncOnMaster {
        id: RequestId,
        sink_name: String,
    },
    ResynchronizeSinks {
        id: RequestId,
        sink_name: String,
    },
}

/// Cheaply cloned handle sinks and inputs use to post requests/state
/// transitions back onto the core's loop, from any thread.
#[derive(Clone)]
pub struct CoreHandle {
    tx: Sender<CoreSignal>,
    next_request_id: Arc<AtomicU64>,
}

impl CoreHandle {
    /// Mints a [`RequestId`] synchronously (so the caller can track it
    /// before the request is actually resolved) and posts a new request.
    pub fn play_request(
        &self,
        input_name: impl Into<String>,
        event_name: impl Into<String>,
        properties: PropList,
    ) -> RequestId {
        let id = RequestId(self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1);
        let _ = self.tx.send(CoreSignal::NewRequest {
            id,
            input_name: input_name.into(),
            event_name: event_name.into(),
            properties,
        });
        id
    }

    pub fn pause_request(&self, id: RequestId) {
        let _ = self.tx.send(CoreSignal::PauseRequest { id });
    }

    pub fn stop_request(&self, id: RequestId) {
        let _ = self.tx.send(CoreSignal::StopRequest { id });
    }

    pub fn synchronize_sink(&self, id: RequestId, sink_name: impl Into<String>) {
        let _ = self.tx.send(CoreSignal::SynchronizeSink {
            id,
            sink_name: sink_name.into(),
        });
    }

    pub fn complete_sink(&self, id: RequestId, sink_name: impl Into<String>) {
        let _ = self.tx.send(CoreSignal::CompleteSink {
            id,
            sink_name: sink_name.into(),
        });
    }

    pub fn fail_sink(&self, id: RequestId, sink_name: impl Into<String>) {
        let _ = self.tx.send(CoreSignal::FailSink {
            id,
            sink_name: sink_name.into(),
        });
    }

    pub fn set_resync_on_master(&self, id: RequestId, sink_name: impl Into<String>) {
        let _ = self.tx.send(CoreSignal::SetResyncOnMaster {
            id,
            sink_name: sink_name.into(),
        });
    }

    pub fn resynchronize_sinks(&self, id: RequestId, sink_name: impl Into<String>) {
        let _ = self.tx.send(CoreSignal::ResynchronizeSinks {
            id,
            sink_name: sink_name.into(),
        });
    }
}

struct PlayData {
    /// Sinks enrolled for this request, priority-descending, registration
    /// order on ties. Fixed once the request starts preparing.
    all_sinks: Vec<String>,
    sinks_preparing: HashSet<String>,
    sinks_playing: HashSet<String>,
    /// Sinks waiting for the master sink's next `resynchronize_sinks`.
    resync_on_master: HashSet<String>,
    play_edge: Option<u64>,
    stop_edge: Option<u64>,
    failed: bool,
}

impl PlayData {
    fn failed() -> Self {
        Self {
            all_sinks: Vec::new(),
            sinks_preparing: HashSet::new(),
            sinks_playing: HashSet::new(),
            resync_on_master: HashSet::new(),
            play_edge: None,
            stop_edge: None,
            failed: true,
        }
    }

    fn master(&self) -> Option<&str> {
        self.all_sinks.first().map(String::as_str)
    }
}

struct ActiveRequest {
    request: Request,
    play_data: PlayData,
}

enum DeferredTask {
    PlayEdge { id: RequestId, generation: u64 },
    StopEdge { id: RequestId, generation: u64 },
}

/// Owns the full set of sinks, inputs, hooks, the event catalog and
/// context, and the active request table. Single-threaded: every mutating
/// method takes `&mut self`; cross-thread callers go through
/// [`CoreHandle`] and [`Core::pump`].
pub struct Core {
    context: Context,
    catalog: EventCatalog,
    sinks: Vec<SinkRegistration>,
    inputs: Vec<Box<dyn Input>>,
    hooks: HookBus,
    requests: HashMap<RequestId, ActiveRequest>,
    /// Deferred tasks due to run on *this* `pump()` call.
    deferred_ready: VecDeque<DeferredTask>,
    /// Deferred tasks scheduled during the call in progress; promoted to
    /// `deferred_ready` only once that call returns, so anything scheduled
    /// now is guaranteed to run on a strictly later `pump()` call.
    deferred_pending: VecDeque<DeferredTask>,
    edge_generation: u64,
    signal_tx: Sender<CoreSignal>,
    signal_rx: Receiver<CoreSignal>,
    next_request_id: Arc<AtomicU64>,
}

impl Core {
    pub fn new(catalog: EventCatalog) -> Self {
        let (signal_tx, signal_rx) = crossbeam_channel::unbounded();
        Self {
            context: Context::new(),
            catalog,
            sinks: Vec::new(),
            inputs: Vec::new(),
            hooks: HookBus::new(),
            requests: HashMap::new(),
            deferred_ready: VecDeque::new(),
            deferred_pending: VecDeque::new(),
            edge_generation: 0,
            signal_tx,
            signal_rx,
            next_request_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn handle(&self) -> CoreHandle {
        CoreHandle {
            tx: self.signal_tx.clone(),
            next_request_id: self.next_request_id.clone(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn hooks_mut(&mut self) -> &mut HookBus {
        &mut self.hooks
    }

    /// Registers a sink at boot. Initialization is deferred to [`Core::start`]
    /// so every plugin finishes loading before any sink's `initialize` runs.
    pub fn register_sink(&mut self, sink: Box<dyn Sink>, priority: i32) -> Result<(), CoreError> {
        debug!(sink = sink.name(), priority, "sink registered");
        self.sinks.push(SinkRegistration::new(sink, priority));
        Ok(())
    }

    /// Registers an input at boot. Initialization is deferred to
    /// [`Core::start`] so every plugin finishes loading before any input's
    /// `initialize` runs.
    pub fn register_input(&mut self, input: Box<dyn Input>) -> Result<(), CoreError> {
        debug!(input = input.name(), "input registered");
        self.inputs.push(input);
        Ok(())
    }

    /// Validates the minimum viable plugin set, initializes every
    /// registered sink and then every registered input, and fires
    /// `INIT_DONE`. Called once, after every plugin has loaded.
    pub fn start(&mut self) -> Result<(), CoreError> {
        if self.sinks.is_empty() {
            return Err(CoreError::NoSinksRegistered);
        }
        if self.inputs.is_empty() {
            return Err(CoreError::NoInputsRegistered);
        }

        for registration in &self.sinks {
            if !registration.sink.initialize() {
                return Err(CoreError::SinkInitFailed(registration.sink.name().to_string()));
            }
        }

        let handle = self.handle();
        for input in &self.inputs {
            if !input.initialize(handle.clone()) {
                return Err(CoreError::InputInitFailed(input.name().to_string()));
            }
        }

        self.hooks.fire(Hook::InitDone, &mut HookPayload::InitDone);
        Ok(())
    }

    /// Shuts down every input, then every sink, in registration order
    /// (`n_core_shutdown`'s order; plugin `unload` runs after this, at the
    /// loader level — see `ngfd_core::plugin`).
    pub fn shutdown(&mut self) {
        for input in &self.inputs {
            input.shutdown();
        }
        for reg in &self.sinks {
            reg.sink.shutdown();
        }
    }

    fn sink_index(&self, name: &str) -> Option<usize> {
        self.sinks.iter().position(|reg| reg.sink.name() == name)
    }

    fn next_edge_generation(&mut self) -> u64 {
        self.edge_generation += 1;
        self.edge_generation
    }

    /// Drains every currently-queued signal, then runs exactly the
    /// deferred batch left ready by the *previous* `pump()` call. Returns
    /// the number of signals and deferred tasks processed; `0` means the
    /// loop is quiescent.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;

        while let Ok(signal) = self.signal_rx.try_recv() {
            self.apply_signal(signal);
            processed += 1;
        }

        let ready = std::mem::take(&mut self.deferred_ready);
        for task in ready {
            self.run_deferred(task);
            processed += 1;
        }

        self.deferred_ready = std::mem::take(&mut self.deferred_pending);
        processed
    }

    fn apply_signal(&mut self, signal: CoreSignal) {
        match signal {
            CoreSignal::NewRequest {
                id,
                input_name,
                event_name,
                properties,
            } => self.handle_new_request(id, &input_name, &event_name, properties),
            CoreSignal::PauseRequest { id } => self.handle_pause_request(id),
            CoreSignal::StopRequest { id } => self.handle_stop_request(id),
            CoreSignal::SynchronizeSink { id, sink_name } => {
                self.handle_synchronize_sink(id, &sink_name)
            }
            CoreSignal::CompleteSink { id, sink_name } => {
                self.handle_complete_sink(id, &sink_name)
            }
            CoreSignal::FailSink { id, sink_name } => self.handle_fail_sink(id, &sink_name),
            CoreSignal::SetResyncOnMaster { id, sink_name } => {
                self.handle_set_resync_on_master(id, &sink_name)
            }
            CoreSignal::ResynchronizeSinks { id, sink_name } => {
                self.handle_resynchronize_sinks(id, &sink_name)
            }
        }
    }

    fn handle_new_request(
        &mut self,
        id: RequestId,
        input_name: &str,
        event_name: &str,
        properties: PropList,
    ) {
        let mut request = Request::new(id, event_name, input_name, properties);

        {
            let mut payload = HookPayload::NewRequest {
                request: &mut request,
            };
            self.hooks.fire(Hook::NewRequest, &mut payload);
        }

        let event = self
            .catalog
            .evaluate(&request.name, &request.properties, &self.context)
            .cloned();

        let Some(event) = event else {
            warn!(request = %request.name, "no event definition resolves this request");
            self.requests.insert(
                id,
                ActiveRequest {
                    request,
                    play_data: PlayData::failed(),
                },
            );
            self.schedule_stop_edge(id);
            return;
        };

        debug!(request = %request.name, rules = event.rules.size(), "resolved event");

        let mut properties = event.properties.clone();
        properties.merge(&request.properties);
        request.properties = properties;
        request.event = Some(event);

        {
            let mut payload = HookPayload::TransformProperties {
                request: &mut request,
            };
            self.hooks.fire(Hook::TransformProperties, &mut payload);
        }

        let mut candidates: Vec<SinkCandidate> = self
            .sinks
            .iter()
            .enumerate()
            .filter(|(_, reg)| reg.sink.can_handle(&request))
            .map(|(index, reg)| SinkCandidate {
                index,
                name: reg.sink.name().to_string(),
                priority: reg.priority,
            })
            .collect();

        {
            let mut payload = HookPayload::FilterSinks {
                request: &request,
                sinks: &mut candidates,
            };
            self.hooks.fire(Hook::FilterSinks, &mut payload);
        }

        if candidates.is_empty() {
            warn!(request = %request.name, "no sink can handle this request");
            self.requests.insert(
                id,
                ActiveRequest {
                    request,
                    play_data: PlayData::failed(),
                },
            );
            self.schedule_stop_edge(id);
            return;
        }

        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        let all_sinks: Vec<String> = candidates.into_iter().map(|c| c.name).collect();

        let play_data = PlayData {
            sinks_preparing: all_sinks.iter().cloned().collect(),
            sinks_playing: all_sinks.iter().cloned().collect(),
            resync_on_master: HashSet::new(),
            all_sinks: all_sinks.clone(),
            play_edge: None,
            stop_edge: None,
            failed: false,
        };

        self.requests.insert(id, ActiveRequest { request, play_data });

        for name in &all_sinks {
            let Some(sink_index) = self.sink_index(name) else {
                continue;
            };
            let handle = self.handle();
            let outcome = {
                let active = self.requests.get_mut(&id).unwrap();
                self.sinks[sink_index]
                    .sink
                    .prepare(&mut active.request, &handle)
            };
            match outcome {
                None => self.handle_synchronize_sink(id, name),
                Some(true) => {}
                Some(false) => {
                    warn!(sink = %name, request = id.0, "sink failed to prepare");
                    self.handle_fail_sink(id, name);
                    break;
                }
            }
        }
    }

    fn handle_pause_request(&mut self, id: RequestId) {
        let Some(names) = self.requests.get(&id).map(|a| a.play_data.all_sinks.clone()) else {
            return;
        };
        for name in names {
            let Some(sink_index) = self.sink_index(&name) else {
                continue;
            };
            let outcome = {
                let active = self.requests.get_mut(&id).unwrap();
                self.sinks[sink_index].sink.pause(&mut active.request)
            };
            if let Some(false) = outcome {
                warn!(sink = %name, request = id.0, "sink failed to pause");
            }
        }
    }

    fn handle_stop_request(&mut self, id: RequestId) {
        let Some(active) = self.requests.get(&id) else {
            return;
        };
        if active.play_data.stop_edge.is_some() {
            return;
        }
        self.schedule_stop_edge(id);
    }

    fn handle_synchronize_sink(&mut self, id: RequestId, sink_name: &str) {
        let Some(active) = self.requests.get_mut(&id) else {
            return;
        };
        active.play_data.sinks_preparing.remove(sink_name);
        if active.play_data.sinks_preparing.is_empty() {
            self.schedule_play_edge(id);
        }
    }

    fn handle_complete_sink(&mut self, id: RequestId, sink_name: &str) {
        let Some(active) = self.requests.get_mut(&id) else {
            return;
        };
        if active.play_data.sinks_playing.is_empty() {
            return;
        }
        active.play_data.sinks_playing.remove(sink_name);
        if active.play_data.sinks_playing.is_empty() {
            self.schedule_stop_edge(id);
        }
    }

    fn handle_fail_sink(&mut self, id: RequestId, sink_name: &str) {
        let Some(active) = self.requests.get_mut(&id) else {
            return;
        };
        if active.play_data.stop_edge.is_some() {
            return;
        }
        warn!(sink = sink_name, request = id.0, "sink failed");
        active.play_data.failed = true;
        self.schedule_stop_edge(id);
    }

    fn handle_set_resync_on_master(&mut self, id: RequestId, sink_name: &str) {
        let Some(active) = self.requests.get_mut(&id) else {
            return;
        };
        active.play_data.resync_on_master.insert(sink_name.to_string());
    }

    fn handle_resynchronize_sinks(&mut self, id: RequestId, sink_name: &str) {
        let Some(active) = self.requests.get_mut(&id) else {
            return;
        };
        active.play_data.sinks_preparing.insert(sink_name.to_string());

        let is_master = active.play_data.master() == Some(sink_name);
        if is_master && !active.play_data.resync_on_master.is_empty() {
            let waiting: Vec<String> = active.play_data.resync_on_master.drain().collect();
            for name in waiting {
                active.play_data.sinks_preparing.insert(name);
            }
        }
    }

    fn schedule_play_edge(&mut self, id: RequestId) {
        let generation = self.next_edge_generation();
        if let Some(active) = self.requests.get_mut(&id) {
            active.play_data.play_edge = Some(generation);
        }
        self.deferred_pending
            .push_back(DeferredTask::PlayEdge { id, generation });
    }

    fn schedule_stop_edge(&mut self, id: RequestId) {
        let already_scheduled = self
            .requests
            .get(&id)
            .map(|a| a.play_data.stop_edge.is_some())
            .unwrap_or(true);
        if already_scheduled {
            return;
        }
        let generation = self.next_edge_generation();
        if let Some(active) = self.requests.get_mut(&id) {
            active.play_data.stop_edge = Some(generation);
            active.play_data.play_edge = None;
        }
        self.deferred_pending
            .push_back(DeferredTask::StopEdge { id, generation });
    }

    fn run_deferred(&mut self, task: DeferredTask) {
        match task {
            DeferredTask::PlayEdge { id, generation } => self.run_play_edge(id, generation),
            DeferredTask::StopEdge { id, generation } => self.run_stop_edge(id, generation),
        }
    }

    fn run_play_edge(&mut self, id: RequestId, generation: u64) {
        let Some(active) = self.requests.get_mut(&id) else {
            return;
        };
        if active.play_data.play_edge != Some(generation) {
            return;
        }
        active.play_data.play_edge = None;
        if active.play_data.failed {
            return;
        }

        let all_sinks = active.play_data.all_sinks.clone();
        for name in &all_sinks {
            let Some(sink_index) = self.sink_index(name) else {
                continue;
            };
            let handle = self.handle();
            let ok = {
                let active = self.requests.get_mut(&id).unwrap();
                self.sinks[sink_index].sink.play(&mut active.request, &handle)
            };
            if !ok {
                warn!(sink = %name, request = id.0, "sink failed to play");
                self.handle_fail_sink(id, name);
                break;
            }
        }
    }

    fn run_stop_edge(&mut self, id: RequestId, generation: u64) {
        let Some(active) = self.requests.get(&id) else {
            return;
        };
        if active.play_data.stop_edge != Some(generation) {
            return;
        }

        let all_sinks: HashSet<String> = active.play_data.all_sinks.iter().cloned().collect();
        let failed = active.play_data.failed;

        let stop_order: Vec<usize> = self
            .sinks
            .iter()
            .enumerate()
            .filter(|(_, reg)| all_sinks.contains(reg.sink.name()))
            .map(|(index, _)| index)
            .collect();

        for sink_index in stop_order {
            let active = self.requests.get_mut(&id).unwrap();
            self.sinks[sink_index].sink.stop(&mut active.request);
        }

        let Some(active) = self.requests.remove(&id) else {
            return;
        };
        let input = self
            .inputs
            .iter()
            .find(|input| input.name() == active.request.input_name);
        if let Some(input) = input {
            if failed {
                input.send_error(&active.request, "request failed");
            } else {
                input.send_reply(&active.request, 0);
            }
        }
    }

    #[cfg(test)]
    fn active_count(&self) -> usize {
        self.requests.len()
    }

    #[cfg(test)]
    fn run_until_quiescent(&mut self) {
        while self.pump() > 0 {}
    }
}
