//! Async driver for node watchers
//!
//! Everything runs on the host's single UI thread: watcher loops and probes
//! are `spawn_local` tasks on a [`tokio::task::LocalSet`], and only the
//! image decoding inside a probe leaves the thread. Tasks hold weak
//! references, so a node dropped from the graph is never kept alive by a
//! pending probe.

use crate::host::{OverlayController, RedrawSink};
use crate::nodes::{HostContext, Observation, PropertiesNode, ProbeTicket, SharedNode};
use crate::probe::ImageProbe;
use log::{debug, trace};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Host capabilities shared by every watcher task
pub struct HostServices {
    pub redraw: Rc<dyn RedrawSink>,
    pub overlay: Rc<dyn OverlayController>,
    pub overlay_selector: String,
}

impl HostServices {
    pub fn new(
        redraw: Rc<dyn RedrawSink>,
        overlay: Rc<dyn OverlayController>,
        overlay_selector: impl Into<String>,
    ) -> Self {
        Self {
            redraw,
            overlay,
            overlay_selector: overlay_selector.into(),
        }
    }

    pub fn context(&self) -> HostContext<'_> {
        HostContext {
            redraw: self.redraw.as_ref(),
            overlay: self.overlay.as_ref(),
            overlay_selector: &self.overlay_selector,
        }
    }
}

/// How a watcher learns that its slot may have changed
pub enum WatchTrigger {
    /// Re-read the widget on a fixed cadence
    Poll(Duration),
    /// Wait for the host to publish the slot's new value
    Notify(watch::Receiver<Option<String>>),
}

/// Running watcher task for one node.
///
/// Stopping (or dropping) the handle cancels the loop and moves the node's
/// watcher to `Stopped`; probes still in flight complete into nothing.
#[derive(Debug)]
pub struct WatcherHandle {
    task: JoinHandle<()>,
    node: Weak<RefCell<PropertiesNode>>,
}

impl WatcherHandle {
    pub fn stop(&self) {
        self.task.abort();
        if let Some(node) = self.node.upgrade() {
            match node.try_borrow_mut() {
                Ok(mut node) => {
                    node.stop_watching();
                }
                Err(_) => trace!("Node busy while stopping its watcher"),
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawns watcher loops and the probes they request
#[derive(Clone)]
pub struct WatchRuntime {
    probe: Rc<dyn ImageProbe>,
    services: Rc<HostServices>,
}

impl WatchRuntime {
    pub fn new(probe: Rc<dyn ImageProbe>, services: Rc<HostServices>) -> Self {
        Self { probe, services }
    }

    pub fn services(&self) -> &HostServices {
        &self.services
    }

    /// Start watching `node`. Must be called from inside a `LocalSet`.
    ///
    /// Returns `None` for nodes whose variant has no watched slot.
    pub fn spawn(&self, node: &SharedNode, trigger: WatchTrigger) -> Option<WatcherHandle> {
        if node.borrow().watcher().is_none() {
            return None;
        }
        let weak = Rc::downgrade(node);
        let runtime = self.clone();

        let task = match trigger {
            WatchTrigger::Poll(period) => {
                tokio::task::spawn_local(runtime.poll_loop(weak.clone(), period))
            }
            WatchTrigger::Notify(receiver) => {
                tokio::task::spawn_local(runtime.notify_loop(weak.clone(), receiver))
            }
        };
        Some(WatcherHandle { task, node: weak })
    }

    async fn poll_loop(self, node: Weak<RefCell<PropertiesNode>>, period: Duration) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(shared) = node.upgrade() else {
                break;
            };
            let observation = shared.borrow_mut().poll_watched_slot();
            if !self.dispatch(&node, observation) {
                break;
            }
        }
    }

    async fn notify_loop(
        self,
        node: Weak<RefCell<PropertiesNode>>,
        mut receiver: watch::Receiver<Option<String>>,
    ) {
        while receiver.changed().await.is_ok() {
            let value = receiver.borrow_and_update().clone();
            let Some(shared) = node.upgrade() else {
                break;
            };
            let observation = shared.borrow_mut().observe_reference(value.as_deref());
            if !self.dispatch(&node, observation) {
                break;
            }
        }
    }

    /// Returns false once the watcher has stopped
    fn dispatch(&self, node: &Weak<RefCell<PropertiesNode>>, observation: Observation) -> bool {
        match observation {
            Observation::Probe(ticket) => {
                tokio::task::spawn_local(self.clone().run_probe(node.clone(), ticket));
                true
            }
            Observation::Stopped => false,
            Observation::Cleared => {
                debug!("Watched slot cleared");
                true
            }
            Observation::Unchanged => true,
        }
    }

    async fn run_probe(self, node: Weak<RefCell<PropertiesNode>>, ticket: ProbeTicket) {
        let location = self.probe.describe(&ticket.reference);
        debug!("Probing {}", location);
        let result = self.probe.probe(&ticket.reference).await;

        if let Some(node) = node.upgrade() {
            let ctx = self.services.context();
            node.borrow_mut()
                .complete_probe(&ticket, result, &location, &ctx);
        }
    }
}
