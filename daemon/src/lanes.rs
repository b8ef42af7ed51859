//! Ordered command execution.
//!
//! Each [`Lane`] owns one worker task fed by an unbounded channel, so the
//! commands about one member run strictly in arrival order while different
//! members proceed concurrently. A slow profile fetch for one member never
//! delays another, and a leave can never overtake the join before it.

use crate::bridge::{self, Command, Lane, Output, StdioPlatform};
use biogate_verification::VerificationOrchestrator;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, error};

struct LaneHandle {
    tx: UnboundedSender<Command>,
    /// Commands queued or running on this lane.
    pending: Arc<AtomicUsize>,
}

pub struct Lanes {
    engine: Arc<VerificationOrchestrator>,
    platform: Arc<StdioPlatform>,
    out: UnboundedSender<Output>,
    lanes: HashMap<Lane, LaneHandle>,
    workers: JoinSet<()>,
}

impl Lanes {
    pub fn new(
        engine: Arc<VerificationOrchestrator>,
        platform: Arc<StdioPlatform>,
        out: UnboundedSender<Output>,
    ) -> Self {
        Self {
            engine,
            platform,
            out,
            lanes: HashMap::new(),
            workers: JoinSet::new(),
        }
    }

    /// Queue `command` behind earlier commands of the same lane.
    pub fn submit(&mut self, command: Command) {
        let handle = match self.lanes.entry(command.lane()) {
            Entry::Occupied(entry) => {
                let handle = entry.into_mut();
                if handle.tx.is_closed() {
                    // The worker died (a panic); its queue is lost with it.
                    error!(lane = ?command.lane(), "lane worker gone, restarting lane");
                    *handle = spawn_worker(
                        &mut self.workers,
                        self.engine.clone(),
                        self.platform.clone(),
                        self.out.clone(),
                    );
                }
                handle
            }
            Entry::Vacant(entry) => entry.insert(spawn_worker(
                &mut self.workers,
                self.engine.clone(),
                self.platform.clone(),
                self.out.clone(),
            )),
        };
        handle.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(mpsc::error::SendError(command)) = handle.tx.send(command) {
            handle.pending.fetch_sub(1, Ordering::SeqCst);
            error!(command = command.name(), "lane closed, command dropped");
        }
    }

    /// Number of open lanes.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Close lanes with nothing queued or running. Their workers exit once
    /// the channel drains; a later command for the lane opens a fresh one.
    pub fn prune_idle(&mut self) {
        let before = self.lanes.len();
        self.lanes
            .retain(|_, handle| handle.pending.load(Ordering::SeqCst) > 0);
        let closed = before - self.lanes.len();
        if closed > 0 {
            debug!(closed, open = self.lanes.len(), "closed idle command lanes");
        }
    }

    /// Collect finished workers without waiting.
    pub fn reap(&mut self) {
        while let Some(joined) = self.workers.try_join_next() {
            if let Err(e) = joined {
                error!(error = %e, "command lane failed");
            }
        }
    }

    /// Let every queued command finish, then stop all workers.
    pub async fn shutdown(mut self) {
        self.lanes.clear();
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "command lane failed");
            }
        }
    }
}

fn spawn_worker(
    workers: &mut JoinSet<()>,
    engine: Arc<VerificationOrchestrator>,
    platform: Arc<StdioPlatform>,
    out: UnboundedSender<Output>,
) -> LaneHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
    let pending = Arc::new(AtomicUsize::new(0));
    let counter = pending.clone();
    workers.spawn(async move {
        while let Some(command) = rx.recv().await {
            let reply = bridge::dispatch(&engine, &platform, command).await;
            counter.fetch_sub(1, Ordering::SeqCst);
            bridge::send(&out, reply);
        }
    });
    LaneHandle { tx, pending }
}
