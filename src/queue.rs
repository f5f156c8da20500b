//! Bounded render-request queue between the scheduler and the worker pool.
//!
//! **Why**: Under rapid paging only the newest navigation intent matters;
//! requests for pages the user already paged past are wasted work. The queue
//! therefore never blocks the submitting thread: on overflow it drops a
//! request instead (oldest first by default).
//!
//! Two lanes keep opportunistic preloads from ever displacing or delaying
//! interactive requests: `dequeue` always drains the interactive lane first,
//! and each lane has its own capacity.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use log::debug;
use serde::{Deserialize, Serialize};

/// Default per-lane capacity.
pub const DEFAULT_QUEUE_DEPTH: usize = 4;

/// What to drop when a lane is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropPolicy {
    /// Drop the oldest pending request to make room for the newest.
    Oldest,
    /// Drop the incoming request, keeping what is already queued.
    Newest,
}

impl Default for DropPolicy {
    fn default() -> Self {
        DropPolicy::Oldest
    }
}

/// A unit of render work, stamped with the generation that requested it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Staleness fence: results are discarded unless this still matches the
    /// scheduler's current generation.
    pub generation: u64,
    /// Page index in the source's ordering.
    pub page: usize,
    /// Viewport width the page should be rendered for.
    pub width: u32,
    /// Viewport height the page should be rendered for.
    pub height: u32,
    /// Low-priority lookahead request; cached on completion, never delivered.
    pub preload: bool,
}

struct Lanes {
    interactive: VecDeque<RenderRequest>,
    preload: VecDeque<RenderRequest>,
    closed: bool,
}

/// Bounded two-lane FIFO with non-blocking enqueue and blocking dequeue.
pub struct RenderQueue {
    lanes: Mutex<Lanes>,
    ready: Condvar,
    capacity: usize,
    policy: DropPolicy,
}

impl RenderQueue {
    /// Create a queue with the given per-lane capacity and overflow policy.
    pub fn new(capacity: usize, policy: DropPolicy) -> Self {
        Self {
            lanes: Mutex::new(Lanes {
                interactive: VecDeque::with_capacity(capacity),
                preload: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            ready: Condvar::new(),
            capacity: capacity.max(1),
            policy,
        }
    }

    /// Submit a request. Never blocks; on a full lane one request is dropped
    /// according to the policy. Requests submitted after [`close`](Self::close)
    /// are discarded.
    pub fn enqueue(&self, request: RenderRequest) {
        let mut lanes = self.lanes.lock().unwrap();
        if lanes.closed {
            debug!("Queue closed, discarding request for page {}", request.page);
            return;
        }

        let lane = if request.preload {
            &mut lanes.preload
        } else {
            &mut lanes.interactive
        };

        if lane.len() >= self.capacity {
            match self.policy {
                DropPolicy::Oldest => {
                    if let Some(dropped) = lane.pop_front() {
                        debug!(
                            "Queue saturated, dropping oldest request (page {}, gen {})",
                            dropped.page, dropped.generation
                        );
                    }
                }
                DropPolicy::Newest => {
                    debug!(
                        "Queue saturated, dropping incoming request (page {}, gen {})",
                        request.page, request.generation
                    );
                    return;
                }
            }
        }

        lane.push_back(request);
        drop(lanes);
        self.ready.notify_one();
    }

    /// Block until a request is available or the queue is closed.
    ///
    /// Interactive requests are always served before preloads. Returns `None`
    /// once the queue is closed; pending requests are cancelled by the close,
    /// not drained.
    pub fn dequeue(&self) -> Option<RenderRequest> {
        let mut lanes = self.lanes.lock().unwrap();
        loop {
            if lanes.closed {
                return None;
            }
            if let Some(req) = lanes.interactive.pop_front() {
                return Some(req);
            }
            if let Some(req) = lanes.preload.pop_front() {
                return Some(req);
            }
            lanes = self.ready.wait(lanes).unwrap();
        }
    }

    /// Close the queue: cancel all pending requests and wake every blocked
    /// consumer so the pool can tear down.
    pub fn close(&self) {
        let mut lanes = self.lanes.lock().unwrap();
        lanes.closed = true;
        let cancelled = lanes.interactive.len() + lanes.preload.len();
        lanes.interactive.clear();
        lanes.preload.clear();
        drop(lanes);
        if cancelled > 0 {
            debug!("Queue closed, {} pending requests cancelled", cancelled);
        }
        self.ready.notify_all();
    }

    /// Total pending requests across both lanes.
    pub fn len(&self) -> usize {
        let lanes = self.lanes.lock().unwrap();
        lanes.interactive.len() + lanes.preload.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
