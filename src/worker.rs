//! Background worker pool: decode-and-resize off the interactive thread.
//!
//! **Why**: Resizing is CPU-bound; running it on the interactive thread
//! would freeze input handling and repaint for hundreds of milliseconds per
//! page.
//!
//! Each worker loops on [`RenderQueue::dequeue`]: check the cache first (a
//! preload or earlier request may have finished the work already), otherwise
//! fetch raw bytes and resize. Every outcome, success or failure, becomes a
//! [`RenderResult`] posted over the result channel; the scheduler drains
//! that channel on the interactive thread, which is the single delivery
//! point. Workers never write to the cache.
//!
//! Failures are per-request: a malformed page or a missing archive entry is
//! reported and the loop keeps serving. There is no timeout on a single
//! resize call; a stuck one occupies its worker slot until it returns.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use log::{debug, warn};

use crate::cache::PageCache;
use crate::error::RenderError;
use crate::queue::{RenderQueue, RenderRequest};
use crate::resize::ResizeFn;
use crate::source::PageSource;

/// Completed render work, consumed exactly once at the delivery point.
#[derive(Debug, Clone)]
pub struct RenderResult {
    /// Generation stamp copied from the originating request.
    pub generation: u64,
    /// Page index this result belongs to.
    pub page: usize,
    /// Viewport width the page was rendered for.
    pub width: u32,
    /// Viewport height the page was rendered for.
    pub height: u32,
    /// Resized bytes, or the per-request failure.
    pub outcome: Result<Arc<[u8]>, RenderError>,
    /// Copied from the request; preload results are cached, never delivered.
    pub preload: bool,
}

/// Fixed-size pool of render worker threads.
pub struct Workers {
    handles: Vec<thread::JoinHandle<()>>,
}

impl Workers {
    /// Spawn `count` worker threads pulling from `queue`.
    ///
    /// Workers exit when the queue is closed or the result receiver is
    /// dropped, whichever happens first.
    pub fn spawn(
        count: usize,
        queue: Arc<RenderQueue>,
        source: Arc<dyn PageSource>,
        resize: ResizeFn,
        cache: Arc<PageCache>,
        results: Sender<RenderResult>,
    ) -> Self {
        let count = count.max(1);
        let mut handles = Vec::with_capacity(count);

        for worker_id in 0..count {
            let queue = Arc::clone(&queue);
            let source = Arc::clone(&source);
            let resize = Arc::clone(&resize);
            let cache = Arc::clone(&cache);
            let results = results.clone();

            let handle = thread::Builder::new()
                .name(format!("riffle-worker-{}", worker_id))
                .spawn(move || {
                    debug!("Worker {} started", worker_id);

                    while let Some(req) = queue.dequeue() {
                        let outcome = render_one(&req, &*source, &resize, &cache);

                        if let Err(ref e) = outcome {
                            warn!(
                                "Worker {}: page {} failed: {}",
                                worker_id, req.page, e
                            );
                        }

                        let result = RenderResult {
                            generation: req.generation,
                            page: req.page,
                            width: req.width,
                            height: req.height,
                            outcome,
                            preload: req.preload,
                        };
                        if results.send(result).is_err() {
                            break; // Scheduler gone, nothing left to do
                        }
                    }

                    debug!("Worker {} stopped", worker_id);
                })
                .expect("Failed to spawn worker thread");

            handles.push(handle);
        }

        debug!("Workers initialized: {} threads", count);
        Self { handles }
    }

    /// Number of worker threads in the pool.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True when the pool holds no threads.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Join every worker. Call after closing the queue, otherwise this
    /// blocks until the workers are woken some other way.
    pub fn join(self) {
        let count = self.handles.len();
        for handle in self.handles {
            let _ = handle.join();
        }
        debug!("Workers joined ({} threads)", count);
    }
}

/// Cache-or-compute for one request.
fn render_one(
    req: &RenderRequest,
    source: &dyn PageSource,
    resize: &ResizeFn,
    cache: &PageCache,
) -> Result<Arc<[u8]>, RenderError> {
    let key = (req.page, req.width, req.height);
    if let Some(bytes) = cache.get(&key) {
        debug!("Worker cache hit for page {} ({:?})", req.page, key);
        return Ok(bytes);
    }

    let raw = source.get_bytes(req.page)?;
    let resized = resize(&raw, req.width, req.height)?;
    Ok(Arc::from(resized.into_boxed_slice()))
}
