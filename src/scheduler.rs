//! Navigation scheduler: generation stamping, staleness fencing, delivery.
//!
//! **Why**: Rapid paging floods the pipeline with out-of-order background
//! completions. The scheduler guarantees that only the most recently
//! requested page ever reaches the display callbacks, without preempting
//! in-flight resize work.
//!
//! **Used by**: The presentation layer (navigation input, ready/failed
//! callbacks), driven once per event-loop turn via [`Scheduler::tick`].
//!
//! # Cancellation model
//!
//! Cancellation is logical, not physical: every resolved navigation bumps a
//! monotonically increasing generation counter, every request carries the
//! generation that spawned it, and the single delivery point discards any
//! result whose stamp no longer matches. In-flight resize calls are never
//! interrupted; their results simply arrive dead.
//!
//! # Threading
//!
//! All scheduler state lives on the interactive thread. Workers hand results
//! back through a channel which `tick` drains on that thread; they never
//! touch scheduler state or write to the cache directly.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use log::{debug, info, warn};

use crate::cache::PageCache;
use crate::config::PipelineConfig;
use crate::debounce::Debouncer;
use crate::error::RenderError;
use crate::queue::{RenderQueue, RenderRequest};
use crate::resize::ResizeFn;
use crate::source::{PageKind, PageSource};
use crate::worker::{RenderResult, Workers};

/// A navigation intent from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    /// Advance one page (clamped at the end).
    Next,
    /// Go back one page (clamped at the start).
    Prev,
    /// Jump to the first page.
    First,
    /// Jump to the last page.
    Last,
    /// Jump to a specific page index (clamped).
    Jump(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedState {
    /// No outstanding interactive request.
    Idle,
    /// An interactive request for the current generation is in flight.
    AwaitingResult,
}

type ReadyCallback = Box<dyn FnMut(usize, Arc<[u8]>)>;
type FailedCallback = Box<dyn FnMut(usize, RenderError)>;

/// Owns the rendering pipeline: cache, queue, worker pool, debouncer and the
/// generation counter.
pub struct Scheduler {
    source: Arc<dyn PageSource>,
    cache: Arc<PageCache>,
    queue: Arc<RenderQueue>,
    workers: Option<Workers>,
    results: Receiver<RenderResult>,
    debounce: Debouncer<NavAction>,
    generation: u64,
    current_page: usize,
    viewport: (u32, u32),
    state: SchedState,
    on_ready: Option<ReadyCallback>,
    on_failed: Option<FailedCallback>,
}

impl Scheduler {
    /// Build a pipeline over `source`, spawning the worker pool.
    pub fn new(source: Arc<dyn PageSource>, resize: ResizeFn, config: &PipelineConfig) -> Self {
        let cache = Arc::new(PageCache::new(config.cache_bytes));
        let queue = Arc::new(RenderQueue::new(config.queue_depth, config.drop_policy));
        let (results_tx, results_rx) = crossbeam_channel::unbounded();

        let workers = Workers::spawn(
            config.workers,
            Arc::clone(&queue),
            Arc::clone(&source),
            resize,
            Arc::clone(&cache),
            results_tx,
        );

        info!(
            "Pipeline ready: {} workers, queue depth {}, cache budget {} MiB, debounce {} ms",
            workers.len(),
            config.queue_depth,
            config.cache_bytes / 1024 / 1024,
            config.debounce_ms
        );

        Self {
            source,
            cache,
            queue,
            workers: Some(workers),
            results: results_rx,
            debounce: Debouncer::new(Duration::from_millis(config.debounce_ms)),
            generation: 0,
            current_page: 0,
            viewport: (1920, 1080),
            state: SchedState::Idle,
            on_ready: None,
            on_failed: None,
        }
    }

    /// Register the callback invoked with `(page, resized_bytes)` when the
    /// current page is ready.
    pub fn on_page_ready(&mut self, callback: impl FnMut(usize, Arc<[u8]>) + 'static) {
        self.on_ready = Some(Box::new(callback));
    }

    /// Register the callback invoked when rendering the current page failed.
    pub fn on_page_failed(&mut self, callback: impl FnMut(usize, RenderError) + 'static) {
        self.on_failed = Some(Box::new(callback));
    }

    /// Set the viewport dimensions used for all future render requests.
    ///
    /// Entries rendered for old dimensions stay cached and fall out through
    /// LRU pressure; they are still correct if the window shrinks back.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    /// Entry point for every navigation input. Routed through the debouncer,
    /// so a burst of calls resolves to the last one.
    pub fn request_navigation(&mut self, nav: NavAction) {
        self.debounce.trigger(nav);
    }

    /// One interactive-loop turn: fire due debounced navigation, then drain
    /// completed results. This is the pipeline's single delivery point.
    pub fn tick(&mut self) {
        if let Some(nav) = self.debounce.poll_due() {
            self.resolve_navigation(nav);
        }
        while let Ok(result) = self.results.try_recv() {
            self.handle_result(result);
        }
    }

    /// Current page index.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Current generation (bumps once per resolved navigation).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while an interactive request is in flight.
    pub fn is_awaiting(&self) -> bool {
        self.state == SchedState::AwaitingResult
    }

    /// True when nothing is pending: no debounced navigation waiting and no
    /// interactive request in flight. Drivers can stop polling.
    pub fn is_settled(&self) -> bool {
        !self.debounce.is_pending() && self.state == SchedState::Idle
    }

    /// Cache usage and budget, in bytes.
    pub fn cache_mem(&self) -> (usize, usize) {
        self.cache.mem()
    }

    /// Tear the pipeline down: cancel pending navigation, close the queue
    /// (cancelling queued work), join all workers, release the cache.
    ///
    /// Safe to call more than once; workers are joined exactly once.
    pub fn shutdown(&mut self) {
        if let Some(workers) = self.workers.take() {
            info!("Shutting down pipeline ({} workers)", workers.len());
            self.debounce.cancel();
            self.queue.close();
            workers.join();
            self.cache.clear();
        }
    }

    /// Resolve a post-debounce navigation: bump the generation, pick the
    /// page to render, serve from cache or enqueue.
    fn resolve_navigation(&mut self, nav: NavAction) {
        let count = self.source.page_count();
        if count == 0 {
            return;
        }

        let target = match nav {
            NavAction::Next => (self.current_page + 1).min(count - 1),
            NavAction::Prev => self.current_page.saturating_sub(1),
            NavAction::First => 0,
            NavAction::Last => count - 1,
            NavAction::Jump(index) => index.min(count - 1),
        };

        self.current_page = target;
        self.generation += 1;
        let generation = self.generation;

        // Info pages carry no decodable image; show the image page behind
        // them and let the presentation layer overlay the text.
        let render_page = match self.source.page_kind(target) {
            Some(PageKind::Info) => match self.find_next_image(target) {
                Some(index) => index,
                None => {
                    debug!("Info page {} has no following image page", target);
                    self.state = SchedState::Idle;
                    return;
                }
            },
            _ => target,
        };

        let (width, height) = self.viewport;
        let key = (render_page, width, height);

        if let Some(bytes) = self.cache.get(&key) {
            debug!("Cache hit for page {} (gen {})", render_page, generation);
            self.state = SchedState::Idle;
            if let Some(callback) = self.on_ready.as_mut() {
                callback(render_page, bytes);
            }
        } else {
            debug!(
                "Cache miss for page {} at {}x{}, queueing (gen {})",
                render_page, width, height, generation
            );
            self.queue.enqueue(RenderRequest {
                generation,
                page: render_page,
                width,
                height,
                preload: false,
            });
            self.state = SchedState::AwaitingResult;
        }

        // Lookahead: warm the cache with the next image page
        if let Some(next) = self.find_next_image(render_page) {
            if !self.cache.contains(&(next, width, height)) {
                debug!("Preloading page {} (gen {})", next, generation);
                self.queue.enqueue(RenderRequest {
                    generation,
                    page: next,
                    width,
                    height,
                    preload: true,
                });
            }
        }
    }

    /// First image page strictly after `from`, skipping info pages.
    fn find_next_image(&self, from: usize) -> Option<usize> {
        (from + 1..self.source.page_count())
            .find(|&index| self.source.page_kind(index) == Some(PageKind::Image))
    }

    /// The single delivery point: generation check, write-through, callback.
    fn handle_result(&mut self, result: RenderResult) {
        if result.generation != self.generation {
            if result.generation > self.generation {
                // Generations only move forward on this thread; a result
                // from the future means a stamping bug somewhere
                warn!(
                    "Result for page {} carries generation {} ahead of current {}, discarding",
                    result.page, result.generation, self.generation
                );
            } else {
                debug!(
                    "Discarding stale result for page {} (gen {} < {})",
                    result.page, result.generation, self.generation
                );
            }
            return;
        }

        let key = (result.page, result.width, result.height);
        match result.outcome {
            Ok(bytes) => {
                self.cache.put(key, Arc::clone(&bytes));
                if result.preload {
                    debug!("Preloaded page {} cached", result.page);
                    return;
                }
                self.state = SchedState::Idle;
                if let Some(callback) = self.on_ready.as_mut() {
                    callback(result.page, bytes);
                }
            }
            Err(error) => {
                if result.preload {
                    debug!("Preload of page {} failed: {}", result.page, error);
                    return;
                }
                self.state = SchedState::Idle;
                if let Some(callback) = self.on_failed.as_mut() {
                    callback(result.page, error);
                }
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
