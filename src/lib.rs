//! RIFFLE - Asynchronous page-rendering pipeline
//!
//! Turns navigation intents over a sequential page source into resized,
//! cached page bitmaps, keeping the interactive thread free of decode work.

pub mod cache;
pub mod config;
pub mod debounce;
pub mod error;
pub mod queue;
pub mod resize;
pub mod scheduler;
pub mod source;
pub mod worker;

// Re-export the pipeline surface
pub use cache::{PageCache, PageKey, DEFAULT_CACHE_BYTES};
pub use config::{auto_workers, PipelineConfig};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use error::{RenderError, SourceError};
pub use queue::{DropPolicy, RenderQueue, RenderRequest, DEFAULT_QUEUE_DEPTH};
pub use resize::{default_resize_fn, fit_resize, ResizeFn};
pub use scheduler::{NavAction, Scheduler};
pub use source::{DirSource, PageKind, PageSource};
pub use worker::{RenderResult, Workers};
