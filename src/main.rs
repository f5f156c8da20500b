//! Command-line driver: walks every page of a directory through the
//! pipeline, front to back, and reports cache behavior on the way out.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info, warn};

use riffle::{
    auto_workers, default_resize_fn, DirSource, NavAction, PageSource, PipelineConfig, Scheduler,
};

mod cli;
use cli::Args;

/// How long to wait for one page before giving up on it.
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    let args = Args::parse();

    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let default_level = match args.verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    info!("Riffle page renderer starting...");
    debug!("Command-line args: {:?}", args);

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = if workers == 0 { auto_workers() } else { workers };
    }
    if let Some(mb) = args.cache_mb {
        config.cache_bytes = mb * 1024 * 1024;
    }
    if let Some(ms) = args.debounce_ms {
        config.debounce_ms = ms;
    }

    let source = Arc::new(
        DirSource::new(&args.path)
            .with_context(|| format!("Failed to open {}", args.path.display()))?,
    );
    let page_count = source.page_count();
    if page_count == 0 {
        bail!("No pages found under {}", args.path.display());
    }
    info!("Source opened: {} pages", page_count);

    let mut scheduler = Scheduler::new(source, default_resize_fn(), &config);
    scheduler.set_viewport(args.width, args.height);

    let rendered = Rc::new(AtomicUsize::new(0));
    let failed = Rc::new(AtomicUsize::new(0));
    {
        let rendered = Rc::clone(&rendered);
        scheduler.on_page_ready(move |page, bytes| {
            rendered.fetch_add(1, Ordering::Relaxed);
            println!("page {:>4}: {} bytes", page, bytes.len());
        });
    }
    {
        let failed = Rc::clone(&failed);
        scheduler.on_page_failed(move |page, error| {
            failed.fetch_add(1, Ordering::Relaxed);
            eprintln!("page {:>4}: FAILED: {}", page, error);
        });
    }

    let started = Instant::now();
    for step in 0..page_count {
        let nav = if step == 0 { NavAction::First } else { NavAction::Next };
        scheduler.request_navigation(nav);

        let target = rendered.load(Ordering::Relaxed) + failed.load(Ordering::Relaxed) + 1;
        let deadline = Instant::now() + PAGE_TIMEOUT;
        loop {
            scheduler.tick();
            if rendered.load(Ordering::Relaxed) + failed.load(Ordering::Relaxed) >= target {
                break;
            }
            // An info page with nothing behind it settles without delivering
            if scheduler.is_settled() {
                debug!("Step {} settled without a page to show", step);
                break;
            }
            if Instant::now() >= deadline {
                warn!("Timed out waiting for page at step {}", step);
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    let (used, budget) = scheduler.cache_mem();
    info!(
        "Walked {} pages in {:.2}s ({} rendered, {} failed), cache {}/{} KiB",
        page_count,
        started.elapsed().as_secs_f64(),
        rendered.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        used / 1024,
        budget / 1024
    );

    scheduler.shutdown();
    Ok(())
}
