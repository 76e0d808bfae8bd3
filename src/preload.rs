//! Asset preloading off the render thread.
//!
//! - Bounded worker pool probing image dimensions
//! - One `AssetsSettled` dispatch per batch, never per asset
//! - Failures count as completion so gated work never hangs
//! - Videos settle with their poster's size when they have one
//! - Uses flume between the caller and the workers

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::host::{Handle, Host, HostEvent, HostSender, Token};
use crate::image_loader;
use crate::models::MediaKind;

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 2;

/// Maximum number of worker threads.
const MAX_WORKERS: usize = 4;

/// One media ref to settle.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRequest {
    pub media_ref: String,
    pub kind: MediaKind,
    pub poster: Option<String>,
}

impl AssetRequest {
    pub fn new(media_ref: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            media_ref: media_ref.into(),
            kind,
            poster: None,
        }
    }

    pub fn with_poster(mut self, poster: Option<String>) -> Self {
        self.poster = poster;
        self
    }
}

/// Outcome for one asset of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SettledAsset {
    pub media_ref: String,
    /// Natural pixel size, when it could be probed. For videos this is the
    /// poster's size.
    pub size: Option<(u32, u32)>,
    /// Poster that loaded and may be shown in place of the video.
    pub poster: Option<String>,
    pub failed: bool,
}

struct Batch {
    token: Token,
    sender: HostSender,
    remaining: AtomicUsize,
    results: Mutex<Vec<Option<SettledAsset>>>,
}

impl Batch {
    fn complete(&self, index: usize, asset: SettledAsset) {
        self.results.lock()[index] = Some(asset);
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            let assets: Vec<SettledAsset> =
                self.results.lock().drain(..).flatten().collect();
            debug!(count = assets.len(), token = ?self.token, "Asset batch settled");
            if !self.sender.post(self.token, HostEvent::AssetsSettled { assets }) {
                trace!(token = ?self.token, "Host gone before batch settled");
            }
        }
    }
}

struct Job {
    index: usize,
    request: AssetRequest,
    batch: Arc<Batch>,
}

/// Worker pool that settles batches of media refs.
pub struct AssetPreloader {
    request_tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    active_workers: Arc<AtomicUsize>,
}

impl AssetPreloader {
    pub fn new(workers: usize) -> Self {
        let num_workers = workers.clamp(1, MAX_WORKERS);
        let (request_tx, request_rx) = flume::unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let active_workers = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            let rx = request_rx.clone();
            let shutdown = Arc::clone(&shutdown);
            let active = Arc::clone(&active_workers);
            let spawned = thread::Builder::new()
                .name(format!("preload-worker-{}", worker_id))
                .spawn(move || worker_loop(worker_id, rx, shutdown, active));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!(worker_id, error = ?e, "Failed to spawn preload worker"),
            }
        }

        debug!(num_workers = handles.len(), "Started asset preloader");

        Self {
            request_tx,
            workers: handles,
            shutdown,
            active_workers,
        }
    }

    /// Queue a batch. The returned task handle receives exactly one
    /// `AssetsSettled` dispatch; dropping it discards the result.
    pub fn preload(&self, host: &Host, assets: Vec<AssetRequest>) -> Handle {
        let task = host.task();
        let sender = host.sender();

        if assets.is_empty() {
            sender.post(task.token(), HostEvent::AssetsSettled { assets: Vec::new() });
            return task;
        }

        let batch = Arc::new(Batch {
            token: task.token(),
            sender,
            remaining: AtomicUsize::new(assets.len()),
            results: Mutex::new(vec![None; assets.len()]),
        });

        for (index, request) in assets.into_iter().enumerate() {
            let job = Job {
                index,
                request,
                batch: Arc::clone(&batch),
            };
            if self.workers.is_empty() {
                run_job(job);
                continue;
            }
            if let Err(flume::SendError(job)) = self.request_tx.send(job) {
                warn!("Preload queue disconnected, settling inline");
                run_job(job);
            }
        }
        task
    }

    pub fn active_worker_count(&self) -> usize {
        self.active_workers.load(Ordering::Relaxed)
    }

    pub fn shutdown(&mut self) {
        debug!("Shutting down asset preloader");
        self.shutdown.store(true, Ordering::SeqCst);
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Default for AssetPreloader {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl Drop for AssetPreloader {
    fn drop(&mut self) {
        if !self.shutdown.load(Ordering::Relaxed) {
            self.shutdown();
        }
    }
}

fn worker_loop(
    worker_id: usize,
    rx: Receiver<Job>,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
) {
    trace!(worker_id, "Preload worker started");
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(job) => {
                active.fetch_add(1, Ordering::Relaxed);
                run_job(job);
                active.fetch_sub(1, Ordering::Relaxed);
            }
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }
    trace!(worker_id, "Preload worker stopped");
}

fn run_job(job: Job) {
    let asset = probe(job.request);
    job.batch.complete(job.index, asset);
}

fn probe(request: AssetRequest) -> SettledAsset {
    let AssetRequest {
        media_ref,
        kind,
        poster,
    } = request;
    if kind == MediaKind::Video {
        return probe_poster(media_ref, poster);
    }
    if image_loader::is_remote_ref(&media_ref) {
        return SettledAsset {
            media_ref,
            size: None,
            poster: None,
            failed: false,
        };
    }
    match image_loader::read_dimensions(Path::new(&media_ref)) {
        Ok(size) => SettledAsset {
            media_ref,
            size: Some(size),
            poster: None,
            failed: false,
        },
        Err(e) => {
            debug!(%media_ref, error = ?e, "Asset failed to load, treating as settled");
            SettledAsset {
                media_ref,
                size: None,
                poster: None,
                failed: true,
            }
        }
    }
}

/// A video never fails to settle; its poster is applied only when usable.
fn probe_poster(media_ref: String, poster: Option<String>) -> SettledAsset {
    let (size, poster) = match poster {
        Some(p) if image_loader::is_remote_ref(&p) => (None, Some(p)),
        Some(p) => match image_loader::read_dimensions(Path::new(&p)) {
            Ok(size) => (Some(size), Some(p)),
            Err(e) => {
                debug!(poster = %p, error = ?e, "Poster failed to load, skipping");
                (None, None)
            }
        },
        None => (None, None),
    };
    SettledAsset {
        media_ref,
        size,
        poster,
        failed: false,
    }
}
