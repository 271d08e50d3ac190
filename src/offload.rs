//! Bridge from async code to the rayon pool for CPU-bound pixel work.
//!
//! Decoding, resizing and encoding are pure CPU work and would stall the tokio
//! workers if run inline. [`run`] hands a closure to rayon and awaits its
//! result over a oneshot channel, so the async side only ever waits on I/O.
//!
//! Panics inside the closure are caught and returned as [`OffloadError`]
//! instead of tearing down the pool (rayon aborts on unhandled panics in
//! spawned jobs).

use std::panic::{AssertUnwindSafe, catch_unwind};
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OffloadError {
    #[error("worker panicked: {0}")]
    Panicked(String),
    #[error("worker dropped its result")]
    Dropped,
}

/// Run `f` on the rayon pool and await its result.
pub async fn run<F, T>(f: F) -> Result<T, OffloadError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    rayon::spawn(move || {
        let result = catch_unwind(AssertUnwindSafe(f));
        // Receiver is gone if the invocation was abandoned
        let _ = tx.send(result);
    });

    match rx.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(payload)) => Err(OffloadError::Panicked(panic_message(payload.as_ref()))),
        Err(_) => Err(OffloadError::Dropped),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Initialize the global rayon pool with `threads` workers.
///
/// Only the first call has an effect; later calls are ignored.
pub fn init_thread_pool(threads: usize) {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("thumbs-cpu-{i}"))
        .build_global()
        .ok();
}
