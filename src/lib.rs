//! # bucket-thumbs
//!
//! An event-triggered thumbnailing pipeline. When an image lands in a bucket,
//! one invocation fetches it, decodes it once, and fans out into a fixed set of
//! resized variants that are written to a sibling bucket.
//!
//! # Architecture: One Event, N Variants
//!
//! ```text
//! S3 event ─► Dispatcher ─► fetch ─► decode ─► FanOut ─┬─► ResizeWorker(120)  ─► store
//!                                                      ├─► ResizeWorker(512)  ─► store
//!                                                      └─► ResizeWorker(1024) ─► store
//!                                                               │
//!                                              InvocationOutcome ◄┘
//! ```
//!
//! The dispatcher rejects or skips bad events before any I/O. Everything after
//! the decode runs per variant and never aborts a sibling: one failed upload
//! turns the outcome into a partial failure, it does not cut the others short.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`dispatch`] | Entry point: admission checks, fetch, single decode, hand-off to fan-out |
//! | [`fanout`] | Runs one worker per configured size concurrently, collects every result |
//! | [`worker`] | One variant: resize, encode, store; failures are recorded, never raised |
//! | [`plan`] | Pure variant planning: output dimensions and key per size |
//! | [`naming`] | Destination bucket rule, variant key rule, extension classification |
//! | [`event`] | S3 notification model and key decoding |
//! | [`outcome`] | Per-variant results and the aggregate invocation outcome |
//! | [`imaging`] | Codec trait, `image`-crate implementation, cover-fit math |
//! | [`store`] | Object store trait with S3 and local-filesystem backends |
//! | [`offload`] | Runs CPU-bound codec work on the rayon pool from async code |
//! | [`config`] | `config.toml` loading, validation, and the stock config text |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Decode Once, Share Read-Only
//!
//! The source is decoded exactly once per invocation. The decoded handle is put
//! behind an `Arc` and every worker resizes from it into a new handle of its
//! own. Nothing writes to the shared handle, so the fan-out needs no locks and
//! no worker ever re-decodes.
//!
//! ## Async I/O, Rayon for Pixels
//!
//! Fetches and uploads are async (tokio). Decoding, resizing and encoding are
//! CPU-bound and run on a rayon pool sized from `[processing] max_threads`;
//! the async side awaits them over a oneshot channel (see [`offload`]). Uploads
//! of finished variants overlap with resizing of the others.
//!
//! ## Short-Edge Cover-Fit With Integer Rounding
//!
//! Each variant's short edge equals its configured size exactly; the long edge
//! is scaled by the same factor and rounded up in integer arithmetic. A
//! 4000x3000 source at size 1024 becomes 1366x1024. See
//! [`imaging::cover_fit_dimensions`].
//!
//! ## Skips Are Successes
//!
//! A key whose extension is missing or not in `supported_types` ends the
//! invocation as [`outcome::InvocationOutcome::Skipped`], which the runtime
//! treats as success. Non-image uploads are never retried.
//!
//! ## Keys Are Stable
//!
//! Variant keys are `{size}_{source key}`. Re-running an invocation overwrites
//! the same keys rather than adding new ones, so retries are safe and an
//! abandoned invocation needs no cleanup.

/// `EnvFilter` directive used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "bucket_thumbs=info";

pub mod config;
pub mod dispatch;
pub mod event;
pub mod fanout;
pub mod imaging;
pub mod naming;
pub mod offload;
pub mod outcome;
pub mod output;
pub mod plan;
pub mod store;
pub mod worker;
