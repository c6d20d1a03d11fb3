//! # Remote Source Traits
//!
//! Seam traits between the extraction pipeline and the storage provider
//! that backs it.
//!
//! ## Overview
//!
//! This crate defines the contract the pipeline programs against. Provider
//! crates implement these traits against a concrete API; the pipeline never
//! sees HTTP, endpoints, or wire formats. Tests implement them with mocks.
//!
//! ## Traits
//!
//! - [`RemoteSource`](source::RemoteSource) - Folder listing, raw download,
//!   and native-document export
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`Sleeper`](time::Sleeper) - Delay source so retry waits are
//!   controllable in tests
//!
//! ## Error Handling
//!
//! All seam traits use [`RemoteError`](error::RemoteError). Provider
//! implementations convert their internal error types into it and keep the
//! messages actionable (status codes, file ids, paths).
//!
//! ## Thread Safety
//!
//! All seam traits require `Send + Sync` so implementations can be shared
//! across async tasks behind an `Arc`.

pub mod error;
pub mod source;
pub mod time;

pub use error::{RemoteError, Result};
pub use source::{ChildPage, RemoteChild, RemoteSource};
pub use time::{Clock, Sleeper, SystemClock, TokioSleeper};
