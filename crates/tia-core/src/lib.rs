#![forbid(unsafe_code)]
//! tia-core library.
//!
//! Turns crawled JSON snapshots of posts and comments into flat tables:
//! schema discovery over semi-structured records, flattening (including
//! nested comment trees), deduplication, and CSV I/O.
//!
//! # Conventions
//!
//! - **Errors**: Library operations return [`error::TiaError`]; configuration
//!   loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod dedupe;
pub mod error;
pub mod flatten;
pub mod input;
pub mod munge;
pub mod schema;
pub mod table;
pub mod timing;
pub mod value;

pub use error::{ErrorCode, TiaError};
pub use table::{Cell, FlatRow, Table};
pub use value::{RawRecord, RecordKind};
