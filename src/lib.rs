#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Millisecond intervals fit comfortably
    clippy::cast_sign_loss,           // Guarded by explicit positivity checks
    clippy::missing_errors_doc,       // Error enums are self-describing
    clippy::module_name_repetitions,  // e.g. BulkError in bulk module
    clippy::must_use_candidate,       // Annotated selectively on handles
    clippy::doc_markdown
)]

//! Client-side log forwarder.
//!
//! Messages are serialized into compact JSON lines and delivered to a remote
//! ingestion endpoint through one of several dispatch strategies:
//!
//! * [`AsyncLogger`] spawns one task per message.
//! * [`AsyncPoolLogger`] feeds a fixed set of workers through a bounded queue.
//! * [`AsyncBulkLogger`] and [`SyncBulkLogger`] buffer lines and ship them as
//!   newline-joined batches once a byte threshold or a flush interval is hit.
//! * [`SyncLogger`] awaits a single send per message.
//!
//! Nothing is retried. Failures are handed back to the caller together with
//! the exact lines that were not delivered.

pub mod app;
pub mod buffer;
pub mod domain;
pub mod logger;
pub mod sender;

pub use domain::{LogError, Message};
pub use logger::{
    AsyncBulkLogger, AsyncBulkResult, AsyncLogger, AsyncPoolLogger, AsyncResult, BulkError,
    ConfigurationError, LifecycleState, ShutdownHandle, SyncBulkLogger, SyncLogger,
};
pub use sender::{ClientConfig, HttpTransport, Transport, TransportError, TransportResponse};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
