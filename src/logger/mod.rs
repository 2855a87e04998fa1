//! Dispatch strategies.
//!
//! | Logger            | Delivery                    | Back-pressure          |
//! |-------------------|-----------------------------|------------------------|
//! | `SyncLogger`      | one request per call, awaited | caller awaits        |
//! | `AsyncLogger`     | one task per call           | none                   |
//! | `AsyncPoolLogger` | `N` workers, queue of `Q`   | `log` waits when full  |
//! | `AsyncBulkLogger` | byte-bounded batches        | none                   |
//! | `SyncBulkLogger`  | byte-bounded batches, awaited | caller awaits        |

pub mod async_bulk;
pub mod async_logger;
pub mod lifecycle;
pub mod pool;
pub mod result;
pub mod sync_bulk;
pub mod sync_logger;

pub use crate::buffer::BulkError;
pub use async_bulk::AsyncBulkLogger;
pub use async_logger::AsyncLogger;
pub use lifecycle::LifecycleState;
pub use pool::AsyncPoolLogger;
pub use result::{AsyncBulkResult, AsyncResult, ShutdownHandle};
pub use sync_bulk::SyncBulkLogger;
pub use sync_logger::SyncLogger;

use crate::domain::ThresholdError;
use crate::sender::TransportError;
use thiserror::Error;

/// Logger construction failure.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid bulk configuration: {0}")]
    Threshold(#[from] ThresholdError),
    #[error("Invalid transport configuration: {0}")]
    Transport(#[from] TransportError),
    #[error("Invalid worker pool: {0}")]
    Pool(String),
}
