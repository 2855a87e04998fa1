pub mod bulk;
pub mod queue;
pub mod threshold;

pub use bulk::{BulkBuffer, BulkError, FlushOutcome, NEWLINE, join_lines};
pub use queue::{JobQueue, QueueClosed, QueueReceiver};
pub use threshold::{MAX_BULK_BYTE_SIZE_THRESHOLD, validate_bulk_byte_size_threshold};
