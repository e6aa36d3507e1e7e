//! Domain operations
//!
//! Each operation composes one or more store calls into a use case. They take
//! the store as a parameter and hold no state of their own.

pub mod bunnies;
pub mod messages;
pub mod threads;

use chrono::Utc;

pub use bunnies::{create_bunny, fetch_bunnies};
pub use messages::create_message;
pub use threads::{add_message_to_thread, fetch_thread_messages, AppendError, MAX_APPEND_ATTEMPTS};

/// Server-assigned creation timestamp, epoch milliseconds
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
