//! Domain model (entries, ids, messages, errors).

pub mod entry;
pub mod errors;
pub mod ids;
pub mod input;
pub mod message;

pub use entry::{PayloadId, Recipient, ScheduledEntry};
pub use errors::{ConfigError, DeliveryError, InputError};
pub use ids::EntryId;
pub use input::parse_due_time;
pub use message::ReminderMessage;
