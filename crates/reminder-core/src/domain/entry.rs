//! ScheduledEntry - 「時刻 T に通知する」登録 1 件分

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::InputError;
use super::ids::EntryId;

/// Opaque identifier of the thing being reminded about (e.g. a catalog item id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadId(String);

impl PayloadId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parse untrusted input; surrounding whitespace is dropped and empty ids are rejected.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InputError::InvalidPayloadId(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for PayloadId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PayloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who to notify and how to reach them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub address: String,
}

impl Recipient {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// A reminder waiting in the queue.
///
/// `due_at` is fixed at construction; there is no way to reschedule an entry
/// once it has been registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    id: EntryId,
    due_at: DateTime<Utc>,
    payload_id: PayloadId,
    recipient: Recipient,
}

impl ScheduledEntry {
    pub fn new(
        id: EntryId,
        due_at: DateTime<Utc>,
        payload_id: PayloadId,
        recipient: Recipient,
    ) -> Self {
        Self {
            id,
            due_at,
            payload_id,
            recipient,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    pub fn payload_id(&self) -> &PayloadId {
        &self.payload_id
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    /// Due strictly before `as_of`. An entry due exactly at `as_of` is not due yet.
    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.due_at < as_of
    }
}
