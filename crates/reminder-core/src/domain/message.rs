//! Reminder text as handed to a human-facing channel (mail, chat, log).

use serde::Serialize;

use super::entry::{PayloadId, Recipient};

pub const REMINDER_SUBJECT: &str = "Watch your movie.";

/// Rendered reminder for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderMessage {
    pub to_name: String,
    pub to_address: String,
    pub subject: String,
    pub body: String,
}

impl ReminderMessage {
    pub fn for_entry(recipient: &Recipient, payload_id: &PayloadId) -> Self {
        Self {
            to_name: recipient.name.clone(),
            to_address: recipient.address.clone(),
            subject: REMINDER_SUBJECT.to_string(),
            body: format!("It's time, watch movie with ID: {payload_id}"),
        }
    }
}
