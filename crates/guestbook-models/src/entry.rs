//! Guestbook entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::ModelError;

/// One record of the guestbook contract storage.
///
/// The contract fills in `address` (the operation sender) and `date`
/// (the block timestamp); only `text` comes from the caller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Account that posted the message.
    pub address: Address,
    /// Timestamp of the block that included the message.
    pub date: DateTime<Utc>,
    /// The message itself.
    pub text: String,
}

impl Entry {
    /// Build an entry.
    pub fn new(address: Address, date: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            address,
            date,
            text: text.into(),
        }
    }
}

/// Reject an empty message before it reaches the wallet.
pub fn validate_message(text: &str) -> Result<&str, ModelError> {
    if text.is_empty() {
        Err(ModelError::EmptyMessage)
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn entry_serde_roundtrip_uses_rfc3339() {
        let date = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
        let entry = Entry::new(Address::new("tz1Abc"), date, "Hello");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["address"], "tz1Abc");
        assert_eq!(json["date"], "2021-06-01T12:00:00Z");
        let back: Entry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn empty_message_rejected() {
        assert_eq!(validate_message(""), Err(ModelError::EmptyMessage));
        assert_eq!(validate_message("hello"), Ok("hello"));
    }
}
