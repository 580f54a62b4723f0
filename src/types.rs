use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. Never mutated after it is appended.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub timestamp: OffsetDateTime,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self.role, Role::User)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Delivery location captured by the location dialog.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub address: String,
    pub coordinates: Option<Coordinates>,
}

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

/// Formats a timestamp as local `hh:mm AM`, falling back to UTC when the
/// local offset cannot be determined.
pub fn format_message_timestamp(timestamp: OffsetDateTime) -> Option<String> {
    let mut datetime = timestamp;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn constructors_set_role() {
        assert!(Message::user("hi").is_user());
        assert!(!Message::assistant("hello").is_user());
    }

    #[test]
    fn timestamp_formats_as_clock_time() {
        let formatted = format_message_timestamp(datetime!(2024-03-01 15:07 UTC)).unwrap();
        assert_eq!(formatted.len(), "03:07 PM".len());
        assert!(formatted.ends_with("AM") || formatted.ends_with("PM"));
    }
}
