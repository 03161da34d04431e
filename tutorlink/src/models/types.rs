use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque account id, stable across sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub i64);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Identity {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(pub chrono::DateTime<chrono::Utc>);

impl DateTime {
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }
}

impl From<chrono::DateTime<chrono::Utc>> for DateTime {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        Self(value)
    }
}

impl Serialize for DateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        tutorlink_transport::timestamp::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        tutorlink_transport::timestamp::deserialize(deserializer).map(Self)
    }
}

/// Unordered pair of participants identifying one conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    low: Identity,
    high: Identity,
}

impl ConversationKey {
    pub fn new(a: Identity, b: Identity) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn participants(&self) -> (Identity, Identity) {
        (self.low, self.high)
    }

    pub fn contains(&self, identity: Identity) -> bool {
        self.low == identity || self.high == identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_key_is_unordered() {
        let a = Identity(7);
        let b = Identity(3);
        assert_eq!(ConversationKey::new(a, b), ConversationKey::new(b, a));
        assert_eq!(ConversationKey::new(a, b).participants(), (b, a));
        assert!(ConversationKey::new(a, b).contains(a));
        assert!(!ConversationKey::new(a, b).contains(Identity(5)));
    }

    #[test]
    fn test_datetime_serde_roundtrip_keeps_micros() {
        let value = DateTime(
            chrono::DateTime::from_timestamp_micros(1_700_000_000_123_456).unwrap(),
        );
        let json = serde_json::to_string(&value).unwrap();
        let decoded: DateTime = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, value);
    }
}
