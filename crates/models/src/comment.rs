use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Length past which the page warns the author; not enforced by the server.
pub const SOFT_TEXT_LIMIT: usize = 450;

/// A single anonymous post.
///
/// `id` is the creation instant in milliseconds since the Unix epoch. It is
/// unique in practice but nothing enforces it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    /// Build a comment stamped at `now`, truncated to the millisecond so it
    /// survives a round trip through storage unchanged. `text` must already
    /// be normalized through [`normalize_text`].
    pub fn new(text: String, now: DateTime<Utc>) -> Self {
        let timestamp = now.trunc_subsecs(3);
        Self { id: timestamp.timestamp_millis(), text, timestamp }
    }

    pub fn exceeds_soft_limit(&self) -> bool {
        self.text.chars().count() > SOFT_TEXT_LIMIT
    }
}

/// Trim surrounding whitespace and reject text that ends up empty.
pub fn normalize_text(raw: &str) -> Result<String, ModelError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ModelError::Validation("Comment text is required".into()));
    }
    Ok(trimmed.to_string())
}

/// Decode a persisted comment list (a JSON array, newest first).
pub fn decode_list(bytes: &[u8]) -> Result<Vec<Comment>, ModelError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn encode_list(comments: &[Comment]) -> Result<Vec<u8>, ModelError> {
    Ok(serde_json::to_vec(comments)?)
}

/// Placeholder list served when nothing has been persisted yet, newest first.
pub fn seed_comments() -> Vec<Comment> {
    let at = |millis: i64| Utc.timestamp_millis_opt(millis).single().unwrap_or_default();
    vec![
        Comment {
            id: 2,
            text: "Be kind, stay curious, and leave a note for the next visitor.".into(),
            timestamp: at(1_704_067_260_000),
        },
        Comment {
            id: 1,
            text: "Welcome to the comment board! Say hello below.".into(),
            timestamp: at(1_704_067_200_000),
        },
    ]
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_rejects_blank() {
        assert_eq!(normalize_text("  hi  ").unwrap(), "hi");
        assert_eq!(normalize_text("\n\tline\n").unwrap(), "line");
        assert!(matches!(normalize_text(""), Err(ModelError::Validation(_))));
        assert!(matches!(normalize_text("   \t\n"), Err(ModelError::Validation(_))));
    }

    #[test]
    fn timestamp_serializes_as_iso_millis() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let c = Comment::new("hello".into(), now);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["timestamp"], "2024-05-01T12:30:00.000Z");
        assert_eq!(json["id"], now.timestamp_millis());
        assert_eq!(json["text"], "hello");
    }

    #[test]
    fn new_truncates_to_millis() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap() + chrono::Duration::nanoseconds(1_234_567);
        let c = Comment::new("x".into(), now);
        assert_eq!(c.timestamp.timestamp_subsec_nanos(), 1_000_000);
        let back: Comment = serde_json::from_value(serde_json::to_value(&c).unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn decode_accepts_any_rfc3339_offset() {
        let raw = br#"[{"id":7,"text":"x","timestamp":"2024-05-01T14:30:00+02:00"}]"#;
        let list = decode_list(raw).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_list(b"{not json"), Err(ModelError::Decode(_))));
        assert!(matches!(decode_list(br#"{"id":1}"#), Err(ModelError::Decode(_))));
    }

    #[test]
    fn seed_is_two_items_newest_first() {
        let seed = seed_comments();
        assert_eq!(seed.len(), 2);
        assert!(seed[0].timestamp > seed[1].timestamp);
        assert!(seed.iter().all(|c| !c.text.trim().is_empty()));
    }

    #[test]
    fn soft_limit_counts_chars() {
        let now = Utc::now();
        assert!(!Comment::new("é".repeat(SOFT_TEXT_LIMIT), now).exceeds_soft_limit());
        assert!(Comment::new("a".repeat(SOFT_TEXT_LIMIT + 1), now).exceeds_soft_limit());
    }
}
