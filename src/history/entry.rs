//! History record types.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of generation kinds.
///
/// Each kind carries the template it renders, the request fields it
/// requires, and the key its generated text is returned under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Social media caption for a dish.
    SocialPost,
    /// Reply to a customer review.
    ReviewReply,
}

impl EntryType {
    /// Every entry type, in a stable order.
    pub const ALL: [EntryType; 2] = [EntryType::SocialPost, EntryType::ReviewReply];

    /// Wire name (`social_post` / `review_reply`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::SocialPost => "social_post",
            EntryType::ReviewReply => "review_reply",
        }
    }

    /// Parse a wire name. Returns `None` for anything unknown.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s.trim())
    }

    /// Logical template identifier used to build the prompt.
    pub fn template_id(&self) -> &'static str {
        self.as_str()
    }

    /// Request fields that must be present.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            EntryType::SocialPost => &["dish_name", "theme", "tone"],
            EntryType::ReviewReply => &["review_text", "sentiment", "tone"],
        }
    }

    /// Request fields that may be present.
    pub fn optional_fields(&self) -> &'static [&'static str] {
        match self {
            EntryType::SocialPost => &["image_reference"],
            EntryType::ReviewReply => &[],
        }
    }

    /// Key the generated text is returned under.
    pub fn response_key(&self) -> &'static str {
        match self {
            EntryType::SocialPost => "caption",
            EntryType::ReviewReply => "reply",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted generation.
///
/// The timestamp is always assigned by the store; there is no way to build a
/// stored entry with a caller-chosen timestamp through the store API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Kind of generation.
    #[serde(rename = "type")]
    pub entry_type: EntryType,

    /// Request fields the prompt was built from.
    #[serde(deserialize_with = "deserialize_input")]
    pub input: BTreeMap<String, String>,

    /// Generated text.
    pub output: String,

    /// Store-assigned append time.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Timestamp as an RFC 3339 string, identical to its serialized form.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

/// Accepts RFC 3339 timestamps and, for logs written before offsets were
/// recorded, naive ISO-8601 timestamps in the host's local time.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = raw
        .parse::<NaiveDateTime>()
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))?;
    Ok(naive_local_to_utc(naive))
}

/// A local time inside a DST fold resolves to its earlier instant; one
/// inside a DST gap has no local reading and is taken as UTC.
fn naive_local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => naive.and_utc(),
    }
}

/// Older logs may carry `null` (absent image) or non-string values in
/// `input`; nulls are dropped and other values kept in compact JSON form.
fn deserialize_input<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}
