use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A citation attached to a completed bot reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Source {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            date: None,
        }
    }
}

/// One turn in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub content: String,
    pub sender: Sender,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_streaming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(id, content, Sender::User)
    }

    pub fn bot(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(id, content, Sender::Bot)
    }

    fn new(id: impl Into<String>, content: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
            is_streaming: false,
            sources: None,
            is_error: false,
        }
    }

    pub fn with_sources(mut self, sources: Option<Vec<Source>>) -> Self {
        self.sources = sources;
        self
    }

    pub fn streaming(mut self) -> Self {
        self.is_streaming = true;
        self
    }

    pub fn error(mut self) -> Self {
        self.is_error = true;
        self
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Ids are opaque; some backends send them as numbers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
        Unsigned(u64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Integer(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    })
}

/// Accepts RFC 3339, ISO 8601 without an offset (read as UTC), a bare date,
/// or epoch milliseconds as an integer or float.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Millis(i64),
        FractionalMillis(f64),
        Text(String),
    }

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => from_millis(ms),
        RawTimestamp::FractionalMillis(ms) if ms.is_finite() => {
            let micros = (ms * 1000.0).round() as i64;
            DateTime::<Utc>::from_timestamp_micros(micros)
                .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}")))
        }
        RawTimestamp::FractionalMillis(ms) => {
            Err(serde::de::Error::custom(format!("invalid timestamp: {ms}")))
        }
        RawTimestamp::Text(text) => parse_timestamp_text(text.trim())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {text:?}"))),
    }
}

fn from_millis<E: serde::de::Error>(ms: i64) -> Result<DateTime<Utc>, E> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| E::custom(format!("timestamp out of range: {ms}")))
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
