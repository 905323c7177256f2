//! Dashboard records and the contract for live-synchronized collections.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;

/// Record identifier as it appears on the wire.
///
/// Backends emit both string and numeric ids; both are normalized to text so
/// identity comparisons never depend on the JSON number/string distinction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("record id cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum WireId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        let text = match WireId::deserialize(deserializer)? {
            WireId::Text(text) => text,
            WireId::Unsigned(n) => n.to_string(),
            WireId::Signed(n) => n.to_string(),
        };
        RecordId::parse(text).map_err(serde::de::Error::custom)
    }
}

/// A record that can live in a synchronized collection.
pub trait SyncRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Lower-case entity label used in notifications ("customer", "D-Mail").
    const ENTITY: &'static str;

    fn record_id(&self) -> &RecordId;

    /// Human label for notifications.
    fn display_name(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl SyncRecord for Customer {
    const ENTITY: &'static str = "customer";

    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    #[default]
    Planned,
    Running,
    Completed,
    Aborted,
    /// Forward-compatibility fallback for newer variants.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub status: ExperimentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SyncRecord for Experiment {
    const ENTITY: &'static str = "experiment";

    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

/// A message sent to the past.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DMail {
    pub id: RecordId,
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl SyncRecord for DMail {
    const ENTITY: &'static str = "D-Mail";

    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn display_name(&self) -> String {
        self.subject.clone()
    }
}

/// One divergence-meter sample plotted by the worldline monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldlineReading {
    pub id: RecordId,
    pub divergence: f64,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SyncRecord for WorldlineReading {
    const ENTITY: &'static str = "reading";

    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn display_name(&self) -> String {
        format!("{:.6}", self.divergence)
    }
}
