//! Store model - the backend's view of one provisioned store.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A provisioned store as reported by the backend.
///
/// Every field tolerates absence: stores that are still provisioning are
/// listed before their URLs exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    /// Unique identifier, stable for the store's lifetime
    #[serde(default)]
    pub store_id: String,

    /// Provisioning namespace
    #[serde(default)]
    pub namespace: String,

    /// Raw lifecycle status (Provisioning, Ready, Failed, Deleting, ...)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,

    /// NodePort URL, or a placeholder until the store is ready
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nodeport_url: String,

    /// Ingress URL, or a placeholder until the store is ready
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ingress_url: String,

    /// Creation time as emitted by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Recent cluster events for the store namespace, newline separated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<String>,
}

impl Store {
    /// Parse `created_at`.
    ///
    /// The backend writes naive UTC timestamps (`2024-05-01T12:00:00.123456`);
    /// RFC 3339 values are accepted too.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    /// Event lines, skipping blanks
    pub fn event_lines(&self) -> impl Iterator<Item = &str> {
        self.events
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `GET /stores`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreList {
    #[serde(default)]
    pub stores: Vec<Store>,

    #[serde(default)]
    pub total_stores: Option<usize>,
}

/// Acknowledgement body of `POST /stores` and `DELETE /stores/{id}`.
///
/// Both fields are optional: the client treats any received response as
/// an acknowledgement and only reads these when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ActionAck {
    #[serde(default)]
    pub store_id: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}
