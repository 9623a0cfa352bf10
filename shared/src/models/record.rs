//! Keyed documents held by the record store

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::keys::KeyParts;

/// One stored document per composite key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub key: String,
    pub date: NaiveDate,
    pub branch: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub payload: serde_json::Value,
    /// Set on first save and never changed afterwards
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn parts(&self) -> KeyParts {
        KeyParts::new(
            self.date,
            &self.branch,
            &self.department,
            self.group.as_deref(),
        )
    }

    /// Decode the payload into a typed document
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}
