//! Store keys and versioned record encoding.
//!
//! Every record is stored as a JSON object with a `schema_version` field next
//! to the record's own fields. Decoding checks the version before handing the
//! remaining fields to serde, so an old or foreign value surfaces as
//! [`LedgerError::Schema`] instead of a half-typed record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use studymate_core::ReminderId;

use crate::error::{LedgerError, Result};

/// Version written into every record.
pub const SCHEMA_VERSION: u64 = 1;

/// Field carrying the version.
pub const VERSION_FIELD: &str = "schema_version";

/// Prefix of roadmap ledger keys.
pub const PROGRESS_PREFIX: &str = "progress:";

/// Prefix of reminder record keys.
pub const REMINDER_PREFIX: &str = "reminder:";

/// Prefix of quiz result keys.
pub const QUIZ_RESULTS_PREFIX: &str = "quiz_results:";

/// Key of the global reminder index.
pub const REMINDER_INDEX_KEY: &str = "all_reminders";

/// Key of a roadmap's progress ledger.
pub fn progress_key(roadmap_id: &str) -> String {
    format!("{}{}", PROGRESS_PREFIX, roadmap_id)
}

/// Key of a reminder record.
pub fn reminder_key(id: &ReminderId) -> String {
    format!("{}{}", REMINDER_PREFIX, id)
}

/// Key of a quiz result.
pub fn quiz_results_key(quiz_id: &str) -> String {
    format!("{}{}", QUIZ_RESULTS_PREFIX, quiz_id)
}

/// Ordered list of every scheduled reminder id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderIndex {
    /// Reminder ids in scheduling order
    pub reminder_ids: Vec<ReminderId>,
}

/// Serialize `record` with the current schema version.
pub fn encode<T: Serialize>(key: &str, record: &T) -> Result<String> {
    let value = serde_json::to_value(record)
        .map_err(|e| LedgerError::schema(key, format!("cannot serialize record: {}", e)))?;
    let Value::Object(mut fields) = value else {
        return Err(LedgerError::schema(key, "record must serialize to a JSON object"));
    };
    fields.insert(VERSION_FIELD.to_string(), Value::from(SCHEMA_VERSION));
    serde_json::to_string(&Value::Object(fields))
        .map_err(|e| LedgerError::schema(key, format!("cannot serialize record: {}", e)))
}

/// Parse a versioned record read from `key`.
pub fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| LedgerError::schema(key, format!("invalid JSON: {}", e)))?;
    let Value::Object(mut fields) = value else {
        return Err(LedgerError::schema(key, "expected a JSON object"));
    };

    match fields.remove(VERSION_FIELD) {
        None => return Err(LedgerError::schema(key, "missing schema_version")),
        Some(v) if v.as_u64() == Some(SCHEMA_VERSION) => {}
        Some(v) => {
            return Err(LedgerError::schema(key, format!("unsupported schema_version {}", v)));
        }
    }

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| LedgerError::schema(key, format!("unexpected record shape: {}", e)))
}
