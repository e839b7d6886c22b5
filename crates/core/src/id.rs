//! Unique identifiers for StudyMate entities.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use ulid::{Generator, Ulid};

/// Unique identifier for a Reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReminderId(Ulid);

impl ReminderId {
    /// Generate a new ReminderId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReminderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ReminderId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Monotonic reminder id source.
///
/// Ids created within the same millisecond still compare strictly greater
/// than the previous one, so two reminders scheduled back to back never share
/// an id.
pub struct ReminderIdGenerator {
    inner: Mutex<Generator>,
}

impl Default for ReminderIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReminderIdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderIdGenerator").finish_non_exhaustive()
    }
}

impl ReminderIdGenerator {
    /// Create a new generator.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Generator::new()),
        }
    }

    /// Produce the next id.
    pub fn next_id(&self) -> ReminderId {
        let mut generator = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Overflow of the random part within one millisecond falls back to a
        // fresh random ULID.
        let ulid = generator.generate().unwrap_or_else(|_| Ulid::new());
        ReminderId(ulid)
    }
}
