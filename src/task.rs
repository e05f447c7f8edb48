//! Task data structure.
//!
//! A task is stored on disk as a camelCase JSON object with ISO-8601
//! timestamps, e.g.
//!
//! ```json
//! {
//!   "id": 1,
//!   "description": "buy milk",
//!   "status": "todo",
//!   "createdAt": "2024-05-01T09:30:00.123Z",
//!   "updatedAt": "2024-05-01T09:30:00.123Z"
//! }
//! ```

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::Status;

/// A single tracked to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a `todo` task with both timestamps set to now.
    pub fn new(id: u64, description: impl Into<String>) -> Self {
        let now = now();
        Task {
            id,
            description: description.into(),
            status: Status::Todo,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

/// `id. description [status]`
impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} [{}]", self.id, self.description, self.status)
    }
}

/// Current time at the precision the file format stores.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Millisecond RFC 3339 on write; any RFC 3339 precision on read.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(d)
    }
}
