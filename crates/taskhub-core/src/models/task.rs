use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::ids::EntityId;

/// Task lifecycle state. Travels as the integers 1 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[repr(i16)]
pub enum TaskStatus {
    Open = 1,
    InProgress = 2,
    Done = 3,
    Archived = 4,
}

impl TaskStatus {
    /// Accepted wire values, in string form.
    pub const WIRE_VALUES: &'static [&'static str] = &["1", "2", "3", "4"];

    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(TaskStatus::Open),
            2 => Some(TaskStatus::InProgress),
            3 => Some(TaskStatus::Done),
            4 => Some(TaskStatus::Archived),
            _ => None,
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.code())
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.code())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Int(code) => code,
            NumberOrString::Float(_) => {
                return Err(serde::de::Error::custom("task status must be an integer"))
            }
            NumberOrString::Str(raw) => raw
                .parse::<i64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid task status {raw:?}")))?,
        };
        TaskStatus::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid task status {code}")))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Serde helpers for values that may arrive as JSON numbers or numeric
/// strings (query strings, form-style clients).
pub mod de {
    use super::NumberOrString;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};

    pub fn flexible_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Int(value) => Ok(value as f64),
            NumberOrString::Float(value) => Ok(value),
            NumberOrString::Str(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid number {raw:?}"))),
        }
    }

    pub fn flexible_f64_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        flexible_f64(deserializer).map(Some)
    }

    pub fn flexible_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::validation::parse_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date {raw:?}")))
    }

    pub fn flexible_date_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        flexible_date(deserializer).map(Some)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Task {
    pub id: EntityId,
    pub project_id: EntityId,
    pub title: String,
    pub content: String,
    pub status: TaskStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Estimated effort in hours.
    pub estimate_time: f64,
    #[serde(rename = "asignee")]
    pub assignee: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: EntityId,
    pub title: String,
    pub content: String,
    pub status: TaskStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub estimate_time: f64,
    pub assignee: EntityId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "de::flexible_date_opt")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::flexible_date_opt")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::flexible_f64_opt")]
    pub estimate_time: Option<f64>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.estimate_time.is_none()
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(content) = &self.content {
            task.content = content.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(start_date) = self.start_date {
            task.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            task.end_date = end_date;
        }
        if let Some(estimate_time) = self.estimate_time {
            task.estimate_time = estimate_time;
        }
    }
}

/// Which tasks of a project to list.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskFilter {
    All,
    Assignee(EntityId),
    Status(TaskStatus),
    /// Case-insensitive substring match on the title.
    Title(String),
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Assignee(member) => task.assignee == *member,
            TaskFilter::Status(status) => task.status == *status,
            TaskFilter::Title(needle) => task
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}
