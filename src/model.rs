//! Course and Student records, their create inputs and partial-update patches.
//!
//! Records serialize to the stored document shape (camelCase keys, `courses`
//! as an array of id strings). The `id` lives beside the payload in the store.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
    #[serde(default)]
    pub courses: Vec<Uuid>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewCourse {
    pub name: String,
    pub description: Option<String>,
    pub level: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
    pub courses: Vec<Uuid>,
}

/// Fields to replace on a Course. `None` leaves the stored value alone;
/// `Some(None)` clears an optional field.
#[derive(Clone, Debug, Default)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub level: Option<Option<String>>,
}

#[derive(Clone, Debug, Default)]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub active: Option<bool>,
    pub courses: Option<Vec<Uuid>>,
}

impl CoursePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.level.is_none()
    }

    /// Top-level document fields to merge into the stored payload.
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(name) = self.name {
            fields.insert("name".into(), Value::String(name));
        }
        if let Some(description) = self.description {
            fields.insert("description".into(), optional_string(description));
        }
        if let Some(level) = self.level {
            fields.insert("level".into(), optional_string(level));
        }
        fields
    }
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.active.is_none() && self.courses.is_none()
    }

    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(first_name) = self.first_name {
            fields.insert("firstName".into(), Value::String(first_name));
        }
        if let Some(last_name) = self.last_name {
            fields.insert("lastName".into(), Value::String(last_name));
        }
        if let Some(active) = self.active {
            fields.insert("active".into(), Value::Bool(active));
        }
        if let Some(courses) = self.courses {
            fields.insert(
                "courses".into(),
                Value::Array(courses.iter().map(|id| Value::String(id.to_string())).collect()),
            );
        }
        fields
    }
}

fn optional_string(v: Option<String>) -> Value {
    v.map(Value::String).unwrap_or(Value::Null)
}

/// Parse a reference id (e.g. an entry of `coursesIds`). Malformed ids are a validation failure.
pub fn parse_reference(field: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("{} contains invalid id '{}'", field, raw)))
}

/// Parse the id naming the record an operation targets. A malformed id cannot name any record.
pub fn parse_target(kind: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(format!("{} '{}'", kind, raw)))
}
