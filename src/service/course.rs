//! Course persistence: typed CRUD over the `courses` collection.

use super::validation::required_text;
use crate::error::AppError;
use crate::model::{Course, CoursePatch, NewCourse};
use crate::store::{encode, Cascade, Collection, DocumentStore};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Deleting a course pulls its id out of every student's `courses`.
const STUDENT_ENROLMENTS: Cascade = Cascade {
    collection: Collection::Students,
    field: "courses",
};

#[derive(Clone)]
pub struct CourseRepository {
    store: Arc<dyn DocumentStore>,
}

impl CourseRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        CourseRepository { store }
    }

    /// Every stored course. Documents that fail to decode are logged and skipped.
    pub async fn find_all(&self) -> Result<Vec<Course>, AppError> {
        let docs = self.store.find_all(Collection::Courses).await?;
        Ok(docs
            .iter()
            .filter_map(|doc| match doc.decode::<Course>() {
                Ok(course) => Some(course),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable course");
                    None
                }
            })
            .collect())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Course, AppError> {
        self.store
            .find_by_id(Collection::Courses, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("course '{}'", id)))?
            .decode()
    }

    /// Courses for `ids`, in the order given. Ids that do not resolve are omitted.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Course>, AppError> {
        let docs = self.store.find_by_ids(Collection::Courses, ids).await?;
        let mut by_id: HashMap<Uuid, Course> = HashMap::with_capacity(docs.len());
        for doc in &docs {
            match doc.decode::<Course>() {
                Ok(course) => {
                    by_id.insert(course.id, course);
                }
                Err(e) => tracing::warn!(error = %e, "skipping undecodable course"),
            }
        }
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Ids from `ids` that name no stored course.
    pub async fn missing(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        let docs = self.store.find_by_ids(Collection::Courses, ids).await?;
        Ok(ids
            .iter()
            .filter(|id| !docs.iter().any(|d| d.id == **id))
            .copied()
            .collect())
    }

    pub async fn create(&self, input: NewCourse) -> Result<Course, AppError> {
        let input = NewCourse {
            name: required_text("name", input.name)?,
            description: input.description,
            level: input.level,
        };
        let doc = self.store.insert(Collection::Courses, encode(&input)?).await?;
        let course: Course = doc.decode()?;
        tracing::info!(id = %course.id, name = %course.name, "course created");
        Ok(course)
    }

    /// Replace only the supplied fields. An unknown id is `NotFound` before any field is checked.
    /// An empty patch returns the stored course unchanged.
    pub async fn update_by_id(&self, id: Uuid, patch: CoursePatch) -> Result<Course, AppError> {
        let current = self
            .store
            .find_by_id(Collection::Courses, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("course '{}'", id)))?;
        let patch = CoursePatch {
            name: patch.name.map(|n| required_text("name", n)).transpose()?,
            ..patch
        };
        if patch.is_empty() {
            return current.decode();
        }
        let doc = self
            .store
            .update(Collection::Courses, id, patch.into_fields())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("course '{}'", id)))?;
        tracing::info!(%id, "course updated");
        doc.decode()
    }

    /// Remove a course and prune it from every student that references it.
    pub async fn delete_by_id(&self, id: Uuid) -> Result<Course, AppError> {
        let doc = self
            .store
            .delete(Collection::Courses, id, Some(STUDENT_ENROLMENTS))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("course '{}'", id)))?;
        tracing::info!(%id, "course deleted");
        doc.decode()
    }
}
