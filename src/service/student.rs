//! Student persistence. Course references are checked against the course collection on every write.

use super::course::CourseRepository;
use super::validation::{dedup_ids, required_text};
use crate::error::AppError;
use crate::model::{NewStudent, Student, StudentPatch};
use crate::store::{encode, Collection, DocumentStore};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct StudentRepository {
    store: Arc<dyn DocumentStore>,
    courses: CourseRepository,
}

impl StudentRepository {
    pub fn new(store: Arc<dyn DocumentStore>, courses: CourseRepository) -> Self {
        StudentRepository { store, courses }
    }

    pub async fn find_all(&self) -> Result<Vec<Student>, AppError> {
        let docs = self.store.find_all(Collection::Students).await?;
        Ok(docs
            .iter()
            .filter_map(|doc| match doc.decode::<Student>() {
                Ok(student) => Some(student),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable student");
                    None
                }
            })
            .collect())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Student, AppError> {
        self.store
            .find_by_id(Collection::Students, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student '{}'", id)))?
            .decode()
    }

    pub async fn create(&self, input: NewStudent) -> Result<Student, AppError> {
        let input = NewStudent {
            first_name: required_text("firstName", input.first_name)?,
            last_name: required_text("lastName", input.last_name)?,
            active: input.active,
            courses: self.checked_courses(input.courses).await?,
        };
        let doc = self.store.insert(Collection::Students, encode(&input)?).await?;
        let student: Student = doc.decode()?;
        tracing::info!(id = %student.id, courses = student.courses.len(), "student created");
        Ok(student)
    }

    /// Replace only the supplied fields. An unknown id is `NotFound` before fields or course
    /// references are checked, and nothing is written unless every check passes.
    pub async fn update_by_id(&self, id: Uuid, patch: StudentPatch) -> Result<Student, AppError> {
        let current = self
            .store
            .find_by_id(Collection::Students, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student '{}'", id)))?;
        let courses = match patch.courses {
            Some(ids) => Some(self.checked_courses(ids).await?),
            None => None,
        };
        let patch = StudentPatch {
            first_name: patch.first_name.map(|v| required_text("firstName", v)).transpose()?,
            last_name: patch.last_name.map(|v| required_text("lastName", v)).transpose()?,
            active: patch.active,
            courses,
        };
        if patch.is_empty() {
            return current.decode();
        }
        let doc = self
            .store
            .update(Collection::Students, id, patch.into_fields())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student '{}'", id)))?;
        tracing::info!(%id, "student updated");
        doc.decode()
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<Student, AppError> {
        let doc = self
            .store
            .delete(Collection::Students, id, None)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student '{}'", id)))?;
        tracing::info!(%id, "student deleted");
        doc.decode()
    }

    /// Dedup and require every id to name an existing course.
    async fn checked_courses(&self, ids: Vec<Uuid>) -> Result<Vec<Uuid>, AppError> {
        let ids = dedup_ids(ids);
        let missing = self.courses.missing(&ids).await?;
        if !missing.is_empty() {
            let missing: Vec<String> = missing.iter().map(Uuid::to_string).collect();
            return Err(AppError::Reference(format!("unknown course ids: {}", missing.join(", "))));
        }
        Ok(ids)
    }
}
