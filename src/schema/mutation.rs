//! Mutations. Each resolver maps its arguments onto its own entity's repository.
//!
//! Update arguments other than `id` may be omitted; omitted fields keep their stored
//! value. For `description` and `level`, an explicit `null` clears the field.

use super::types::{CourseType, StudentType};
use crate::error::AppError;
use crate::model::{parse_reference, parse_target, CoursePatch, NewCourse, NewStudent, StudentPatch};
use crate::service::{CourseRepository, StudentRepository};
use async_graphql::{Context, MaybeUndefined, Object, ResultExt, ID};
use uuid::Uuid;

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_course(
        &self,
        ctx: &Context<'_>,
        name: String,
        description: Option<String>,
        level: Option<String>,
    ) -> async_graphql::Result<CourseType> {
        let course = ctx
            .data::<CourseRepository>()?
            .create(NewCourse {
                name,
                description,
                level,
            })
            .await
            .extend()?;
        Ok(course.into())
    }

    async fn update_course(
        &self,
        ctx: &Context<'_>,
        id: ID,
        name: Option<String>,
        description: MaybeUndefined<String>,
        level: MaybeUndefined<String>,
    ) -> async_graphql::Result<CourseType> {
        let id = parse_target("course", &id).extend()?;
        let patch = CoursePatch {
            name,
            description: double_option(description),
            level: double_option(level),
        };
        let course = ctx.data::<CourseRepository>()?.update_by_id(id, patch).await.extend()?;
        Ok(course.into())
    }

    /// Deletes the course and removes it from every student's `courses`.
    async fn delete_course(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<CourseType> {
        let id = parse_target("course", &id).extend()?;
        let course = ctx.data::<CourseRepository>()?.delete_by_id(id).await.extend()?;
        Ok(course.into())
    }

    async fn create_student(
        &self,
        ctx: &Context<'_>,
        first_name: String,
        last_name: String,
        active: bool,
        courses_ids: Vec<Option<String>>,
    ) -> async_graphql::Result<StudentType> {
        let courses = reference_ids(courses_ids).extend()?;
        let student = ctx
            .data::<StudentRepository>()?
            .create(NewStudent {
                first_name,
                last_name,
                active,
                courses,
            })
            .await
            .extend()?;
        Ok(student.into())
    }

    async fn update_student(
        &self,
        ctx: &Context<'_>,
        id: ID,
        first_name: Option<String>,
        last_name: Option<String>,
        active: Option<bool>,
        courses_ids: Option<Vec<Option<ID>>>,
    ) -> async_graphql::Result<StudentType> {
        let id = parse_target("student", &id).extend()?;
        let students = ctx.data::<StudentRepository>()?;
        let courses = match courses_ids {
            Some(ids) => {
                // An unknown student is NotFound even when the course ids are malformed.
                students.find_by_id(id).await.extend()?;
                Some(reference_ids(ids.into_iter().map(|id| id.map(|id| id.0)).collect()).extend()?)
            }
            None => None,
        };
        let patch = StudentPatch {
            first_name,
            last_name,
            active,
            courses,
        };
        let student = students.update_by_id(id, patch).await.extend()?;
        Ok(student.into())
    }

    async fn delete_student(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<StudentType> {
        let id = parse_target("student", &id).extend()?;
        let student = ctx.data::<StudentRepository>()?.delete_by_id(id).await.extend()?;
        Ok(student.into())
    }
}

fn double_option<T>(v: MaybeUndefined<T>) -> Option<Option<T>> {
    match v {
        MaybeUndefined::Undefined => None,
        MaybeUndefined::Null => Some(None),
        MaybeUndefined::Value(v) => Some(Some(v)),
    }
}

fn reference_ids(raw: Vec<Option<String>>) -> Result<Vec<Uuid>, AppError> {
    raw.into_iter()
        .map(|id| match id {
            Some(id) => parse_reference("coursesIds", &id),
            None => Err(AppError::Validation("coursesIds must not contain null".into())),
        })
        .collect()
}
