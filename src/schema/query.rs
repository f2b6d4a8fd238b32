use super::types::{CourseType, StudentType};
use crate::service::{CourseRepository, StudentRepository};
use async_graphql::{Context, Object, ResultExt};

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every course, in creation order.
    async fn all_courses(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<CourseType>> {
        let courses = ctx.data::<CourseRepository>()?.find_all().await.extend()?;
        Ok(courses.into_iter().map(CourseType::from).collect())
    }

    /// Every student, in creation order.
    async fn all_students(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<StudentType>> {
        let students = ctx.data::<StudentRepository>()?.find_all().await.extend()?;
        Ok(students.into_iter().map(StudentType::from).collect())
    }
}
