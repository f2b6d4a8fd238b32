use crate::model::{Course, Student};
use crate::service::CourseRepository;
use async_graphql::{ComplexObject, Context, ResultExt, SimpleObject, ID};
use uuid::Uuid;

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "CourseType")]
pub struct CourseType {
    pub id: ID,
    pub name: String,
    pub description: Option<String>,
    pub level: Option<String>,
}

impl From<Course> for CourseType {
    fn from(c: Course) -> Self {
        CourseType {
            id: ID(c.id.to_string()),
            name: c.name,
            description: c.description,
            level: c.level,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "StudentType", complex)]
pub struct StudentType {
    pub id: ID,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
    #[graphql(skip)]
    pub course_ids: Vec<Uuid>,
}

impl From<Student> for StudentType {
    fn from(s: Student) -> Self {
        StudentType {
            id: ID(s.id.to_string()),
            first_name: s.first_name,
            last_name: s.last_name,
            active: s.active,
            course_ids: s.courses,
        }
    }
}

#[ComplexObject]
impl StudentType {
    /// Enrolled courses in enrolment order. Ids that no longer resolve are omitted.
    async fn courses(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<CourseType>> {
        let courses = ctx
            .data::<CourseRepository>()?
            .find_by_ids(&self.course_ids)
            .await
            .extend()?;
        Ok(courses.into_iter().map(CourseType::from).collect())
    }
}
