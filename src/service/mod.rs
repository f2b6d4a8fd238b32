//! Typed persistence access per entity, layered on a `DocumentStore`.

mod course;
mod student;
mod validation;
pub use course::CourseRepository;
pub use student::StudentRepository;
