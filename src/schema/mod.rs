//! GraphQL schema: `allCourses`/`allStudents` queries and create/update/delete mutations per entity.

mod mutation;
mod query;
mod types;

pub use mutation::MutationRoot;
pub use query::QueryRoot;
pub use types::{CourseType, StudentType};

use crate::service::{CourseRepository, StudentRepository};
use crate::store::DocumentStore;
use async_graphql::{EmptySubscription, Schema};
use std::sync::Arc;

pub type GatewaySchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema with repositories over `store` injected as context data.
pub fn build_schema(store: Arc<dyn DocumentStore>) -> GatewaySchema {
    let courses = CourseRepository::new(store.clone());
    let students = StudentRepository::new(store, courses.clone());
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(courses)
        .data(students)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::{json, Value};

    fn schema() -> GatewaySchema {
        build_schema(Arc::new(MemoryStore::new()))
    }

    async fn run(schema: &GatewaySchema, query: &str) -> (Value, Vec<String>) {
        let resp = schema.execute(query).await;
        let codes = resp
            .errors
            .iter()
            .filter_map(|e| e.extensions.as_ref())
            .filter_map(|ext| match ext.get("code") {
                Some(async_graphql::Value::String(code)) => Some(code.clone()),
                _ => None,
            })
            .collect();
        (resp.data.into_json().unwrap(), codes)
    }

    async fn create_course(schema: &GatewaySchema, name: &str) -> String {
        let (data, codes) = run(schema, &format!(r#"mutation {{ createCourse(name: "{}") {{ id }} }}"#, name)).await;
        assert!(codes.is_empty(), "{:?}", codes);
        data["createCourse"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn create_course_then_list() {
        let schema = schema();
        let (created, codes) = run(
            &schema,
            r#"mutation { createCourse(name: "Algorithms", level: "intro") { id name description level } }"#,
        )
        .await;
        assert!(codes.is_empty());
        let course = &created["createCourse"];
        assert!(course["id"].as_str().is_some());
        assert_eq!(course["name"], "Algorithms");
        assert_eq!(course["description"], Value::Null);
        assert_eq!(course["level"], "intro");

        let (listed, _) = run(&schema, "{ allCourses { id name description level } }").await;
        assert_eq!(listed["allCourses"], json!([course]));
    }

    #[tokio::test]
    async fn text_fields_are_stored_as_given() {
        let schema = schema();
        let (created, codes) = run(
            &schema,
            r#"mutation { createCourse(name: " Algorithms ", description: "", level: "intro ") { id name description level } }"#,
        )
        .await;
        assert!(codes.is_empty(), "{:?}", codes);
        let course = &created["createCourse"];
        assert_eq!(course["name"], " Algorithms ");
        assert_eq!(course["description"], "");
        assert_eq!(course["level"], "intro ");

        let (updated, codes) = run(
            &schema,
            &format!(
                r#"mutation {{ updateCourse(id: "{}", level: "") {{ name description level }} }}"#,
                course["id"].as_str().unwrap()
            ),
        )
        .await;
        assert!(codes.is_empty(), "{:?}", codes);
        assert_eq!(updated["updateCourse"], json!({ "name": " Algorithms ", "description": "", "level": "" }));

        let (student, codes) = run(
            &schema,
            r#"mutation { createStudent(firstName: "Ada ", lastName: " Lovelace", active: true, coursesIds: []) { firstName lastName } }"#,
        )
        .await;
        assert!(codes.is_empty(), "{:?}", codes);
        assert_eq!(student["createStudent"], json!({ "firstName": "Ada ", "lastName": " Lovelace" }));
    }

    #[tokio::test]
    async fn student_courses_resolve_to_course_objects() {
        let schema = schema();
        let (a, _) = run(
            &schema,
            r#"mutation { createCourse(name: "Algorithms", level: "intro") { id name description level } }"#,
        )
        .await;
        let (b, _) = run(
            &schema,
            r#"mutation { createCourse(name: "Compilers", description: "Front to back") { id name description level } }"#,
        )
        .await;
        let (a, b) = (&a["createCourse"], &b["createCourse"]);
        let (_, codes) = run(
            &schema,
            &format!(
                r#"mutation {{ createStudent(firstName: "Ada", lastName: "Lovelace", active: true, coursesIds: ["{}", "{}"]) {{ id }} }}"#,
                a["id"].as_str().unwrap(),
                b["id"].as_str().unwrap()
            ),
        )
        .await;
        assert!(codes.is_empty(), "{:?}", codes);

        let (listed, _) = run(&schema, "{ allStudents { firstName lastName active courses { id name description level } } }").await;
        assert_eq!(
            listed["allStudents"],
            json!([{ "firstName": "Ada", "lastName": "Lovelace", "active": true, "courses": [a, b] }])
        );
    }

    #[tokio::test]
    async fn update_student_active_only() {
        let schema = schema();
        let course = create_course(&schema, "Algorithms").await;
        let (created, _) = run(
            &schema,
            &format!(
                r#"mutation {{ createStudent(firstName: "Ada", lastName: "Lovelace", active: true, coursesIds: ["{}"]) {{ id }} }}"#,
                course
            ),
        )
        .await;
        let id = created["createStudent"]["id"].as_str().unwrap();
        let (updated, codes) = run(
            &schema,
            &format!(
                r#"mutation {{ updateStudent(id: "{}", active: false) {{ firstName lastName active courses {{ id }} }} }}"#,
                id
            ),
        )
        .await;
        assert!(codes.is_empty(), "{:?}", codes);
        assert_eq!(
            updated["updateStudent"],
            json!({ "firstName": "Ada", "lastName": "Lovelace", "active": false, "courses": [{ "id": course }] })
        );
    }

    #[tokio::test]
    async fn deleting_course_prunes_student_enrolment() {
        let schema = schema();
        let course = create_course(&schema, "Algorithms").await;
        run(
            &schema,
            &format!(
                r#"mutation {{ createStudent(firstName: "Ada", lastName: "Lovelace", active: true, coursesIds: ["{}"]) {{ id }} }}"#,
                course
            ),
        )
        .await;
        let (deleted, codes) = run(&schema, &format!(r#"mutation {{ deleteCourse(id: "{}") {{ id name }} }}"#, course)).await;
        assert!(codes.is_empty());
        assert_eq!(deleted["deleteCourse"], json!({ "id": course, "name": "Algorithms" }));

        let (listed, _) = run(&schema, "{ allStudents { firstName courses { id } } }").await;
        assert_eq!(listed["allStudents"], json!([{ "firstName": "Ada", "courses": [] }]));
    }

    #[tokio::test]
    async fn missing_ids_report_not_found_with_null_data() {
        let schema = schema();
        let ghost = uuid::Uuid::new_v4();
        for mutation in [
            format!(r#"mutation {{ updateCourse(id: "{}", name: "x") {{ id }} }}"#, ghost),
            format!(r#"mutation {{ deleteCourse(id: "{}") {{ id }} }}"#, ghost),
            format!(r#"mutation {{ updateStudent(id: "{}", active: true) {{ id }} }}"#, ghost),
            format!(r#"mutation {{ deleteStudent(id: "{}") {{ id }} }}"#, ghost),
            r#"mutation { deleteStudent(id: "not-an-id") { id } }"#.to_string(),
            format!(r#"mutation {{ updateCourse(id: "{}", name: "") {{ id }} }}"#, ghost),
            format!(r#"mutation {{ updateStudent(id: "{}", firstName: " ") {{ id }} }}"#, ghost),
            format!(
                r#"mutation {{ updateStudent(id: "{}", coursesIds: ["{}"]) {{ id }} }}"#,
                ghost,
                uuid::Uuid::new_v4()
            ),
            format!(r#"mutation {{ updateStudent(id: "{}", coursesIds: ["bogus"]) {{ id }} }}"#, ghost),
        ] {
            let (data, codes) = run(&schema, &mutation).await;
            assert_eq!(data, Value::Null, "{}", mutation);
            assert_eq!(codes, vec!["NOT_FOUND".to_string()], "{}", mutation);
        }
        let (listed, _) = run(&schema, "{ allCourses { id } allStudents { id } }").await;
        assert_eq!(listed, json!({ "allCourses": [], "allStudents": [] }));
    }

    #[tokio::test]
    async fn invalid_inputs_map_to_error_codes() {
        let schema = schema();
        let (_, codes) = run(&schema, r#"mutation { createCourse(name: "") { id } }"#).await;
        assert_eq!(codes, vec!["VALIDATION_ERROR".to_string()]);

        let (_, codes) = run(
            &schema,
            r#"mutation { createStudent(firstName: "Ada", lastName: "Lovelace", active: true, coursesIds: ["bogus"]) { id } }"#,
        )
        .await;
        assert_eq!(codes, vec!["VALIDATION_ERROR".to_string()]);

        let (_, codes) = run(
            &schema,
            &format!(
                r#"mutation {{ createStudent(firstName: "Ada", lastName: "Lovelace", active: true, coursesIds: ["{}"]) {{ id }} }}"#,
                uuid::Uuid::new_v4()
            ),
        )
        .await;
        assert_eq!(codes, vec!["REFERENCE_ERROR".to_string()]);

        let (listed, _) = run(&schema, "{ allCourses { id } allStudents { id } }").await;
        assert_eq!(listed, json!({ "allCourses": [], "allStudents": [] }));
    }

    #[tokio::test]
    async fn update_course_clears_with_explicit_null() {
        let schema = schema();
        let (created, _) = run(
            &schema,
            r#"mutation { createCourse(name: "Algorithms", description: "Sorting", level: "intro") { id } }"#,
        )
        .await;
        let id = created["createCourse"]["id"].as_str().unwrap();
        let (updated, codes) = run(
            &schema,
            &format!(r#"mutation {{ updateCourse(id: "{}", description: null) {{ name description level }} }}"#, id),
        )
        .await;
        assert!(codes.is_empty());
        assert_eq!(
            updated["updateCourse"],
            json!({ "name": "Algorithms", "description": null, "level": "intro" })
        );
    }

    #[tokio::test]
    async fn store_outage_surfaces_as_error() {
        let store = Arc::new(MemoryStore::new());
        let schema = build_schema(store.clone());
        store.set_offline(true);
        let (data, codes) = run(&schema, "{ allCourses { id } }").await;
        assert_eq!(data, Value::Null);
        assert_eq!(codes, vec!["STORE_UNAVAILABLE".to_string()]);
    }
}
