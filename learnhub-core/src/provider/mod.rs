use crate::{
    CoreError, Course, CoursePage, CourseQuery, EnrollAck, EnrollmentCheck, EnrollmentRecord,
    ProgressUpdate,
};
use async_trait::async_trait;

pub mod memory;

pub use memory::MemoryProvider;

/// The course/enrollment backend a session talks to. Calls are scoped to the
/// session's (implicit) user.
#[async_trait]
pub trait CourseProvider: Send + Sync {
    // Catalog
    async fn get_courses(&self, query: &CourseQuery) -> Result<CoursePage, CoreError>;
    async fn get_course(&self, id: &str) -> Result<Course, CoreError>;

    // Enrollment
    async fn enroll_course(&self, id: &str) -> Result<EnrollAck, CoreError>;
    async fn get_enrolled_courses(&self) -> Result<Vec<EnrollmentRecord>, CoreError>;
    async fn check_enrollment(&self, id: &str) -> Result<EnrollmentCheck, CoreError>;
    async fn update_progress(
        &self,
        id: &str,
        data: &ProgressUpdate,
    ) -> Result<EnrollmentRecord, CoreError>;
}
