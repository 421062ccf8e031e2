use crate::{
    curriculum, derived_view, paginate, CoreError, Course, CoursePage, CourseQuery, CourseRef,
    EnrollAck, Enrollment, EnrollmentCheck, EnrollmentRecord, IdValue, ProgressUpdate,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

/// Mock database used when no real database is configured.
#[derive(Default)]
pub struct MemoryProvider {
    courses: RwLock<Vec<Course>>,
    enrollments: RwLock<Vec<Enrollment>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated with the built-in curriculum.
    pub fn seeded() -> Self {
        Self::with_courses(curriculum::seed_courses())
    }

    pub fn with_courses(courses: Vec<Course>) -> Self {
        Self {
            courses: RwLock::new(courses),
            enrollments: RwLock::new(Vec::new()),
        }
    }

    fn embedded(&self, e: &Enrollment) -> EnrollmentRecord {
        let title = self
            .courses
            .read()
            .iter()
            .find(|c| c.id == e.course_id)
            .map(|c| c.title.clone());
        let mut rec = EnrollmentRecord::from(e);
        rec.course_id = CourseRef::Embedded {
            id: IdValue::Text(e.course_id.clone()),
            title,
        };
        rec
    }
}

#[async_trait]
impl crate::provider::CourseProvider for MemoryProvider {
    async fn get_courses(&self, query: &CourseQuery) -> Result<CoursePage, CoreError> {
        let view = derived_view(&self.courses.read(), &query.to_criteria());
        Ok(paginate(view, query.page, query.limit))
    }

    async fn get_course(&self, id: &str) -> Result<Course, CoreError> {
        self.courses
            .read()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(CoreError::NotFound("course"))
    }

    async fn enroll_course(&self, id: &str) -> Result<EnrollAck, CoreError> {
        let mut courses = self.courses.write();
        let Some(course) = courses.iter_mut().find(|c| c.id == id) else {
            return Err(CoreError::NotFound("course"));
        };
        let mut enrollments = self.enrollments.write();
        if let Some(existing) = enrollments.iter().find(|e| e.course_id == id) {
            return Ok(EnrollAck {
                message: "Already enrolled in this course".to_string(),
                course: Some(course.clone()),
                enrollment: Some(EnrollmentRecord::from(existing)),
            });
        }
        let enrollment = Enrollment::new(id, Utc::now());
        course.enrolled_count = Some(course.enrolled_count.unwrap_or(0) + 1);
        let ack = EnrollAck {
            message: "Successfully enrolled in course".to_string(),
            course: Some(course.clone()),
            enrollment: Some(EnrollmentRecord::from(&enrollment)),
        };
        enrollments.push(enrollment);
        Ok(ack)
    }

    async fn get_enrolled_courses(&self) -> Result<Vec<EnrollmentRecord>, CoreError> {
        let enrollments = self.enrollments.read().clone();
        Ok(enrollments.iter().map(|e| self.embedded(e)).collect())
    }

    async fn check_enrollment(&self, id: &str) -> Result<EnrollmentCheck, CoreError> {
        let found = self
            .enrollments
            .read()
            .iter()
            .find(|e| e.course_id == id)
            .cloned();
        Ok(EnrollmentCheck {
            is_enrolled: found.is_some(),
            enrollment: found.as_ref().map(EnrollmentRecord::from),
        })
    }

    async fn update_progress(
        &self,
        id: &str,
        data: &ProgressUpdate,
    ) -> Result<EnrollmentRecord, CoreError> {
        let mut m = self.enrollments.write();
        let Some(e) = m.iter_mut().find(|e| e.course_id == id) else {
            return Err(CoreError::NotFound("enrollment"));
        };
        *e = e.merged(data, Utc::now())?;
        Ok(EnrollmentRecord::from(&*e))
    }
}
