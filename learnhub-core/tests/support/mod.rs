#![allow(dead_code)]

use async_trait::async_trait;
use learnhub_core::{
    CoreError, Course, CoursePage, CourseProvider, CourseQuery, EnrollAck, EnrollmentCheck,
    EnrollmentRecord, MemoryProvider, PlaceholderGenerator, ProgressUpdate,
};
use std::time::Duration;

/// Every call fails as if the network were down.
pub struct DownProvider;

#[async_trait]
impl CourseProvider for DownProvider {
    async fn get_courses(&self, _: &CourseQuery) -> Result<CoursePage, CoreError> {
        Err(CoreError::unavailable("connection refused"))
    }
    async fn get_course(&self, _: &str) -> Result<Course, CoreError> {
        Err(CoreError::unavailable("connection refused"))
    }
    async fn enroll_course(&self, _: &str) -> Result<EnrollAck, CoreError> {
        Err(CoreError::unavailable("connection refused"))
    }
    async fn get_enrolled_courses(&self) -> Result<Vec<EnrollmentRecord>, CoreError> {
        Err(CoreError::unavailable("connection refused"))
    }
    async fn check_enrollment(&self, _: &str) -> Result<EnrollmentCheck, CoreError> {
        Err(CoreError::unavailable("connection refused"))
    }
    async fn update_progress(&self, _: &str, _: &ProgressUpdate) -> Result<EnrollmentRecord, CoreError> {
        Err(CoreError::unavailable("connection refused"))
    }
}

/// Serves a fixed list of courses after a per-query delay: queries whose
/// category is "slow" wait `slow` before answering.
pub struct DelayedProvider {
    pub slow: Duration,
    pub slow_courses: Vec<Course>,
    pub fast_courses: Vec<Course>,
}

#[async_trait]
impl CourseProvider for DelayedProvider {
    async fn get_courses(&self, q: &CourseQuery) -> Result<CoursePage, CoreError> {
        if q.category.as_deref() == Some("slow") {
            tokio::time::sleep(self.slow).await;
            Ok(CoursePage { courses: self.slow_courses.clone(), pagination: None })
        } else {
            Ok(CoursePage { courses: self.fast_courses.clone(), pagination: None })
        }
    }
    async fn get_course(&self, _: &str) -> Result<Course, CoreError> {
        Err(CoreError::NotFound("course"))
    }
    async fn enroll_course(&self, _: &str) -> Result<EnrollAck, CoreError> {
        Err(CoreError::NotFound("course"))
    }
    async fn get_enrolled_courses(&self) -> Result<Vec<EnrollmentRecord>, CoreError> {
        Ok(Vec::new())
    }
    async fn check_enrollment(&self, _: &str) -> Result<EnrollmentCheck, CoreError> {
        Ok(EnrollmentCheck::default())
    }
    async fn update_progress(&self, _: &str, _: &ProgressUpdate) -> Result<EnrollmentRecord, CoreError> {
        Err(CoreError::NotFound("enrollment"))
    }
}

/// Returns pre-built enrollment records exactly as given. Every course id
/// resolves to a free course.
pub struct RecordsProvider {
    pub records: Vec<EnrollmentRecord>,
}

#[async_trait]
impl CourseProvider for RecordsProvider {
    async fn get_courses(&self, _: &CourseQuery) -> Result<CoursePage, CoreError> {
        Ok(CoursePage::default())
    }
    async fn get_course(&self, id: &str) -> Result<Course, CoreError> {
        Ok(Course::new(id, format!("Course {id}")))
    }
    async fn enroll_course(&self, _: &str) -> Result<EnrollAck, CoreError> {
        Err(CoreError::NotFound("course"))
    }
    async fn get_enrolled_courses(&self) -> Result<Vec<EnrollmentRecord>, CoreError> {
        Ok(self.records.clone())
    }
    async fn check_enrollment(&self, _: &str) -> Result<EnrollmentCheck, CoreError> {
        Ok(EnrollmentCheck::default())
    }
    async fn update_progress(&self, _: &str, _: &ProgressUpdate) -> Result<EnrollmentRecord, CoreError> {
        Err(CoreError::NotFound("enrollment"))
    }
}

/// Serves at most `cap` courses per page whatever page size is asked for.
pub struct CappedProvider {
    pub inner: MemoryProvider,
    pub cap: u32,
}

#[async_trait]
impl CourseProvider for CappedProvider {
    async fn get_courses(&self, q: &CourseQuery) -> Result<CoursePage, CoreError> {
        let mut q = q.clone();
        q.limit = Some(q.limit.unwrap_or(self.cap).min(self.cap));
        self.inner.get_courses(&q).await
    }
    async fn get_course(&self, id: &str) -> Result<Course, CoreError> {
        self.inner.get_course(id).await
    }
    async fn enroll_course(&self, id: &str) -> Result<EnrollAck, CoreError> {
        self.inner.enroll_course(id).await
    }
    async fn get_enrolled_courses(&self) -> Result<Vec<EnrollmentRecord>, CoreError> {
        self.inner.get_enrolled_courses().await
    }
    async fn check_enrollment(&self, id: &str) -> Result<EnrollmentCheck, CoreError> {
        self.inner.check_enrollment(id).await
    }
    async fn update_progress(&self, id: &str, data: &ProgressUpdate) -> Result<EnrollmentRecord, CoreError> {
        self.inner.update_progress(id, data).await
    }
}

/// Adds `extra_lesson` to every progress record it returns, the way a server
/// that tracks lessons of its own would.
pub struct AnnotatingProvider {
    pub inner: MemoryProvider,
    pub extra_lesson: String,
}

#[async_trait]
impl CourseProvider for AnnotatingProvider {
    async fn get_courses(&self, q: &CourseQuery) -> Result<CoursePage, CoreError> {
        self.inner.get_courses(q).await
    }
    async fn get_course(&self, id: &str) -> Result<Course, CoreError> {
        self.inner.get_course(id).await
    }
    async fn enroll_course(&self, id: &str) -> Result<EnrollAck, CoreError> {
        self.inner.enroll_course(id).await
    }
    async fn get_enrolled_courses(&self) -> Result<Vec<EnrollmentRecord>, CoreError> {
        self.inner.get_enrolled_courses().await
    }
    async fn check_enrollment(&self, id: &str) -> Result<EnrollmentCheck, CoreError> {
        self.inner.check_enrollment(id).await
    }
    async fn update_progress(&self, id: &str, data: &ProgressUpdate) -> Result<EnrollmentRecord, CoreError> {
        let mut rec = self.inner.update_progress(id, data).await?;
        rec.completed_lessons.push(self.extra_lesson.clone());
        Ok(rec)
    }
}

pub struct FixedPlaceholders(pub u64);

impl PlaceholderGenerator for FixedPlaceholders {
    fn student_count(&self, _: &str) -> u64 {
        self.0
    }
}

pub fn course(id: &str, price: u64, rating: f32) -> Course {
    let mut c = Course::new(id, format!("Course {id}"));
    c.price = price;
    c.rating = Some(rating);
    c
}
