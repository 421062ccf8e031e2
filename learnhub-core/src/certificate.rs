use crate::{CoreError, Course, CourseId, Enrollment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub course_id: CourseId,
    pub course_title: String,
    pub student_name: String,
    pub issued_at: DateTime<Utc>,
    pub verification_code: String,
}

impl Certificate {
    pub fn render_text(&self) -> String {
        let rule = "=".repeat(60);
        format!(
            "{rule}\n{:^60}\n{rule}\n\n{:^60}\n\n{:^60}\n\n{:^60}\n{:^60}\n\n{:^60}\n{:^60}\n{rule}\n",
            "CERTIFICATE OF COMPLETION",
            "This certifies that",
            self.student_name,
            "has successfully completed",
            self.course_title,
            format!("Issued {}", self.issued_at.format("%B %-d, %Y")),
            format!("Verification code {}", self.verification_code),
        )
    }
}

/// Issues certificates for completed enrollments.
#[derive(Clone, Debug)]
pub struct CertificateGenerator {
    student_name: String,
}

impl CertificateGenerator {
    pub fn new(student_name: impl Into<String>) -> Self {
        Self {
            student_name: student_name.into(),
        }
    }

    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    pub fn issue(
        &self,
        course: &Course,
        enrollment: &Enrollment,
        issued_at: DateTime<Utc>,
    ) -> Result<Certificate, CoreError> {
        if enrollment.course_id != course.id {
            return Err(CoreError::Invalid("enrollment does not belong to course"));
        }
        if !enrollment.completed {
            return Err(CoreError::Invalid("course not completed"));
        }
        Ok(Certificate {
            id: Uuid::new_v4(),
            course_id: course.id.clone(),
            course_title: course.title.clone(),
            student_name: self.student_name.clone(),
            issued_at,
            verification_code: verification_code(&course.id, &self.student_name, issued_at),
        })
    }
}

fn verification_code(course_id: &str, student: &str, issued_at: DateTime<Utc>) -> String {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    let stamp = issued_at.timestamp().to_string();
    for part in [course_id, student, stamp.as_str()] {
        for b in part.bytes().chain(std::iter::once(0u8)) {
            h ^= u64::from(b);
            h = h.wrapping_mul(0x0100_0000_01b3);
        }
    }
    format!("LH-{:012X}", h & 0xFFFF_FFFF_FFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_incomplete_enrollment() {
        let course = Course::new("c1", "Rust 101");
        let e = Enrollment::new("c1", Utc::now());
        let g = CertificateGenerator::new("Ada");
        assert_eq!(
            g.issue(&course, &e, Utc::now()).unwrap_err(),
            CoreError::Invalid("course not completed")
        );
    }

    #[test]
    fn code_is_deterministic() {
        let course = Course::new("c1", "Rust 101");
        let mut e = Enrollment::new("c1", Utc::now());
        e.completed = true;
        let at = Utc::now();
        let g = CertificateGenerator::new("Ada");
        let a = g.issue(&course, &e, at).unwrap();
        let b = g.issue(&course, &e, at).unwrap();
        assert_eq!(a.verification_code, b.verification_code);
        assert_ne!(a.id, b.id);
        assert!(a.render_text().contains("Rust 101"));
        assert!(a.render_text().contains("Ada"));
    }
}
