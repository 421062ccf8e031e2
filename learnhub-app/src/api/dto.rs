//! JSON envelopes for the `/api` routes. The same types are used by the server
//! to write responses and by [`crate::client::HttpProvider`] to read them.

use learnhub_core::{Course, EnrollmentRecord, Pagination};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct CoursesOut {
    pub success: bool,
    pub courses: Vec<Course>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseOut {
    pub success: bool,
    pub course: Course,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollOut {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub course: Option<Course>,
    #[serde(default)]
    pub enrollment: Option<EnrollmentRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnrolledOut {
    pub success: bool,
    pub courses: Vec<EnrollmentRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOut {
    pub success: bool,
    pub is_enrolled: bool,
    #[serde(default)]
    pub enrollment: Option<EnrollmentRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataOut<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataOut<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub success: bool,
    /// Stable error name, e.g. `PaymentRequired`.
    pub error: String,
    pub message: String,
}
