//! [`CourseProvider`] backed by a remote LearnHub API over HTTP.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use learnhub_core::{
    CoreError, Course, CoursePage, CourseProvider, CourseQuery, EnrollAck, EnrollmentCheck,
    EnrollmentRecord, ProgressUpdate,
};

use crate::api::dto::{CheckOut, CourseOut, CoursesOut, DataOut, EnrollOut, EnrolledOut, ErrorOut};

pub struct HttpProvider {
    base: String,
    http: Client,
}

/// A non-2xx response, reduced to what is needed to rebuild a [`CoreError`].
struct Failure {
    status: StatusCode,
    code: Option<String>,
}

impl Failure {
    fn into_core(self, what: &'static str, course_id: &str) -> CoreError {
        match self.status {
            StatusCode::NOT_FOUND => CoreError::NotFound(what),
            StatusCode::PAYMENT_REQUIRED => CoreError::PaymentRequired(course_id.to_string()),
            StatusCode::BAD_REQUEST => CoreError::Invalid("rejected by server"),
            StatusCode::CONFLICT => CoreError::Conflict("rejected by server"),
            s => CoreError::unavailable(format!(
                "server answered {s}{}",
                self.code.map(|c| format!(" ({c})")).unwrap_or_default()
            )),
        }
    }
}

impl HttpProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CoreError::unavailable)?;
        Ok(Self {
            base: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base, path)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Result<T, Failure>, CoreError> {
        let res = req.send().await.map_err(|e| {
            tracing::warn!(error = %e, "remote provider unreachable");
            CoreError::unavailable(e)
        })?;
        let status = res.status();
        if status.is_success() {
            let body = res.json::<T>().await.map_err(CoreError::unavailable)?;
            return Ok(Ok(body));
        }
        let code = res.json::<ErrorOut>().await.ok().map(|e| e.error);
        tracing::debug!(%status, code = ?code, "remote provider returned an error");
        Ok(Err(Failure { status, code }))
    }
}

fn query_string(q: &CourseQuery) -> String {
    let page = q.page.map(|p| p.to_string());
    let limit = q.limit.map(|l| l.to_string());
    let pairs = [
        ("category", q.category.as_deref()),
        ("level", q.level.as_deref()),
        ("search", q.search.as_deref()),
        ("sort", q.sort.map(|s| s.as_str())),
        ("page", page.as_deref()),
        ("limit", limit.as_deref()),
    ];
    let encoded: Vec<String> = pairs
        .iter()
        .filter_map(|(k, v)| v.map(|v| format!("{k}={}", urlencoding::encode(v))))
        .collect();
    if encoded.is_empty() {
        String::new()
    } else {
        format!("?{}", encoded.join("&"))
    }
}

#[async_trait]
impl CourseProvider for HttpProvider {
    async fn get_courses(&self, query: &CourseQuery) -> Result<CoursePage, CoreError> {
        let url = format!("{}{}", self.url("/courses"), query_string(query));
        let out: CoursesOut = self
            .send(self.http.get(url))
            .await?
            .map_err(|f| f.into_core("courses", ""))?;
        Ok(CoursePage {
            courses: out.courses,
            pagination: out.pagination,
        })
    }

    async fn get_course(&self, id: &str) -> Result<Course, CoreError> {
        let url = self.url(&format!("/courses/{}", urlencoding::encode(id)));
        let out: CourseOut = self
            .send(self.http.get(url))
            .await?
            .map_err(|f| f.into_core("course", id))?;
        Ok(out.course)
    }

    async fn enroll_course(&self, id: &str) -> Result<EnrollAck, CoreError> {
        let url = self.url(&format!("/courses/{}/enroll", urlencoding::encode(id)));
        let out: EnrollOut = self
            .send(self.http.post(url))
            .await?
            .map_err(|f| f.into_core("course", id))?;
        Ok(EnrollAck {
            message: out.message,
            course: out.course,
            enrollment: out.enrollment,
        })
    }

    async fn get_enrolled_courses(&self) -> Result<Vec<EnrollmentRecord>, CoreError> {
        let out: EnrolledOut = self
            .send(self.http.get(self.url("/enrollments")))
            .await?
            .map_err(|f| f.into_core("enrollments", ""))?;
        Ok(out.courses)
    }

    async fn check_enrollment(&self, id: &str) -> Result<EnrollmentCheck, CoreError> {
        let url = self.url(&format!("/enrollments/{}", urlencoding::encode(id)));
        let out: CheckOut = self
            .send(self.http.get(url))
            .await?
            .map_err(|f| f.into_core("enrollment", id))?;
        Ok(EnrollmentCheck {
            is_enrolled: out.is_enrolled,
            enrollment: out.enrollment,
        })
    }

    async fn update_progress(
        &self,
        id: &str,
        data: &ProgressUpdate,
    ) -> Result<EnrollmentRecord, CoreError> {
        let url = self.url(&format!("/enrollments/{}/progress", urlencoding::encode(id)));
        let out: DataOut<EnrollmentRecord> = self
            .send(self.http.put(url).json(data))
            .await?
            .map_err(|f| {
                if f.code.as_deref() == Some("InvalidProgress") {
                    if let Some(p) = data.progress {
                        return CoreError::InvalidProgress(p);
                    }
                }
                f.into_core("enrollment", id)
            })?;
        Ok(out.data)
    }
}
