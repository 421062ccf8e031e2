use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use learnhub_core::{
    chatbot::{self, ChatReply, HelpInfo},
    CoreError, CourseProvider, CourseQuery, EnrollmentRecord, ProgressUpdate,
};

use crate::api::dto::{CheckOut, CourseOut, CoursesOut, DataOut, EnrollOut, EnrolledOut, ErrorOut};

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CourseProvider>,
}

/// Maps [`CoreError`] onto a status code and the `{success: false}` envelope.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, message) = match &err {
            CoreError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
            CoreError::PaymentRequired(_) => (StatusCode::PAYMENT_REQUIRED, err.to_string()),
            CoreError::InvalidProgress(_) | CoreError::Invalid(_) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            CoreError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
            CoreError::ProviderUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
            CoreError::Storage(_) => {
                tracing::error!(error = %err, "storage failure while serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = ErrorOut {
            success: false,
            error: err.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

pub async fn list_courses(
    State(st): State<Arc<AppState>>,
    Query(q): Query<CourseQuery>,
) -> Result<Json<CoursesOut>, ApiError> {
    let page = st.provider.get_courses(&q).await?;
    Ok(Json(CoursesOut {
        success: true,
        courses: page.courses,
        pagination: page.pagination,
    }))
}

pub async fn get_course(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CourseOut>, ApiError> {
    let course = st.provider.get_course(&id).await?;
    Ok(Json(CourseOut { success: true, course }))
}

pub async fn enroll(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EnrollOut>, ApiError> {
    let ack = st.provider.enroll_course(&id).await?;
    tracing::info!(course = %id, message = %ack.message, "enroll request");
    Ok(Json(EnrollOut {
        success: true,
        message: ack.message,
        course: ack.course,
        enrollment: ack.enrollment,
    }))
}

pub async fn list_enrollments(
    State(st): State<Arc<AppState>>,
) -> Result<Json<EnrolledOut>, ApiError> {
    let courses = st.provider.get_enrolled_courses().await?;
    Ok(Json(EnrolledOut { success: true, courses }))
}

pub async fn check_enrollment(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CheckOut>, ApiError> {
    let check = st.provider.check_enrollment(&id).await?;
    Ok(Json(CheckOut {
        success: true,
        is_enrolled: check.is_enrolled,
        enrollment: check.enrollment,
    }))
}

pub async fn update_progress(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<ProgressUpdate>, JsonRejection>,
) -> Result<Json<DataOut<EnrollmentRecord>>, ApiError> {
    let Json(update) = body.map_err(|_| CoreError::Invalid("malformed progress body"))?;
    let record = st.provider.update_progress(&id, &update).await?;
    Ok(Json(DataOut::ok(record)))
}

pub async fn chatbot_message(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DataOut<ChatReply>>, ApiError> {
    let message = body
        .ok()
        .and_then(|Json(v)| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .filter(|m| !m.is_empty())
        .ok_or(CoreError::Invalid("message is required and must be a string"))?;
    let reply = chatbot::respond(&message);
    tracing::debug!(category = reply.category.as_str(), "chatbot reply");
    Ok(Json(DataOut::ok(reply)))
}

pub async fn chatbot_suggestions() -> Json<DataOut<Vec<String>>> {
    Json(DataOut::ok(chatbot::suggestions()))
}

pub async fn chatbot_help() -> Json<DataOut<HelpInfo>> {
    Json(DataOut::ok(chatbot::help()))
}

#[cfg(test)]
mod tests {
    use crate::api::server::router;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use learnhub_core::MemoryProvider;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(MemoryProvider::seeded()))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => req
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn lists_courses_with_pagination() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/courses?category=design&limit=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["courses"].as_array().unwrap().len(), 1);
        assert_eq!(body["courses"][0]["id"], "ui-ux-design");
        assert_eq!(body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn unknown_course_is_404_envelope() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/courses/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "NotFound");
    }

    #[tokio::test]
    async fn enroll_then_check_and_progress() {
        let app = app();
        let (status, body) =
            send(&app, Method::POST, "/api/courses/web-dev-fundamentals/enroll", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully enrolled in course");

        let (_, body) = send(&app, Method::GET, "/api/enrollments/web-dev-fundamentals", None).await;
        assert_eq!(body["isEnrolled"], true);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/enrollments/web-dev-fundamentals/progress",
            Some(json!({"progress": 40, "completedLesson": "intro"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["progress"], 40.0);

        let (_, body) = send(&app, Method::GET, "/api/enrollments", None).await;
        assert_eq!(body["courses"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn out_of_range_progress_is_400() {
        let app = app();
        send(&app, Method::POST, "/api/courses/ui-ux-design/enroll", None).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/enrollments/ui-ux-design/progress",
            Some(json!({"progress": 150})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidProgress");
    }

    #[tokio::test]
    async fn chatbot_requires_string_message() {
        let app = app();
        let (status, body) =
            send(&app, Method::POST, "/api/chatbot/message", Some(json!({"message": 42}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, Method::POST, "/api/chatbot/message", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chatbot_classifies_messages() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/chatbot/message",
            Some(json!({"message": "What is the price of your courses?", "userId": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["category"], "payment");

        let (_, body) = send(&app, Method::GET, "/api/chatbot/suggestions", None).await;
        assert!(!body["data"].as_array().unwrap().is_empty());

        let (_, body) = send(&app, Method::GET, "/api/chatbot/help", None).await;
        assert!(body["data"]["topics"].is_array());
        assert!(body["data"]["tips"].is_array());
    }
}
