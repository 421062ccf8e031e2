use axum::{
    routing::{get, post, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::api::routes::{
    chatbot_help, chatbot_message, chatbot_suggestions, check_enrollment, enroll, get_course,
    list_courses, list_enrollments, update_progress, AppState,
};
use learnhub_core::CourseProvider;

pub fn router(provider: Arc<dyn CourseProvider>) -> Router {
    let state = Arc::new(AppState { provider });

    Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/:id", get(get_course))
        .route("/api/courses/:id/enroll", post(enroll))
        .route("/api/enrollments", get(list_enrollments))
        .route("/api/enrollments/:id", get(check_enrollment))
        .route("/api/enrollments/:id/progress", put(update_progress))
        .route("/api/chatbot/message", post(chatbot_message))
        .route("/api/chatbot/suggestions", get(chatbot_suggestions))
        .route("/api/chatbot/help", get(chatbot_help))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(provider: Arc<dyn CourseProvider>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(provider);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "LearnHub API listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
