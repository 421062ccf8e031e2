mod support;

use learnhub_core::{
    CertificateGenerator, CoreError, EnrollmentRecord, EnrollmentStore, MemoryProvider,
    ProgressUpdate, SessionLedger,
};
use serde_json::json;
use std::sync::Arc;
use support::{AnnotatingProvider, DownProvider, RecordsProvider};

fn store() -> EnrollmentStore {
    EnrollmentStore::new(
        Arc::new(MemoryProvider::seeded()),
        Arc::new(SessionLedger::in_memory()),
        CertificateGenerator::new("Ada Lovelace"),
    )
}

#[tokio::test]
async fn enroll_is_idempotent() {
    let s = store();
    s.enroll("web-dev-fundamentals").await.unwrap();
    s.enroll("web-dev-fundamentals").await.unwrap();

    let list = s.enrollments();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].course_id, "web-dev-fundamentals");
    assert!(s.is_enrolled_in_course("web-dev-fundamentals"));
    assert!(!s.is_loading());
}

#[tokio::test]
async fn premium_without_payment_is_refused() {
    let s = store();
    s.enroll("ui-ux-design").await.unwrap();
    let before = s.enrollments();

    let err = s.enroll("react-masterclass").await.unwrap_err();
    assert_eq!(err, CoreError::PaymentRequired("react-masterclass".into()));
    assert_eq!(err.code(), "PaymentRequired");
    assert_eq!(s.enrollments(), before);
    assert!(!s.is_enrolled_in_course("react-masterclass"));
}

#[tokio::test]
async fn premium_after_payment_enrolls() {
    let s = store();
    s.ledger().record_payment("react-masterclass").await.unwrap();
    let e = s.enroll("react-masterclass").await.unwrap();
    assert_eq!(e.course_id, "react-masterclass");
    assert_eq!(e.progress, 0);
    assert!(s.is_enrolled_in_course("react-masterclass"));
}

#[tokio::test]
async fn unknown_course_cannot_be_enrolled() {
    let s = store();
    assert_eq!(s.enroll("nope").await.unwrap_err(), CoreError::NotFound("course"));
    assert!(s.enrollments().is_empty());
}

#[tokio::test]
async fn progress_out_of_range_is_rejected() {
    let s = store();
    s.enroll("python-for-data").await.unwrap();
    s.update_progress("python-for-data", ProgressUpdate::percent(40)).await.unwrap();

    let err = s
        .update_progress("python-for-data", ProgressUpdate::percent(150))
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::InvalidProgress(150));
    assert_eq!(s.get_enrollment("python-for-data").unwrap().progress, 40);

    let err = s
        .update_progress("python-for-data", ProgressUpdate::percent(-1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "InvalidProgress");
}

#[tokio::test]
async fn full_progress_completes_and_issues_certificate() {
    let s = store();
    s.enroll("python-for-data").await.unwrap();
    let e = s
        .update_progress("python-for-data", ProgressUpdate::percent(100))
        .await
        .unwrap();
    assert_eq!(e.progress, 100);
    assert!(e.completed);
    assert!(e.completed_at.is_some());

    let cert = s.ledger().certificate_for("python-for-data").unwrap();
    assert_eq!(cert.student_name, "Ada Lovelace");
    assert_eq!(cert.course_title, "Python for Data Analysis");

    // same certificate on a second request
    let again = s.certificate("python-for-data").await.unwrap();
    assert_eq!(again, cert);
    assert_eq!(s.ledger().certificates().len(), 1);
}

#[tokio::test]
async fn lessons_merge_without_duplicates() {
    let s = store();
    s.enroll("ui-ux-design").await.unwrap();
    let lesson = ProgressUpdate {
        progress: None,
        completed_lesson: Some("intro".into()),
    };
    s.update_progress("ui-ux-design", lesson.clone()).await.unwrap();
    let e = s.update_progress("ui-ux-design", lesson).await.unwrap();
    assert_eq!(e.completed_lessons, ["intro"]);
    assert_eq!(e.progress, 0);
    assert!(e.last_accessed_at.is_some());
}

#[tokio::test]
async fn progress_requires_enrollment() {
    let s = store();
    let err = s
        .update_progress("python-for-data", ProgressUpdate::percent(10))
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::NotFound("enrollment"));
    assert!(s.enrollments().is_empty());
}

#[tokio::test]
async fn certificate_needs_completion() {
    let s = store();
    s.enroll("python-for-data").await.unwrap();
    assert_eq!(
        s.certificate("python-for-data").await.unwrap_err(),
        CoreError::Invalid("course not completed")
    );
}

#[tokio::test]
async fn check_enrollment_degrades_on_provider_error() {
    let s = EnrollmentStore::new(
        Arc::new(DownProvider),
        Arc::new(SessionLedger::in_memory()),
        CertificateGenerator::new("x"),
    );
    let status = s.check_enrollment("anything").await;
    assert!(!status.is_enrolled);
    assert!(status.enrollment.is_none());
    assert!(!s.is_loading());
}

#[tokio::test]
async fn check_enrollment_reports_provider_state() {
    let s = store();
    assert!(!s.check_enrollment("ui-ux-design").await.is_enrolled);
    s.enroll("ui-ux-design").await.unwrap();
    let status = s.check_enrollment("ui-ux-design").await;
    assert!(status.is_enrolled);
    assert_eq!(status.enrollment.unwrap().course_id, "ui-ux-design");
}

#[tokio::test]
async fn refresh_normalizes_every_course_ref_shape() {
    let records: Vec<EnrollmentRecord> = serde_json::from_value(json!([
        { "courseId": "raw-id", "progress": 10 },
        { "courseId": 42, "progress": 20.4 },
        { "course": { "_id": "embedded", "title": "Embedded" }, "progress": 99.6 },
        { "courseId": { "id": 7 } },
        { "courseId": "raw-id", "progress": 80 }
    ]))
    .unwrap();
    let s = EnrollmentStore::new(
        Arc::new(RecordsProvider { records }),
        Arc::new(SessionLedger::in_memory()),
        CertificateGenerator::new("x"),
    );
    let list = s.refresh().await.unwrap();

    let ids: Vec<_> = list.iter().map(|e| e.course_id.as_str()).collect();
    assert_eq!(ids, ["raw-id", "42", "embedded", "7"]);
    assert!(s.is_enrolled_in_course("42"));
    assert!(s.is_enrolled_in_course("embedded"));
    assert_eq!(s.get_enrollment("raw-id").unwrap().progress, 10);
    assert_eq!(s.get_enrollment("42").unwrap().progress, 20);
    assert_eq!(s.get_enrollment("embedded").unwrap().progress, 99);
    assert!(s.get_enrollment("missing").is_none());
}

#[tokio::test]
async fn fractional_progress_does_not_complete_a_course() {
    let records: Vec<EnrollmentRecord> = serde_json::from_value(json!([
        { "courseId": "almost", "progress": 99.6, "completed": false },
        { "courseId": "done", "progress": 100.0 },
        { "courseId": "flagged", "progress": 42.0, "completed": true }
    ]))
    .unwrap();
    let s = EnrollmentStore::new(
        Arc::new(RecordsProvider { records }),
        Arc::new(SessionLedger::in_memory()),
        CertificateGenerator::new("x"),
    );
    s.refresh().await.unwrap();

    let almost = s.get_enrollment("almost").unwrap();
    assert_eq!(almost.progress, 99);
    assert!(!almost.completed);
    assert_eq!(
        s.certificate("almost").await.unwrap_err(),
        CoreError::Invalid("course not completed")
    );
    assert!(s.ledger().certificates().is_empty());

    assert!(s.get_enrollment("done").unwrap().completed);
    assert_eq!(s.certificate("done").await.unwrap().course_id, "done");
    assert!(s.get_enrollment("flagged").unwrap().completed);
}

#[tokio::test]
async fn progress_keeps_the_providers_record() {
    let s = EnrollmentStore::new(
        Arc::new(AnnotatingProvider {
            inner: MemoryProvider::seeded(),
            extra_lesson: "recorded-on-server".into(),
        }),
        Arc::new(SessionLedger::in_memory()),
        CertificateGenerator::new("x"),
    );
    s.enroll("ui-ux-design").await.unwrap();
    let update = ProgressUpdate {
        progress: Some(30),
        completed_lesson: Some("intro".into()),
    };
    let e = s.update_progress("ui-ux-design", update).await.unwrap();

    assert_eq!(e.completed_lessons, ["intro", "recorded-on-server"]);
    assert_eq!(e.progress, 30);
    assert_eq!(s.get_enrollment("ui-ux-design").unwrap(), e);
}
