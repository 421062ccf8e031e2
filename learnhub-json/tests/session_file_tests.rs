use chrono::Utc;
use learnhub_core::{Certificate, SessionLedger, SessionState, SessionStore};
use learnhub_json::JsonSessionStore;
use std::sync::Arc;

fn certificate(course_id: &str) -> Certificate {
    Certificate {
        id: uuid::Uuid::new_v4(),
        course_id: course_id.to_string(),
        course_title: "Cybersecurity Basics".to_string(),
        student_name: "Grace Hopper".to_string(),
        issued_at: Utc::now(),
        verification_code: "LH-000000000001".to_string(),
    }
}

#[tokio::test]
async fn ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    {
        let store = Arc::new(JsonSessionStore::open(path.clone()).await.unwrap());
        let ledger = SessionLedger::open(store).await.unwrap();
        ledger.record_payment("cybersecurity-basics").await.unwrap();
        ledger.award(certificate("cybersecurity-basics")).await.unwrap();
    }

    let store = Arc::new(JsonSessionStore::open(path.clone()).await.unwrap());
    let ledger = SessionLedger::open(store).await.unwrap();
    assert!(ledger.has_paid("cybersecurity-basics"));
    assert!(!ledger.has_paid("react-masterclass"));
    assert_eq!(ledger.certificates().len(), 1);
    assert_eq!(
        ledger.certificate_for("cybersecurity-basics").unwrap().student_name,
        "Grace Hopper"
    );
}

#[tokio::test]
async fn file_holds_both_arrays() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = JsonSessionStore::open(path.clone()).await.unwrap();
    let state = SessionState {
        paid_courses: vec!["react-masterclass".into()],
        certificates: vec![certificate("ui-ux-design")],
    };
    store.save(&state).await.unwrap();

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["paidCourses"], serde_json::json!(["react-masterclass"]));
    assert_eq!(raw["certificates"][0]["courseId"], "ui-ux-design");
    assert_eq!(store.load().await.unwrap(), state);
}

#[tokio::test]
async fn backups_are_rotated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let backups = dir.path().join("backups");
    let store = JsonSessionStore::open_with(path, backups.clone(), 2).await.unwrap();

    for i in 0..6 {
        let state = SessionState {
            paid_courses: vec![format!("course-{i}")],
            certificates: Vec::new(),
        };
        store.save(&state).await.unwrap();
    }
    let count = std::fs::read_dir(&backups).unwrap().count();
    assert!((1..=2).contains(&count), "kept {count} backups");
}

#[tokio::test]
async fn corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(JsonSessionStore::open(path).await.is_err());
}
