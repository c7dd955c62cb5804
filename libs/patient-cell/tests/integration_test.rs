use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use patient_cell::{create_patient_router, PatientState};
use shared_database::PatientRepository;
use shared_models::AppointmentStatus;
use shared_utils::test_utils::{at, TestConfig, TestFixtures, TestUser};

struct TestApp {
    fixtures: TestFixtures,
    config: TestConfig,
}

impl TestApp {
    fn new() -> Self {
        Self {
            fixtures: TestFixtures::new(),
            config: TestConfig::default(),
        }
    }

    fn router(&self) -> Router {
        let state = Arc::new(PatientState::new(
            self.fixtures.store.clone(),
            self.fixtures.store.clone(),
        ));
        create_patient_router(state, self.config.token_service())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn get(&self, uri: &str, user: &TestUser) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("authorization", user.bearer(&self.config))
            .body(Body::empty())
            .unwrap()
    }
}

fn registration(email: &str, phone: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "name": "Dana Fox",
                "email": email,
                "phone": phone,
                "address": "2 Elm Road",
                "password": "hunter2"
            })
            .to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn registration_hashes_password_and_hides_it() {
    let app = TestApp::new();

    let (status, body) = app.send(registration("dana@clinic.test", "555-0101")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "dana@clinic.test");
    assert!(body.get("password_hash").is_none());

    let stored = app
        .fixtures
        .store
        .find_patient_by_email("dana@clinic.test")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn registration_rejects_reused_email_or_phone() {
    let app = TestApp::new();
    app.send(registration("dana@clinic.test", "555-0101")).await;

    let (same_email, _) = app.send(registration("dana@clinic.test", "555-0202")).await;
    let (same_phone, _) = app.send(registration("other@clinic.test", "555-0101")).await;

    assert_eq!(same_email, StatusCode::CONFLICT);
    assert_eq!(same_phone, StatusCode::CONFLICT);
}

#[tokio::test]
async fn profile_resolves_session_email() {
    let app = TestApp::new();
    let patient = app.fixtures.patient("Bob Jones").await;

    let (status, body) = app
        .send(app.get("/me", &TestUser::patient(&patient.email)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], patient.id.to_string());
}

#[tokio::test]
async fn only_the_patient_lists_their_appointments() {
    let app = TestApp::new();
    let doctor = app.fixtures.doctor("Ann Smith", "Cardiology", &["09:00-10:00"]).await;
    let patient = app.fixtures.patient("Bob Jones").await;
    app.fixtures
        .appointment(&doctor, &patient, at("2024-05-01", "09:00"), AppointmentStatus::Scheduled)
        .await;
    let uri = format!("/{}/appointments", patient.id);

    let (own, body) = app.send(app.get(&uri, &TestUser::patient(&patient.email))).await;
    let (foreign, _) = app
        .send(app.get(&uri, &TestUser::patient("cara.lane@clinic.test")))
        .await;

    assert_eq!(own, StatusCode::OK);
    assert_eq!(body[0]["doctor_name"], "Ann Smith");
    assert_eq!(foreign, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn filter_endpoint_applies_condition() {
    let app = TestApp::new();
    let doctor = app.fixtures.doctor("Ann Smith", "Cardiology", &["09:00-10:00"]).await;
    let patient = app.fixtures.patient("Bob Jones").await;
    app.fixtures
        .appointment(&doctor, &patient, at("2024-04-01", "09:00"), AppointmentStatus::Completed)
        .await;
    app.fixtures
        .appointment(&doctor, &patient, at("2024-05-01", "09:00"), AppointmentStatus::Scheduled)
        .await;
    let user = TestUser::patient(&patient.email);

    let (past, body) = app
        .send(app.get("/appointments/filter?condition=past&name=ann", &user))
        .await;
    let (invalid, error) = app
        .send(app.get("/appointments/filter?condition=soon", &user))
        .await;

    assert_eq!(past, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "completed");
    assert_eq!(invalid, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("past, future"));
}
