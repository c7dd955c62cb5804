use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use doctor_cell::{doctor_routes, DoctorState};
use shared_database::{AppointmentRepository, DoctorRepository};
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
        let state = Arc::new(DoctorState::new(
            self.fixtures.store.clone(),
            self.fixtures.store.clone(),
        ));
        doctor_routes(state, self.config.token_service())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }
}

fn create_body(email: &str) -> Body {
    Body::from(
        json!({
            "name": "Meredith Grey",
            "specialty": "Surgery",
            "email": email,
            "password": "scalpel",
            "available_times": ["08:00-09:00", "15:00-16:00"]
        })
        .to_string(),
    )
}

fn create_request(user: Option<&TestUser>, config: &TestConfig, email: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("authorization", user.bearer(config));
    }
    builder.body(create_body(email)).unwrap()
}

#[tokio::test]
async fn admin_creates_doctor() {
    let app = TestApp::new();
    let admin = TestUser::admin("admin");

    let (status, body) = app
        .send(create_request(Some(&admin), &app.config, "grey@clinic.test"))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "grey@clinic.test");
    assert_eq!(body["available_times"], json!(["08:00-09:00", "15:00-16:00"]));
    assert!(body.get("password_hash").is_none());

    let stored = app
        .fixtures
        .store
        .find_doctor_by_email("grey@clinic.test")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = TestApp::new();
    let admin = TestUser::admin("admin");
    app.send(create_request(Some(&admin), &app.config, "grey@clinic.test")).await;

    let (status, _) = app
        .send(create_request(Some(&admin), &app.config, "grey@clinic.test"))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn slot_template_must_hold_whole_disjoint_appointments() {
    let app = TestApp::new();
    let admin = TestUser::admin("admin");
    let create = |slots: Value| {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .header("authorization", admin.bearer(&app.config))
            .body(Body::from(
                json!({
                    "name": "Meredith Grey",
                    "specialty": "Surgery",
                    "email": "grey@clinic.test",
                    "password": "scalpel",
                    "available_times": slots
                })
                .to_string(),
            ))
            .unwrap()
    };

    let (half_hours, _) = app.send(create(json!(["09:00-09:30", "09:30-10:00"]))).await;
    let (overlapping, _) = app.send(create(json!(["09:00-10:00", "09:30-10:30"]))).await;

    assert_eq!(half_hours, StatusCode::BAD_REQUEST);
    assert_eq!(overlapping, StatusCode::BAD_REQUEST);
    assert!(app
        .fixtures
        .store
        .find_doctor_by_email("grey@clinic.test")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn registry_writes_require_admin() {
    let app = TestApp::new();
    let patient = TestUser::patient("p@clinic.test");

    let (anonymous, _) = app.send(create_request(None, &app.config, "a@clinic.test")).await;
    let (as_patient, _) = app
        .send(create_request(Some(&patient), &app.config, "a@clinic.test"))
        .await;

    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
    assert_eq!(as_patient, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn availability_endpoint_lists_open_slots() {
    let app = TestApp::new();
    let doctor = app
        .fixtures
        .doctor("Ann Smith", "Cardiology", &["09:00-10:00", "10:00-11:00"])
        .await;
    let patient = app.fixtures.patient("Bob Jones").await;
    app.fixtures
        .appointment(&doctor, &patient, at("2024-05-01", "10:00"), AppointmentStatus::Scheduled)
        .await;

    let request = Request::builder()
        .uri(format!("/{}/availability/2024-05-01", doctor.id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_slots"], json!(["09:00-10:00"]));
    assert_eq!(body["date"], "2024-05-01");
}

#[tokio::test]
async fn filter_endpoint_rejects_unknown_bucket() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/filter?time=noon")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("AM, PM"));
}

#[tokio::test]
async fn filter_endpoint_counts_matches() {
    let app = TestApp::new();
    app.fixtures.doctor("Ann Smith", "Cardiology", &["09:00-10:00"]).await;
    app.fixtures.doctor("Carl Webb", "Neurology", &["16:00-17:00"]).await;

    let request = Request::builder()
        .uri("/filter?name=null&specialty=&time=pm")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["doctors"][0]["name"], "Carl Webb");
}

#[tokio::test]
async fn deleting_doctor_cascades_to_appointments() {
    let app = TestApp::new();
    let doctor = app.fixtures.doctor("Ann Smith", "Cardiology", &["09:00-10:00"]).await;
    let patient = app.fixtures.patient("Bob Jones").await;
    app.fixtures
        .appointment(&doctor, &patient, at("2024-05-01", "09:00"), AppointmentStatus::Scheduled)
        .await;
    app.fixtures
        .appointment(&doctor, &patient, at("2024-05-02", "09:00"), AppointmentStatus::Scheduled)
        .await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/{}", doctor.id))
        .header("authorization", TestUser::admin("admin").bearer(&app.config))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted_appointments"], 2);
    assert!(app.fixtures.store.find_doctor(doctor.id).await.unwrap().is_none());
    assert!(app
        .fixtures
        .store
        .list_appointments_by_doctor(doctor.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unknown_doctor_is_not_found() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri(format!("/{}", uuid::Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Doctor not found");
}
