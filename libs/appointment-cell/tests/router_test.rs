use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::{appointment_routes, AppointmentState, BookingValidator};
use doctor_cell::AvailabilityService;
use shared_database::{PatientRepository, PrescriptionRepository};
use shared_models::{Appointment, AppointmentStatus, Doctor, Patient};
use shared_utils::test_utils::{at, TestConfig, TestFixtures, TestUser};

struct TestApp {
    fixtures: TestFixtures,
    config: TestConfig,
    doctor: Doctor,
    patient: Patient,
}

impl TestApp {
    async fn new() -> Self {
        let fixtures = TestFixtures::new();
        fixtures
            .doctor("Cy Young", "Dermatology", &["09:00-10:00"])
            .await;
        fixtures.patient("Dee Park").await;
        let doctor = fixtures
            .doctor("Ann Smith", "Cardiology", &["09:00-10:00", "10:00-11:00"])
            .await;
        let patient = fixtures.patient("Bob Jones").await;
        Self {
            fixtures,
            config: TestConfig::default(),
            doctor,
            patient,
        }
    }

    fn router(&self) -> Router {
        let store = self.fixtures.store.clone();
        let availability = Arc::new(AvailabilityService::new(store.clone(), store.clone()));
        let validator = BookingValidator::new(
            store.clone(),
            availability,
            self.config.to_app_config().booking_policy,
        );
        let state = Arc::new(AppointmentState::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            validator,
        ));
        appointment_routes(state, self.config.token_service())
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("authorization", user.bearer(&self.config));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn as_patient(&self) -> TestUser {
        TestUser::patient(&self.patient.email)
    }

    fn as_doctor(&self) -> TestUser {
        TestUser::doctor(&self.doctor.email)
    }

    fn as_other_doctor(&self) -> TestUser {
        TestUser::doctor("cy.young@clinic.test")
    }

    fn as_other_patient(&self) -> TestUser {
        TestUser::patient("dee.park@clinic.test")
    }

    async fn booked(&self) -> Appointment {
        self.fixtures
            .appointment(&self.doctor, &self.patient, at("2024-05-01", "09:00"), AppointmentStatus::Scheduled)
            .await
    }

    fn booking(&self, time: &str) -> Value {
        json!({
            "doctor_id": self.doctor.id,
            "patient_id": self.patient.id,
            "scheduled_at": format!("2024-05-01T{}:00Z", time),
        })
    }
}

#[tokio::test]
async fn patient_books_open_slot() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send("POST", "/", Some(&app.as_patient()), Some(app.booking("09:00")))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "scheduled");
    assert_eq!(body["end_at"], "2024-05-01T10:00:00Z");
}

#[tokio::test]
async fn booking_requires_patient_session() {
    let app = TestApp::new().await;

    let (anonymous, _) = app.send("POST", "/", None, Some(app.booking("09:00"))).await;
    let (as_doctor, _) = app
        .send("POST", "/", Some(&app.as_doctor()), Some(app.booking("09:00")))
        .await;

    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
    assert_eq!(as_doctor, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn booking_taken_slot_is_conflict() {
    let app = TestApp::new().await;
    app.send("POST", "/", Some(&app.as_patient()), Some(app.booking("10:00"))).await;

    let (status, _) = app
        .send("POST", "/", Some(&app.as_patient()), Some(app.booking("10:00")))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn doctor_completes_appointment_but_cannot_reopen_it() {
    let app = TestApp::new().await;
    let booked = app
        .fixtures
        .appointment(&app.doctor, &app.patient, at("2024-05-01", "09:00"), AppointmentStatus::Scheduled)
        .await;
    let uri = format!("/{}/status", booked.id);

    let (completed, body) = app
        .send("PATCH", &uri, Some(&app.as_doctor()), Some(json!({ "status": "completed" })))
        .await;
    let (reopened, _) = app
        .send("PATCH", &uri, Some(&app.as_doctor()), Some(json!({ "status": 0 })))
        .await;
    let (by_patient, _) = app
        .send("PATCH", &uri, Some(&app.as_patient()), Some(json!({ "status": "completed" })))
        .await;

    assert_eq!(completed, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(reopened, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(by_patient, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cancel_checks_ownership() {
    let app = TestApp::new().await;
    let booked = app
        .fixtures
        .appointment(&app.doctor, &app.patient, at("2024-05-01", "09:00"), AppointmentStatus::Scheduled)
        .await;
    let uri = format!("/{}", booked.id);

    let stranger = TestUser::patient("stranger@clinic.test");
    let (denied, _) = app.send("DELETE", &uri, Some(&stranger), None).await;
    let (canceled, body) = app.send("DELETE", &uri, Some(&app.as_patient()), None).await;
    let (gone, _) = app.send("DELETE", &uri, Some(&app.as_patient()), None).await;

    assert_eq!(denied, StatusCode::UNAUTHORIZED);
    assert_eq!(canceled, StatusCode::OK);
    assert_eq!(body["outcome"], "canceled");
    assert_eq!(gone, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_reports_outcome() {
    let app = TestApp::new().await;
    let booked = app
        .fixtures
        .appointment(&app.doctor, &app.patient, at("2024-05-01", "09:00"), AppointmentStatus::Scheduled)
        .await;

    let (status, body) = app
        .send(
            "PUT",
            &format!("/{}", booked.id),
            Some(&app.as_patient()),
            Some(json!({
                "doctor_id": app.doctor.id,
                "patient_id": app.patient.id,
                "scheduled_at": "2024-05-01T10:00:00Z",
                "status": "scheduled"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "updated");
    assert_eq!(body["appointment"]["scheduled_at"], "2024-05-01T10:00:00Z");
}

#[tokio::test]
async fn listing_needs_exactly_one_owner_and_a_known_status() {
    let app = TestApp::new().await;
    app.fixtures
        .appointment(&app.doctor, &app.patient, at("2024-05-01", "09:00"), AppointmentStatus::Scheduled)
        .await;
    let user = app.as_patient();

    let (no_owner, _) = app.send("GET", "/", Some(&user), None).await;
    let (bad_status, _) = app
        .send("GET", &format!("/?patient_id={}&status=missed", app.patient.id), Some(&user), None)
        .await;
    let (ok, body) = app
        .send("GET", &format!("/?patient_id={}&status=null", app.patient.id), Some(&user), None)
        .await;

    assert_eq!(no_owner, StatusCode::BAD_REQUEST);
    assert_eq!(bad_status, StatusCode::BAD_REQUEST);
    assert_eq!(ok, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["patient_name"], "Bob Jones");
}

#[tokio::test]
async fn doctor_schedule_uses_session_identity() {
    let app = TestApp::new().await;
    app.fixtures
        .appointment(&app.doctor, &app.patient, at("2024-05-01", "09:00"), AppointmentStatus::Scheduled)
        .await;

    let (status, body) = app
        .send("GET", "/schedule/2024-05-01?name=bob", Some(&app.as_doctor()), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn listing_is_limited_to_own_appointments() {
    let app = TestApp::new().await;
    app.booked().await;
    let by_patient = format!("/?patient_id={}", app.patient.id);
    let by_doctor = format!("/?doctor_id={}", app.doctor.id);

    let (other_patient, _) = app.send("GET", &by_patient, Some(&app.as_other_patient()), None).await;
    let (other_doctor, _) = app.send("GET", &by_doctor, Some(&app.as_other_doctor()), None).await;
    let (patient_by_doctor, _) = app.send("GET", &by_doctor, Some(&app.as_patient()), None).await;
    let (own_doctor, body) = app.send("GET", &by_doctor, Some(&app.as_doctor()), None).await;
    let (admin, _) = app
        .send("GET", &by_patient, Some(&TestUser::admin("admin")), None)
        .await;

    assert_eq!(other_patient, StatusCode::UNAUTHORIZED);
    assert_eq!(other_doctor, StatusCode::UNAUTHORIZED);
    assert_eq!(patient_by_doctor, StatusCode::UNAUTHORIZED);
    assert_eq!(own_doctor, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(admin, StatusCode::OK);
}

#[tokio::test]
async fn appointment_is_visible_to_its_parties_only() {
    let app = TestApp::new().await;
    let booked = app.booked().await;
    let uri = format!("/{}", booked.id);

    let (stranger, _) = app.send("GET", &uri, Some(&app.as_other_patient()), None).await;
    let (patient, body) = app.send("GET", &uri, Some(&app.as_patient()), None).await;
    let (doctor, _) = app.send("GET", &uri, Some(&app.as_doctor()), None).await;

    assert_eq!(stranger, StatusCode::UNAUTHORIZED);
    assert_eq!(patient, StatusCode::OK);
    assert_eq!(body["id"], booked.id.to_string());
    assert_eq!(doctor, StatusCode::OK);
}

#[tokio::test]
async fn patient_cannot_book_for_someone_else() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send("POST", "/", Some(&app.as_other_patient()), Some(app.booking("09:00")))
        .await;
    let (listed, body) = app
        .send("GET", &format!("/?patient_id={}", app.patient.id), Some(&app.as_patient()), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(listed, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn only_the_appointed_doctor_changes_status() {
    let app = TestApp::new().await;
    let booked = app.booked().await;

    let (status, _) = app
        .send(
            "PATCH",
            &format!("/{}/status", booked.id),
            Some(&app.as_other_doctor()),
            Some(json!({ "status": "completed" })),
        )
        .await;
    let (_, body) = app
        .send("GET", &format!("/{}", booked.id), Some(&app.as_doctor()), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "scheduled");
}

#[tokio::test]
async fn update_cannot_hand_the_appointment_to_another_patient() {
    let app = TestApp::new().await;
    let booked = app.booked().await;
    let other = app
        .fixtures
        .store
        .find_patient_by_email("dee.park@clinic.test")
        .await
        .unwrap()
        .unwrap();
    let uri = format!("/{}", booked.id);
    let moved_to = |patient_id: Uuid| {
        json!({
            "doctor_id": app.doctor.id,
            "patient_id": patient_id,
            "scheduled_at": "2024-05-01T10:00:00Z",
            "status": "scheduled"
        })
    };

    let (reassigned, _) = app
        .send("PUT", &uri, Some(&app.as_patient()), Some(moved_to(other.id)))
        .await;
    let (by_stranger, _) = app
        .send("PUT", &uri, Some(&app.as_other_patient()), Some(moved_to(other.id)))
        .await;
    let (_, body) = app.send("GET", &uri, Some(&app.as_patient()), None).await;

    assert_eq!(reassigned, StatusCode::UNAUTHORIZED);
    assert_eq!(by_stranger, StatusCode::UNAUTHORIZED);
    assert_eq!(body["patient_id"], app.patient.id.to_string());
    assert_eq!(body["scheduled_at"], "2024-05-01T09:00:00Z");
}

#[tokio::test]
async fn doctor_writes_one_prescription_per_appointment() {
    let app = TestApp::new().await;
    let booked = app.booked().await;
    let uri = format!("/{}/prescription", booked.id);
    let prescription = json!({ "medication": "Amoxicillin", "dosage": "500mg twice daily" });

    let (missing, _) = app.send("GET", &uri, Some(&app.as_doctor()), None).await;
    let (by_patient, _) = app
        .send("POST", &uri, Some(&app.as_patient()), Some(prescription.clone()))
        .await;
    let (by_other_doctor, _) = app
        .send("POST", &uri, Some(&app.as_other_doctor()), Some(prescription.clone()))
        .await;
    let (created, body) = app
        .send("POST", &uri, Some(&app.as_doctor()), Some(prescription.clone()))
        .await;
    let (again, _) = app
        .send("POST", &uri, Some(&app.as_doctor()), Some(prescription))
        .await;
    let (read, stored) = app.send("GET", &uri, Some(&app.as_doctor()), None).await;
    let (read_by_patient, _) = app.send("GET", &uri, Some(&app.as_patient()), None).await;
    let (read_by_other_doctor, _) = app.send("GET", &uri, Some(&app.as_other_doctor()), None).await;

    assert_eq!(missing, StatusCode::NOT_FOUND);
    assert_eq!(by_patient, StatusCode::FORBIDDEN);
    assert_eq!(by_other_doctor, StatusCode::UNAUTHORIZED);
    assert_eq!(created, StatusCode::CREATED);
    assert_eq!(body["medication"], "Amoxicillin");
    assert_eq!(again, StatusCode::CONFLICT);
    assert_eq!(read, StatusCode::OK);
    assert_eq!(stored["id"], body["id"]);
    assert_eq!(read_by_patient, StatusCode::FORBIDDEN);
    assert_eq!(read_by_other_doctor, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn canceling_drops_the_prescription() {
    let app = TestApp::new().await;
    let booked = app.booked().await;
    let uri = format!("/{}/prescription", booked.id);
    app.send(
        "POST",
        &uri,
        Some(&app.as_doctor()),
        Some(json!({ "medication": "Ibuprofen", "dosage": "200mg" })),
    )
    .await;

    let (canceled, _) = app
        .send("DELETE", &format!("/{}", booked.id), Some(&app.as_doctor()), None)
        .await;
    let (gone, _) = app.send("GET", &uri, Some(&app.as_doctor()), None).await;

    assert_eq!(canceled, StatusCode::OK);
    assert_eq!(gone, StatusCode::NOT_FOUND);
    assert!(app
        .fixtures
        .store
        .find_prescription_by_appointment(booked.id)
        .await
        .unwrap()
        .is_none());
}
