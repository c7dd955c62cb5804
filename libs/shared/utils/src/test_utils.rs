use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::{AppConfig, BookingPolicy};
use shared_database::{AppointmentRepository, DoctorRepository, InMemoryStore, PatientRepository};
use shared_models::auth::{Role, Session};
use shared_models::{Appointment, AppointmentStatus, Doctor, Patient, TimeSlot};

use crate::jwt::TokenService;

pub struct TestConfig {
    pub jwt_secret: String,
    pub booking_policy: BookingPolicy,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            booking_policy: BookingPolicy::Strict,
        }
    }
}

impl TestConfig {
    pub fn permissive() -> Self {
        Self {
            booking_policy: BookingPolicy::Permissive,
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            jwt_secret: self.jwt_secret.clone(),
            booking_policy: self.booking_policy,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    pub fn token_service(&self) -> Arc<TokenService> {
        Arc::new(TokenService::from_config(&self.to_app_config()))
    }
}

pub struct TestUser {
    pub identifier: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(identifier: &str, role: Role) -> Self {
        Self {
            identifier: identifier.to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Role::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::Patient)
    }

    pub fn admin(username: &str) -> Self {
        Self::new(username, Role::Admin)
    }

    pub fn to_session(&self) -> Session {
        Session {
            identifier: self.identifier.clone(),
            role: self.role,
        }
    }

    /// `Authorization` header value for this user.
    pub fn bearer(&self, config: &TestConfig) -> String {
        format!(
            "Bearer {}",
            JwtTestUtils::create_test_token(self, &config.jwt_secret, Some(1))
        )
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    /// Builds a token by hand so tests can forge expired or mis-signed ones.
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.identifier,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// `2024-05-01`, `09:00` -> UTC instant.
pub fn at(date: &str, time: &str) -> DateTime<Utc> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("fixture date is YYYY-MM-DD");
    let time = NaiveTime::parse_from_str(time, "%H:%M").expect("fixture time is HH:MM");
    Utc.from_utc_datetime(&date.and_time(time))
}

fn email_for(name: &str) -> String {
    format!(
        "{}@clinic.test",
        name.to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(".")
    )
}

/// Seeds an `InMemoryStore` with directory entries and appointments.
pub struct TestFixtures {
    pub store: Arc<InMemoryStore>,
}

impl Default for TestFixtures {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixtures {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
        }
    }

    pub async fn doctor(&self, name: &str, specialty: &str, slots: &[&str]) -> Doctor {
        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: name.to_string(),
            specialty: specialty.to_string(),
            email: email_for(name),
            password_hash: String::new(),
            available_times: slots
                .iter()
                .map(|label| label.parse::<TimeSlot>().expect("fixture slot label"))
                .collect(),
        };
        self.store.save_doctor(doctor).await.expect("seed doctor")
    }

    pub async fn patient(&self, name: &str) -> Patient {
        let id = Uuid::new_v4();
        let patient = Patient {
            id,
            name: name.to_string(),
            email: email_for(name),
            phone: format!("+1-555-{}", &id.simple().to_string()[..7]),
            address: "1 Test Street".to_string(),
            password_hash: String::new(),
        };
        self.store.save_patient(patient).await.expect("seed patient")
    }

    pub async fn appointment(
        &self,
        doctor: &Doctor,
        patient: &Patient,
        scheduled_at: DateTime<Utc>,
        status: AppointmentStatus,
    ) -> Appointment {
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: doctor.id,
            patient_id: patient.id,
            scheduled_at,
            status,
        };
        self.store
            .insert_appointment_exclusive(appointment)
            .await
            .expect("seed appointment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();
        assert!(config.is_configured());
        assert_eq!(config.booking_policy, BookingPolicy::Strict);
        assert_eq!(TestConfig::permissive().to_app_config().booking_policy, BookingPolicy::Permissive);
    }

    #[test]
    fn hand_built_token_is_accepted_by_token_service() {
        let config = TestConfig::default();
        let user = TestUser::doctor("doc@clinic.test");
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

        let session = config.token_service().verify(&token).unwrap();
        assert_eq!(session, user.to_session());
        assert!(config
            .token_service()
            .verify(&JwtTestUtils::create_expired_token(&user, &config.jwt_secret))
            .is_err());
    }

    #[tokio::test]
    async fn fixtures_seed_the_store() {
        let fixtures = TestFixtures::new();
        let doctor = fixtures.doctor("Gregory House", "Diagnostics", &["09:00-10:00"]).await;
        let patient = fixtures.patient("Jane Roe").await;
        fixtures
            .appointment(&doctor, &patient, at("2024-05-01", "09:00"), AppointmentStatus::Scheduled)
            .await;

        assert_eq!(doctor.email, "gregory.house@clinic.test");
        assert_eq!(
            fixtures.store.list_appointments_by_patient(patient.id).await.unwrap().len(),
            1
        );
    }
}
