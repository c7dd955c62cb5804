use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;
use shared_database::{DoctorRepository, PatientRepository};
use shared_models::auth::{Role, TokenResponse};
use shared_utils::TokenService;

use crate::models::AuthError;
use crate::services::password::PasswordService;

/// Exchanges role-scoped credentials for a session token.
pub struct LoginService {
    doctors: Arc<dyn DoctorRepository>,
    patients: Arc<dyn PatientRepository>,
    tokens: Arc<TokenService>,
    config: Arc<AppConfig>,
}

impl LoginService {
    pub fn new(
        doctors: Arc<dyn DoctorRepository>,
        patients: Arc<dyn PatientRepository>,
        tokens: Arc<TokenService>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            doctors,
            patients,
            tokens,
            config,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        role: Role,
        identifier: &str,
        password: &str,
    ) -> Result<TokenResponse, AuthError> {
        debug!("Login attempt for {} as {}", identifier, role);

        let stored_hash = match role {
            Role::Doctor => self
                .doctors
                .find_doctor_by_email(identifier)
                .await?
                .map(|doctor| doctor.password_hash),
            Role::Patient => self
                .patients
                .find_patient_by_email(identifier)
                .await?
                .map(|patient| patient.password_hash),
            Role::Admin => {
                if self.config.is_admin_login_enabled() && identifier == self.config.admin_username {
                    Some(self.config.admin_password_hash.clone())
                } else {
                    None
                }
            }
        };

        let Some(stored_hash) = stored_hash else {
            warn!("Login rejected for {} as {}: unknown account", identifier, role);
            return Err(AuthError::InvalidCredentials);
        };

        match PasswordService::verify_password(password, &stored_hash) {
            Ok(true) => {}
            Ok(false) => {
                warn!("Login rejected for {} as {}: wrong password", identifier, role);
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                warn!("Stored credential for {} is unusable: {}", identifier, e);
                return Err(AuthError::InvalidCredentials);
            }
        }

        let token = self
            .tokens
            .generate(identifier, role)
            .map_err(AuthError::TokenIssue)?;

        info!("{} logged in as {}", identifier, role);
        Ok(TokenResponse { token, role })
    }
}
