use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{JwtClaims, JwtHeader, Role, Session};

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.jwt_secret.clone(), config.token_ttl_hours)
    }

    fn mac(&self) -> Result<HmacSha256, String> {
        if self.secret.is_empty() {
            return Err("JWT secret is not set".to_string());
        }
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| "Failed to create HMAC".to_string())
    }

    pub fn generate(&self, identifier: &str, role: Role) -> Result<String, String> {
        let now = Utc::now();
        let header = JwtHeader {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let claims = JwtClaims {
            sub: identifier.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let header_json = serde_json::to_vec(&header).map_err(|e| e.to_string())?;
        let claims_json = serde_json::to_vec(&claims).map_err(|e| e.to_string())?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        debug!("Issued {} token for {}", role, identifier);
        Ok(format!("{}.{}", signing_input, signature))
    }

    pub fn verify(&self, token: &str) -> Result<Session, String> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err("Invalid token format".to_string());
        }

        let (header_b64, claims_b64, signature_b64) = (parts[0], parts[1], parts[2]);

        let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
            Ok(sig) => sig,
            Err(e) => {
                debug!("Failed to decode signature: {}", e);
                return Err("Invalid signature encoding".to_string());
            }
        };

        let mut mac = self.mac()?;
        mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());
        if mac.verify_slice(&signature).is_err() {
            debug!("Token signature verification failed");
            return Err("Invalid token signature".to_string());
        }

        let claims: JwtClaims = match URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|e| e.to_string())
            .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|e| e.to_string()))
        {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Failed to parse claims: {}", e);
                return Err("Invalid claims format".to_string());
            }
        };

        let now = Utc::now().timestamp();
        if claims.exp < now {
            debug!("Token expired at {} (now: {})", claims.exp, now);
            return Err("Token expired".to_string());
        }

        Ok(Session {
            identifier: claims.sub,
            role: claims.role,
        })
    }

    /// True only for a well-formed, unexpired token carrying `expected` as its role.
    pub fn validate(&self, token: &str, expected: Role) -> bool {
        matches!(self.verify(token), Ok(session) if session.role == expected)
    }

    pub fn extract_identifier(&self, token: &str) -> Result<String, String> {
        self.verify(token).map(|session| session.identifier)
    }
}
