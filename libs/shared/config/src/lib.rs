use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// How strictly a booking is checked against the doctor's open slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingPolicy {
    /// Reject any booking whose time is not one of the doctor's open slots.
    #[default]
    Strict,
    /// Legacy behaviour: an existing doctor is enough, slots are not checked.
    Permissive,
}

impl fmt::Display for BookingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingPolicy::Strict => write!(f, "strict"),
            BookingPolicy::Permissive => write!(f, "permissive"),
        }
    }
}

impl FromStr for BookingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(BookingPolicy::Strict),
            "permissive" | "legacy" => Ok(BookingPolicy::Permissive),
            other => Err(format!("unknown booking policy '{}', expected strict or permissive", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub booking_policy: BookingPolicy,
    pub admin_username: String,
    pub admin_password_hash: String,
    pub bind_address: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 24,
            booking_policy: BookingPolicy::Strict,
            admin_username: "admin".to_string(),
            admin_password_hash: String::new(),
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .ok()
                .and_then(|raw| match raw.parse::<i64>() {
                    Ok(hours) if hours > 0 => Some(hours),
                    _ => {
                        warn!("TOKEN_TTL_HOURS '{}' is not a positive integer, using default", raw);
                        None
                    }
                })
                .unwrap_or(defaults.token_ttl_hours),
            booking_policy: env::var("BOOKING_POLICY")
                .ok()
                .and_then(|raw| match raw.parse::<BookingPolicy>() {
                    Ok(policy) => Some(policy),
                    Err(e) => {
                        warn!("{}, using strict", e);
                        None
                    }
                })
                .unwrap_or_default(),
            admin_username: env::var("ADMIN_USERNAME")
                .unwrap_or_else(|_| defaults.admin_username.clone()),
            admin_password_hash: env::var("ADMIN_PASSWORD_HASH")
                .unwrap_or_else(|_| {
                    warn!("ADMIN_PASSWORD_HASH not set, admin login disabled");
                    String::new()
                }),
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| defaults.bind_address.clone()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if config.booking_policy == BookingPolicy::Permissive {
            warn!("Booking policy is permissive: slot availability will not block bookings");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    pub fn is_admin_login_enabled(&self) -> bool {
        !self.admin_password_hash.is_empty()
    }
}
