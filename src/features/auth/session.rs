//! Signed employee sessions carried in an HttpOnly cookie.
//!
//! Tokens are HS256 JWTs. The session middleware re-issues a token once its
//! remaining lifetime drops below the configured refresh threshold. Every
//! token carries the original login time, and no refresh reaches past
//! `login + max_lifetime`, after which the employee must sign in again.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::AuthenticatedEmployee;
use crate::core::config::SessionConfig;
use crate::core::error::AppError;

const ISSUER: &str = "issuesnap";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Employee id
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Login time, preserved across refreshes
    pub auth_time: i64,
    pub jti: String,
}

pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
    refresh_threshold_secs: i64,
    max_lifetime_secs: i64,
    cookie_name: String,
    cookie_secure: bool,
}

impl SessionManager {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl_secs: config.ttl.as_secs() as i64,
            refresh_threshold_secs: config.refresh_threshold.as_secs() as i64,
            max_lifetime_secs: config.max_lifetime.as_secs() as i64,
            cookie_name: config.cookie_name.clone(),
            cookie_secure: config.cookie_secure,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Issue a fresh session token for an employee who just logged in
    pub fn issue(&self, employee: &AuthenticatedEmployee) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        self.sign(employee, now, now)
    }

    fn sign(
        &self,
        employee: &AuthenticatedEmployee,
        auth_time: i64,
        now: i64,
    ) -> Result<String, AppError> {
        let claims = SessionClaims {
            sub: employee.id,
            email: employee.email.clone(),
            name: employee.display_name.clone(),
            iss: ISSUER.to_string(),
            iat: now,
            exp: (now + self.ttl_secs).min(self.hard_expiry(auth_time)),
            auth_time,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }

    /// Validate signature, issuer and expiry of a session token
    pub fn validate(&self, token: &str) -> Result<SessionClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected session token: {}", e);
                AppError::Unauthorized("Session expired or invalid".to_string())
            })
    }

    fn hard_expiry(&self, auth_time: i64) -> i64 {
        auth_time.saturating_add(self.max_lifetime_secs)
    }

    /// Whether a still-valid session is close enough to expiry to be re-issued.
    /// A session already capped at its hard expiry has nothing left to extend.
    pub fn needs_refresh(&self, claims: &SessionClaims, now: i64) -> bool {
        claims.exp - now < self.refresh_threshold_secs
            && claims.exp < self.hard_expiry(claims.auth_time)
    }

    /// Re-issue a session for the same employee and login, never past the hard expiry
    pub fn refresh(&self, claims: &SessionClaims, now: i64) -> Result<String, AppError> {
        if now >= self.hard_expiry(claims.auth_time) {
            return Err(AppError::Unauthorized(
                "Session reached its maximum lifetime".to_string(),
            ));
        }
        self.sign(&AuthenticatedEmployee::from(claims), claims.auth_time, now)
    }

    /// Cookie carrying a session token
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .build()
    }

    /// Cookie template used to clear the session
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), "")).path("/").build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{test_employee, test_session_config};

    #[test]
    fn test_issue_then_validate_keeps_identity() {
        let sessions = SessionManager::new(&test_session_config());
        let employee = test_employee();

        let token = sessions.issue(&employee).unwrap();
        let claims = sessions.validate(&token).unwrap();

        assert_eq!(AuthenticatedEmployee::from(&claims), employee);
        assert_eq!(claims.exp - claims.iat, 8 * 60 * 60);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let sessions = SessionManager::new(&test_session_config());
        let mut other_config = test_session_config();
        other_config.secret = "another-secret-that-is-long-enough-0000".to_string();
        let other = SessionManager::new(&other_config);

        let token = other.issue(&test_employee()).unwrap();
        assert!(matches!(
            sessions.validate(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = test_session_config();
        let sessions = SessionManager::new(&config);
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            email: "clerk@city.gov".to_string(),
            name: "Clerk".to_string(),
            iss: ISSUER.to_string(),
            iat: now - 120,
            exp: now - 60,
            auth_time: now - 120,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(sessions.validate(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let sessions = SessionManager::new(&test_session_config());
        assert!(sessions.validate("not.a.jwt").is_err());
    }

    #[test]
    fn test_needs_refresh_threshold() {
        let sessions = SessionManager::new(&test_session_config());
        let token = sessions.issue(&test_employee()).unwrap();
        let claims = sessions.validate(&token).unwrap();

        assert!(!sessions.needs_refresh(&claims, claims.iat));
        // one hour threshold: 30 minutes before expiry must refresh
        assert!(sessions.needs_refresh(&claims, claims.exp - 30 * 60));
    }

    #[test]
    fn test_refresh_keeps_login_time() {
        let sessions = SessionManager::new(&test_session_config());
        let token = sessions.issue(&test_employee()).unwrap();
        let claims = sessions.validate(&token).unwrap();

        let later = claims.iat + 7 * 60 * 60 + 30 * 60;
        let refreshed = sessions.refresh(&claims, later).unwrap();
        let fresh = sessions.validate(&refreshed).unwrap();

        assert_eq!(fresh.auth_time, claims.auth_time);
        assert_eq!(fresh.iat, later);
        assert_eq!(fresh.exp, later + 8 * 60 * 60);
    }

    #[test]
    fn test_refresh_is_capped_at_max_lifetime() {
        let sessions = SessionManager::new(&test_session_config());
        let token = sessions.issue(&test_employee()).unwrap();
        let claims = sessions.validate(&token).unwrap();
        let hard_expiry = claims.auth_time + 24 * 60 * 60;

        // 20 hours in: a full ttl would overshoot the 24 hour limit
        let refreshed = sessions
            .refresh(&claims, claims.auth_time + 20 * 60 * 60)
            .unwrap();
        let capped = sessions.validate(&refreshed).unwrap();
        assert_eq!(capped.exp, hard_expiry);
        assert!(!sessions.needs_refresh(&capped, hard_expiry - 60));

        assert!(matches!(
            sessions.refresh(&claims, hard_expiry),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let sessions = SessionManager::new(&test_session_config());
        let cookie = sessions.session_cookie("abc".to_string());

        assert_eq!(cookie.name(), "issuesnap_session");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }
}
