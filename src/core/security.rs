use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;
use crate::db::types::UserRole;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("jwt encoding failed")]
    JwtEncoding,
    #[error("invalid session")]
    InvalidSession,
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SessionClaims {
    pub(crate) sub: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

pub(crate) fn session_lifetime(settings: &Settings) -> Duration {
    Duration::minutes(settings.security().access_token_expire_minutes as i64)
}

pub(crate) fn issue_session(
    account_id: &str,
    email: &str,
    role: UserRole,
    settings: &Settings,
) -> Result<String, SecurityError> {
    issue_session_with_lifetime(account_id, email, role, settings, session_lifetime(settings))
}

pub(crate) fn issue_session_with_lifetime(
    account_id: &str,
    email: &str,
    role: UserRole,
    settings: &Settings,
    lifetime: Duration,
) -> Result<String, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let now = OffsetDateTime::now_utc();

    let claims = SessionClaims {
        sub: account_id.to_string(),
        email: email.to_string(),
        role,
        iat: now.unix_timestamp(),
        exp: (now + lifetime).unix_timestamp(),
    };

    encode(
        &Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(settings.security().secret_key.as_bytes()),
    )
    .map_err(|_| SecurityError::JwtEncoding)
}

pub(crate) fn validate_session(
    token: &str,
    settings: &Settings,
) -> Result<SessionClaims, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    let claims = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(settings.security().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::InvalidSession)?;

    if claims.sub.is_empty() {
        return Err(SecurityError::InvalidSession);
    }

    Ok(claims)
}

fn algorithm_from_settings(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.security().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn session_roundtrip_carries_identity_and_role() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let token = issue_session("account-1", "student@example.com", UserRole::Student, &settings)
            .expect("token");
        let claims = validate_session(&token, &settings).expect("claims");

        assert_eq!(claims.sub, "account-1");
        assert_eq!(claims.email, "student@example.com");
        assert_eq!(claims.role, UserRole::Student);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let token = issue_session_with_lifetime(
            "account-1",
            "student@example.com",
            UserRole::Student,
            &settings,
            Duration::seconds(-10),
        )
        .expect("token");

        assert!(matches!(
            validate_session(&token, &settings),
            Err(SecurityError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn session_signed_with_other_secret_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        std::env::set_var("JWT_SECRET", "another-secret");
        let foreign = Settings::load().expect("foreign settings");
        test_support::set_test_env();

        let token = issue_session("account-1", "admin@example.com", UserRole::Admin, &foreign)
            .expect("token");

        assert!(validate_session(&token, &settings).is_err());
    }

    #[tokio::test]
    async fn tampered_session_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let token = issue_session("account-1", "student@example.com", UserRole::Student, &settings)
            .expect("token");
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = issue_session("account-1", "student@example.com", UserRole::Admin, &settings)
            .expect("forged");
        // Swap in the payload of another token while keeping the original signature.
        parts[1] = forged.split('.').nth(1).expect("payload").to_string();

        assert!(validate_session(&parts.join("."), &settings).is_err());
    }
}
