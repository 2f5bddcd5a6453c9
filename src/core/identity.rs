use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::core::config::Settings;

const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub(crate) enum IdentityError {
    #[error("identity provider is not configured")]
    NotConfigured,
    #[error("invalid credential: {0}")]
    InvalidCredential(&'static str),
    #[error("failed to fetch issuer keys: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VerifiedIdentity {
    pub(crate) subject: String,
    pub(crate) email: String,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<serde_json::Value>,
}

#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

/// Verifies Google ID tokens against the issuer's published signing keys.
#[derive(Clone)]
pub(crate) struct IdentityVerifier {
    client_id: String,
    issuers: Vec<String>,
    jwks_url: String,
    cache_ttl: Duration,
    http: reqwest::Client,
    cache: Arc<RwLock<KeyCache>>,
}

impl IdentityVerifier {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let google = settings.google();
        let http = reqwest::Client::builder().timeout(JWKS_FETCH_TIMEOUT).build()?;

        Ok(Self {
            client_id: google.client_id.clone(),
            issuers: google.issuers.clone(),
            jwks_url: google.jwks_url.clone(),
            cache_ttl: Duration::from_secs(google.jwks_cache_seconds),
            http,
            cache: Arc::new(RwLock::new(KeyCache::default())),
        })
    }

    pub(crate) async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, IdentityError> {
        if self.client_id.is_empty() {
            return Err(IdentityError::NotConfigured);
        }

        let header = decode_header(credential)
            .map_err(|_| IdentityError::InvalidCredential("malformed token"))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidCredential("unexpected signing algorithm"));
        }
        let kid = header.kid.ok_or(IdentityError::InvalidCredential("missing key id"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(self.issuers.as_slice());
        validation.validate_exp = true;
        validation.required_spec_claims.insert("sub".to_string());

        let claims = {
            let key = self.signing_key(&kid).await?;
            decode::<IdTokenClaims>(credential, &key, &validation)
                .map_err(|_| IdentityError::InvalidCredential("signature or claims rejected"))?
                .claims
        };

        identity_from_claims(claims)
    }

    pub(crate) async fn load_key_set(&self, set: JwkSet) -> usize {
        let mut keys = HashMap::with_capacity(set.keys.len());
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(err) => tracing::warn!(error = %err, kid, "Skipping unusable issuer key"),
            }
        }

        let loaded = keys.len();
        let mut cache = self.cache.write().await;
        cache.keys = keys;
        cache.fetched_at = Some(Instant::now());
        loaded
    }

    async fn signing_key(&self, kid: &str) -> Result<DecodingKey, IdentityError> {
        {
            let cache = self.cache.read().await;
            let fresh = cache.fetched_at.is_some_and(|at| at.elapsed() < self.cache_ttl);
            if fresh {
                if let Some(key) = cache.keys.get(kid) {
                    return Ok(key.clone());
                }
            }
        }

        self.refresh_keys().await?;

        let cache = self.cache.read().await;
        cache.keys.get(kid).cloned().ok_or(IdentityError::InvalidCredential("unknown signing key"))
    }

    async fn refresh_keys(&self) -> Result<(), IdentityError> {
        let set = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| IdentityError::Upstream(err.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|err| IdentityError::Upstream(err.to_string()))?;

        let loaded = self.load_key_set(set).await;
        tracing::debug!(keys = loaded, "Refreshed issuer signing keys");
        Ok(())
    }
}

fn identity_from_claims(claims: IdTokenClaims) -> Result<VerifiedIdentity, IdentityError> {
    let email = claims
        .email
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
        .ok_or(IdentityError::InvalidCredential("missing email"))?;

    // Google has sent this both as a JSON bool and as a string.
    let verified = match claims.email_verified {
        None => true,
        Some(serde_json::Value::Bool(value)) => value,
        Some(serde_json::Value::String(value)) => value.eq_ignore_ascii_case("true"),
        Some(_) => false,
    };
    if !verified {
        return Err(IdentityError::InvalidCredential("email not verified"));
    }

    Ok(VerifiedIdentity {
        subject: claims.sub,
        email,
    })
}
