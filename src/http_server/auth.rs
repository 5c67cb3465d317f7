//! # Bearer Tokens
//!
//! HS256 JWTs whose subject is the owner id. Validation is stateless: no
//! catalog lookup, only signature, expiry, issuer and audience.

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::errors::{VaultError, VaultResult};
use crate::model::OwnerId;

/// Claims carried by a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerClaims {
    /// Owner id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
    pub iss: String,
}

#[derive(Clone)]
pub struct JwtManager {
    issuer: String,
    audience: String,
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::minutes(config.token_ttl_minutes),
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    /// Mint a token for `owner_id`
    pub fn issue_token(&self, owner_id: &OwnerId) -> VaultResult<String> {
        let now = Utc::now();
        let claims = OwnerClaims {
            sub: owner_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            aud: self.audience.clone(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| VaultError::Internal(format!("token generation failed: {}", e)))
    }

    /// Validate a token and return its owner
    pub fn validate_token(&self, token: &str) -> VaultResult<OwnerId> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<OwnerClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| VaultError::Unauthorized)?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| VaultError::Unauthorized)
    }

    /// Owner behind the `Authorization: Bearer` header
    pub fn authenticate(&self, headers: &HeaderMap) -> VaultResult<OwnerId> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .ok_or(VaultError::Unauthorized)?;
        self.validate_token(token.trim())
    }
}
