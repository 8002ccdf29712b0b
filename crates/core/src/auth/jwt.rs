//! JWT session authentication.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Claims carried by a session token.
///
/// The subject is read from `id`, falling back to the registered `sub` claim.
/// Numeric subjects are accepted and normalized to strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(alias = "sub", deserialize_with = "deserialize_subject")]
    pub id: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

fn deserialize_subject<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Subject {
        Text(String),
        Number(i64),
    }

    Ok(match Subject::deserialize(deserializer)? {
        Subject::Text(s) => s,
        Subject::Number(n) => n.to_string(),
    })
}

/// Authenticator that verifies HS256-signed session tokens.
///
/// Accepts the token in the `Authorization: Bearer <token>` header.
pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mint a token for `user_id` valid for `ttl`.
    pub fn issue(&self, user_id: &str, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            id: user_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::ConfigurationError(format!("Token generation failed: {}", e)))
    }

    /// Extract the bearer token from request headers.
    fn extract_token<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        let auth_header = request.headers.get("authorization")?;
        auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let token = self
            .extract_token(request)
            .ok_or(AuthError::NotAuthenticated)?;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;

        let mut claims = HashMap::new();
        claims.insert("exp".to_string(), serde_json::json!(data.claims.exp));
        claims.insert("iat".to_string(), serde_json::json!(data.claims.iat));

        Ok(Identity {
            user_id: data.claims.id,
            method: "jwt".to_string(),
            claims,
        })
    }

    fn method_name(&self) -> &'static str {
        "jwt"
    }
}
