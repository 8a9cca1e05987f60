//! HS256 access tokens issued by the identity provider, plus an optional static
//! service key for service-to-service calls.

use async_trait::async_trait;
use filegate_core::models::Principal;
use filegate_core::AppError;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::Authenticator;

/// Claims read from an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id; becomes `uploaded_by`
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

pub struct JwtAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
    service_api_key: Option<String>,
}

impl JwtAuthenticator {
    pub fn new(secret: &str, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            service_api_key: None,
        }
    }

    /// Also accept `key` verbatim as a bearer credential, resolving to the service principal.
    pub fn with_service_key(mut self, key: Option<String>) -> Self {
        self.service_api_key = key.filter(|k| !k.is_empty());
        self
    }

    fn is_service_key(&self, token: &str) -> bool {
        match &self.service_api_key {
            Some(key) => {
                key.len() == token.len() && bool::from(key.as_bytes().ct_eq(token.as_bytes()))
            }
            None => false,
        }
    }

    fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        AppError::Unauthorized("Token has expired".to_string())
                    }
                    ErrorKind::InvalidAudience => {
                        AppError::Unauthorized("Invalid token audience".to_string())
                    }
                    _ => AppError::Unauthorized("Invalid token".to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Principal, AppError> {
        if self.is_service_key(token) {
            return Ok(Principal::service());
        }

        let claims = self.validate_token(token)?;
        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized("Token has no subject".to_string()));
        }

        Ok(Principal {
            id: claims.sub,
            email: claims.email,
        })
    }
}
