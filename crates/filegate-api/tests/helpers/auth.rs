use filegate_api::auth::Claims;
use jsonwebtoken::{encode, EncodingKey, Header};

/// Must be at least 32 characters, like the production secret.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

pub const TEST_SERVICE_KEY: &str = "test-service-key-0123456789abcdef";

/// Signed access token for `user_id`, valid for five minutes.
pub fn token_for(user_id: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 300) as usize,
        email: Some(format!("{}@example.com", user_id)),
        aud: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// `Authorization` header value for `user_id`.
pub fn bearer(user_id: &str) -> String {
    format!("Bearer {}", token_for(user_id))
}
