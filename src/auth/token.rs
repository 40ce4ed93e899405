use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{enums::Role, util_resp::FailureResponse};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenKeys {
    inner: Arc<Keys>,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_days: u32) -> Self {
        Self {
            inner: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                ttl: Duration::days(i64::from(ttl_days)),
            }),
        }
    }

    pub fn issue(
        &self,
        user_id: i32,
        email: &str,
        role: Role,
    ) -> Result<String, FailureResponse> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.inner.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.inner.encoding).map_err(|e| {
            tracing::error!("failed to sign token: {e}");
            FailureResponse::ServerError("Failed to issue token".to_string())
        })
    }

    pub fn verify(
        &self,
        token: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.inner.decoding, &Validation::default())
            .map(|data| data.claims)
    }
}
