//! Session tokens

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // credential uid
    pub email: String,
    /// Session epoch of the credential when the token was issued
    pub epoch: i64,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn uid(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::InvalidToken)
    }
}

/// Issue a token, returning it with its lifetime in seconds
pub fn issue(
    uid: &Uuid,
    email: &str,
    epoch: i64,
    secret: &str,
    expiry_hours: i64,
) -> AppResult<(String, i64)> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(expiry_hours);

    let claims = Claims {
        sub: uid.to_string(),
        email: email.to_string(),
        epoch,
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Token generation failed: {}", e)))?;

    Ok((token, expiry_hours * 3600))
}

/// Verify JWT token and extract claims
pub fn decode_claims(token: &str, secret: &str) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_decode() {
        let uid = Uuid::new_v4();
        let (token, expires_in) = issue(&uid, "a@b.com", 3, "secret", 2).unwrap();
        assert_eq!(expires_in, 7200);

        let claims = decode_claims(&token, "secret").unwrap();
        assert_eq!(claims.uid().unwrap(), uid);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.epoch, 3);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let (token, _) = issue(&Uuid::new_v4(), "a@b.com", 0, "secret", 1).unwrap();
        assert!(matches!(
            decode_claims(&token, "other"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let (token, _) = issue(&Uuid::new_v4(), "a@b.com", 0, "secret", -2).unwrap();
        assert!(matches!(
            decode_claims(&token, "secret"),
            Err(AppError::TokenExpired)
        ));
    }
}
