use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Verified session token payload, injected into request extensions by the
/// auth middleware.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub id: i32,
    pub username: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}

pub fn create_jwt(user_id: i32, username: &str, secret: &str, ttl_hours: i64) -> Result<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| anyhow::anyhow!("token expiry overflow"))?
        .timestamp();

    let claims = Claims {
        id: user_id,
        username: username.to_owned(),
        exp: expiration as usize,
        iat: now.timestamp() as usize,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_cycle() {
        let secret = "test_secret";
        let token = create_jwt(7, "alice", secret, 24).unwrap();
        let claims = validate_jwt(&token, secret).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_jwt_wrong_secret() {
        let token = create_jwt(7, "alice", "one", 24).unwrap();
        assert!(validate_jwt(&token, "two").is_err());
    }

    #[test]
    fn test_jwt_expired() {
        // Validation allows 60s of leeway, so go well past it.
        let token = create_jwt(7, "alice", "s", -2).unwrap();
        assert!(validate_jwt(&token, "s").is_err());
    }
}
