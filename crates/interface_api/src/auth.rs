//! Authentication
//!
//! Bearer JWTs carry the user id in `sub`. Passwords are hashed with
//! argon2 (PHC string format, random salt per hash).

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::UserId;
use domain_membership::{CredentialHasher, MembershipError};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// The authenticated user
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Could not issue token: {0}")]
    Issue(String),
}

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_LIFETIME_SECS: u64 = 366 * 24 * 60 * 60;

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - Becomes the `sub` claim
/// * `email` - Informational, not used for authorization
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds, at most [`MAX_TOKEN_LIFETIME_SECS`]
pub fn create_token(
    user_id: UserId,
    email: &str,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let lifetime = i64::try_from(expiration_secs)
        .ok()
        .filter(|_| expiration_secs <= MAX_TOKEN_LIFETIME_SECS)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| AuthError::Issue(format!("token lifetime of {}s is too long", expiration_secs)))?;
    let now = Utc::now();
    let exp = now
        .checked_add_signed(lifetime)
        .ok_or_else(|| AuthError::Issue("token expiry is out of range".to_string()))?;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Issue(e.to_string()))
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Argon2id password hashing with default parameters
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, MembershipError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| MembershipError::Credential(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trips_user_id() {
        let user = UserId::new_v7();
        let token = create_token(user, "owner@example.com", SECRET, 60).unwrap();

        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), user);
        assert_eq!(claims.email, "owner@example.com");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(UserId::new_v7(), "a@b.co", SECRET, 60).unwrap();
        assert!(matches!(
            validate_token(&token, "other-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_reported() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: UserId::new_v7().to_string(),
            email: "a@b.co".into(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(validate_token(&token, SECRET), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn absurd_lifetime_is_an_error() {
        for secs in [MAX_TOKEN_LIFETIME_SECS + 1, i64::MAX as u64, u64::MAX] {
            assert!(matches!(
                create_token(UserId::new_v7(), "a@b.co", SECRET, secs),
                Err(AuthError::Issue(_))
            ));
        }
        assert!(create_token(UserId::new_v7(), "a@b.co", SECRET, MAX_TOKEN_LIFETIME_SECS).is_ok());
    }

    #[test]
    fn garbage_subject_is_invalid() {
        let claims = Claims {
            sub: "not-a-user".into(),
            email: String::new(),
            exp: 0,
            iat: 0,
        };
        assert!(claims.user_id().is_err());
    }

    #[test]
    fn argon2_hash_verifies_only_the_original() {
        let hasher = Argon2Hasher;
        let hash = hasher.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("battery staple", &hash));
        assert!(!hasher.verify("correct horse", "not-a-phc-string"));
    }
}
