//! Signed session tokens and the process-wide validity set.
//!
//! Tokens are HS256 JWTs carrying the user's id and email plus a random
//! `jti`. Issued tokens are recorded in a [`TokenStore`]; revoking removes
//! them. The store lives in memory only, so a restart implicitly invalidates
//! every outstanding token.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

const DEFAULT_TTL_MINS: i64 = 60;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Claims {
    /// The user's id.
    pub sub: String,
    pub email: String,
    /// Issued-at (UTC Unix timestamp).
    pub iat: i64,
    /// Expiry (UTC Unix timestamp).
    pub exp: i64,
    /// Random token identifier, so two logins never share a token string.
    pub jti: String,
}

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No token was supplied at all.
    Missing,
    /// The token is not in the validity set (revoked, or issued before a
    /// restart).
    Revoked,
    /// Signature or expiry check failed.
    Invalid,
}

/// Set of currently valid token strings, shared across requests.
///
/// Injectable so tests can seed or inspect it; cloned handles share the same
/// underlying set.
#[derive(Clone, Default)]
pub struct TokenStore(Arc<RwLock<HashSet<String>>>);

impl TokenStore {
    pub fn insert(&self, token: &str) {
        self.0.write().unwrap().insert(token.to_string());
    }

    pub fn remove(&self, token: &str) {
        self.0.write().unwrap().remove(token);
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.read().unwrap().contains(token)
    }
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_mins: i64,
    store: TokenStore,
}

impl TokenService {
    pub fn new(secret: &str, ttl_mins: i64) -> Self {
        Self::with_store(secret, ttl_mins, TokenStore::default())
    }

    pub fn with_store(secret: &str, ttl_mins: i64, store: TokenStore) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_mins,
            store,
        }
    }

    pub fn ttl_mins(&self) -> i64 {
        self.ttl_mins
    }

    /// Read the token TTL from `JWT_TTL_MINS`, defaulting to one hour.
    pub fn ttl_from_env() -> i64 {
        std::env::var("JWT_TTL_MINS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_MINS)
    }

    /// Sign a token for the given identity and record it as valid.
    pub fn issue(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();

        let mut jti_bytes = [0u8; 16];
        StdRng::from_entropy().fill_bytes(&mut jti_bytes);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl_mins * 60,
            jti: hex::encode(jti_bytes),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        self.store.insert(&token);
        Ok(token)
    }

    /// Check a token and return the decoded identity.
    ///
    /// Rejection order matches the validity-set design: a missing token is
    /// `Missing`, a token outside the set is `Revoked` (without looking at
    /// the signature), and only then does signature/expiry verification run.
    pub fn validate(&self, token: Option<&str>) -> Result<Claims, Rejection> {
        let token = token.ok_or(Rejection::Missing)?;

        if !self.store.contains(token) {
            return Err(Rejection::Revoked);
        }

        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| Rejection::Invalid)
    }

    /// Drop a token from the validity set. Subsequent `validate` calls fail
    /// with [`Rejection::Revoked`].
    pub fn revoke(&self, token: &str) {
        self.store.remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> TokenService {
        TokenService::new("test-secret-that-is-long-enough-for-hmac", 60)
    }

    #[test]
    fn issue_then_validate_returns_identity() {
        let service = test_service();
        let token = service
            .issue("user-1", "a@example.com")
            .expect("issue should succeed");

        let claims = service
            .validate(Some(&token))
            .expect("freshly issued token should validate");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "a@example.com");
        assert!(claims.exp > claims.iat);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn missing_token_is_rejected() {
        let service = test_service();
        assert_eq!(service.validate(None), Err(Rejection::Missing));
    }

    #[test]
    fn revoked_token_is_rejected_before_expiry() {
        let service = test_service();
        let token = service.issue("user-1", "a@example.com").unwrap();

        service.revoke(&token);
        assert_eq!(service.validate(Some(&token)), Err(Rejection::Revoked));
    }

    #[test]
    fn unknown_token_is_rejected_as_revoked() {
        let service = test_service();
        assert_eq!(
            service.validate(Some("not-a-real-token")),
            Err(Rejection::Revoked)
        );
    }

    #[test]
    fn expired_token_is_invalid() {
        let service = test_service();

        // Craft an already-expired token, well past the default 60s leeway,
        // and force it into the validity set so the expiry check is what
        // rejects it.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "a@example.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            jti: "0".repeat(32),
        };
        let token = encode(&Header::default(), &claims, &service.encoding)
            .expect("encoding should succeed");
        service.store.insert(&token);

        assert_eq!(service.validate(Some(&token)), Err(Rejection::Invalid));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let service = test_service();
        let other = TokenService::new("a-completely-different-secret", 60);

        let token = other.issue("user-1", "a@example.com").unwrap();
        // Share the store entry so the signature check is reached.
        service.store.insert(&token);

        assert_eq!(service.validate(Some(&token)), Err(Rejection::Invalid));
    }

    #[test]
    fn stores_cloned_from_the_same_set_share_revocations() {
        let store = TokenStore::default();
        let a = TokenService::with_store("shared-secret", 60, store.clone());
        let b = TokenService::with_store("shared-secret", 60, store);

        let token = a.issue("user-1", "a@example.com").unwrap();
        assert!(b.validate(Some(&token)).is_ok());

        b.revoke(&token);
        assert_eq!(a.validate(Some(&token)), Err(Rejection::Revoked));
    }
}
