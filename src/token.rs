use crate::errors::AuthError;
use crate::models::{Claims, User};
use anyhow::Result;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies signed session tokens and keeps the process-wide
/// revocation set. A token is `hex(claims-json).hex(hmac-sha256)`; anyone
/// holding one is that user until it expires or is revoked.
///
/// The revocation set lives only as long as the process. A restart clears it,
/// which shortens no token's natural lifetime but forgets explicit logouts.
pub struct TokenAuthenticator {
    secret: Vec<u8>,
    ttl: Duration,
    revoked: Arc<RwLock<HashSet<String>>>,
}

impl TokenAuthenticator {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl,
            revoked: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Sign a session token for `user` with the configured TTL.
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = SystemTime::now();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.ttl,
        };

        let payload = serde_json::to_vec(&claims)?;
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| anyhow::anyhow!("invalid signing key: {e}"))?;
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        Ok(format!("{}.{}", hex::encode(&payload), hex::encode(signature)))
    }

    /// Verify a bearer token and return its claims.
    ///
    /// Revocation is checked first: a well-formed but revoked token must
    /// never reach the signature or expiry checks as trusted input.
    pub async fn verify(&self, token: Option<&str>) -> Result<Claims, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;

        if self.revoked.read().await.contains(token) {
            return Err(AuthError::Revoked);
        }

        let (payload_hex, signature_hex) =
            token.split_once('.').ok_or(AuthError::Invalid)?;
        let payload = hex::decode(payload_hex).map_err(|_| AuthError::Invalid)?;
        let signature = hex::decode(signature_hex).map_err(|_| AuthError::Invalid)?;

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::Invalid)?;
        mac.update(&payload);
        mac.verify_slice(&signature).map_err(|_| AuthError::Invalid)?;

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::Invalid)?;

        if SystemTime::now() > claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    /// Add a token to the revocation set. Revoking twice is a no-op.
    pub async fn revoke(&self, token: &str) {
        self.revoked.write().await.insert(token.to_owned());
    }
}
