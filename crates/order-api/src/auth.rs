//! Credential verification and access token issuance

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sneakerstore_common::{AuthError, Claims, Credential};
use tracing::{debug, info};

use crate::storage::CredentialStore;

/// Lifetime of an issued access token
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Bootstrap account created on first startup
#[derive(Debug, Clone)]
pub struct SeedCredential {
    pub username: String,
    pub password: String,
}

impl Default for SeedCredential {
    fn default() -> Self {
        Self {
            username: "admin@admin.com".to_string(),
            password: "Admin".to_string(),
        }
    }
}

/// Verifies username/password pairs and signs access tokens
pub struct Authenticator {
    credentials: Arc<dyn CredentialStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Authenticator {
    /// Create an authenticator signing tokens with `signing_key`
    pub fn new(credentials: Arc<dyn CredentialStore>, signing_key: &str) -> Self {
        Self {
            credentials,
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
        }
    }

    /// Create the bootstrap credential if it does not exist yet.
    ///
    /// Returns `Ok(true)` if a credential was written.
    pub async fn ensure_seed_credential(&self, seed: &SeedCredential) -> Result<bool, AuthError> {
        if self.credentials.find_credential(&seed.username).await?.is_some() {
            info!("Admin user already exists");
            return Ok(false);
        }

        let credential = Credential::new(seed.username.clone(), hash_password(&seed.password)?);
        let created = self
            .credentials
            .insert_credential_if_absent(&credential)
            .await?;

        if created {
            info!("Admin user created successfully");
        } else {
            info!("Admin user already exists");
        }

        Ok(created)
    }

    /// Check a username/password pair and issue a signed token
    pub async fn authenticate(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<String, AuthError> {
        let (username, password) = match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
            _ => return Err(AuthError::MissingInput),
        };

        let credential = self
            .credentials
            .find_credential(username)
            .await?
            .ok_or(AuthError::NotFound)?;

        verify_password(password, &credential.password_hash)?;

        debug!("Issuing access token for: {}", credential.username);
        self.issue_token_at(&credential.username, Utc::now())
    }

    /// Sign a token for `username` as if issued at `issued_at`
    pub fn issue_token_at(
        &self,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            username: username.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::seconds(ACCESS_TOKEN_TTL_SECS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))
    }

    /// Validate signature and expiry, returning the embedded claims
    pub fn verify(&self, token: Option<&str>) -> Result<Claims, AuthError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AuthError::MissingToken),
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidOrExpiredToken)
    }
}

/// Hash a password with a fresh random salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredential)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const TEST_KEY: &str = "test-signing-key";

    async fn seeded_authenticator() -> (Authenticator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let authenticator = Authenticator::new(store.clone(), TEST_KEY);
        authenticator
            .ensure_seed_credential(&SeedCredential::default())
            .await
            .unwrap();
        (authenticator, store)
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let (authenticator, store) = seeded_authenticator().await;

        let first = store.find_credential("admin@admin.com").await.unwrap().unwrap();
        assert_ne!(first.password_hash, "Admin");

        let created = authenticator
            .ensure_seed_credential(&SeedCredential::default())
            .await
            .unwrap();
        assert!(!created);

        let second = store.find_credential("admin@admin.com").await.unwrap().unwrap();
        assert_eq!(first.password_hash, second.password_hash);
    }

    #[tokio::test]
    async fn test_authenticate_and_verify() {
        let (authenticator, _) = seeded_authenticator().await;

        let token = authenticator
            .authenticate(Some("admin@admin.com"), Some("Admin"))
            .await
            .unwrap();

        let claims = authenticator.verify(Some(&token)).unwrap();
        assert_eq!(claims.username, "admin@admin.com");
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_SECS);
    }

    #[tokio::test]
    async fn test_authenticate_missing_input() {
        let (authenticator, _) = seeded_authenticator().await;

        for (user, pass) in [
            (None, Some("Admin")),
            (Some("admin@admin.com"), None),
            (Some(""), Some("Admin")),
            (Some("admin@admin.com"), Some("")),
        ] {
            let err = authenticator.authenticate(user, pass).await.unwrap_err();
            assert!(matches!(err, AuthError::MissingInput));
        }
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let (authenticator, _) = seeded_authenticator().await;

        let err = authenticator
            .authenticate(Some("ghost@admin.com"), Some("Admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let (authenticator, _) = seeded_authenticator().await;

        let err = authenticator
            .authenticate(Some("admin@admin.com"), Some("admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_verify_missing_token() {
        let (authenticator, _) = seeded_authenticator().await;

        assert!(matches!(
            authenticator.verify(None).unwrap_err(),
            AuthError::MissingToken
        ));
        assert!(matches!(
            authenticator.verify(Some("")).unwrap_err(),
            AuthError::MissingToken
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let (authenticator, _) = seeded_authenticator().await;

        let issued_at = Utc::now() - Duration::seconds(ACCESS_TOKEN_TTL_SECS + 5);
        let token = authenticator
            .issue_token_at("admin@admin.com", issued_at)
            .unwrap();

        assert!(matches!(
            authenticator.verify(Some(&token)).unwrap_err(),
            AuthError::InvalidOrExpiredToken
        ));
    }

    #[tokio::test]
    async fn test_token_from_other_key_is_rejected() {
        let (authenticator, store) = seeded_authenticator().await;
        let other = Authenticator::new(store, "another-key");

        let token = other.issue_token_at("admin@admin.com", Utc::now()).unwrap();

        assert!(matches!(
            authenticator.verify(Some(&token)).unwrap_err(),
            AuthError::InvalidOrExpiredToken
        ));
        assert!(matches!(
            authenticator.verify(Some("not.a.token")).unwrap_err(),
            AuthError::InvalidOrExpiredToken
        ));
    }
}
