use crate::models::user::{Claims, Role};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use std::env;

const DEFAULT_SECRET: &str = "your-secret-key-change-in-production";

/// Absolute token lifetime; there is no sliding renewal and no revocation
/// list, so a token stays valid until this expiry.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Hash a password using Argon2 with a per-user random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

/// Verify a password against a stored hash; never a plaintext comparison
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(password_hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Sole issuer and verifier of session tokens. Built once at startup from
/// `JWT_SECRET` and injected where needed; handlers never read the secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    uses_default: bool,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        TokenIssuer {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            uses_default: secret == DEFAULT_SECRET,
        }
    }

    pub fn from_env() -> Self {
        let secret = env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());
        Self::new(&secret)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.uses_default
    }

    /// Issue a signed token carrying user id and role, expiring in one hour.
    pub fn issue(&self, user_id: &str, role: Role) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_owned(),
            role,
            iat: now as usize,
            exp: (now + TOKEN_TTL_SECS) as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(token_data.claims)
    }
}
