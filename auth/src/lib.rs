//! Authentication utilities library
//!
//! Provides the authentication core shared by services:
//! - Signing key provisioning (RSA key pair on disk)
//! - Password hashing (Argon2id)
//! - Signed bearer token issuance and verification
//! - Authentication coordination
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::with_cost(1024, 1, 1).unwrap();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! ```
//!
//! ## Tokens
//! ```no_run
//! use auth::{Claims, KeyProvider, SigningKeys, TokenService, TokenSettings};
//! use chrono::Duration;
//! use jsonwebtoken::Algorithm;
//!
//! let provider = KeyProvider::new("keys");
//! provider.ensure_keypair().unwrap();
//! let keys = SigningKeys::from_key_pair(&provider.load().unwrap()).unwrap();
//!
//! let settings = TokenSettings::new("journal", Algorithm::RS512, Duration::hours(24));
//! let tokens = TokenService::new(settings, keys);
//!
//! let claims = Claims::new("user123", "Alice", "alice@example.com");
//! let token = tokens.issue(&claims).unwrap();
//! let decoded: Claims = tokens.verify(&token).unwrap();
//! assert_eq!(decoded, claims);
//! ```

pub mod authenticator;
pub mod jwt;
pub mod keys;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::TokenPayload;
pub use jwt::TokenService;
pub use jwt::TokenSettings;
pub use keys::KeyError;
pub use keys::KeyPair;
pub use keys::KeyProvider;
pub use keys::KeyStatus;
pub use keys::SigningKeys;
pub use password::PasswordError;
pub use password::PasswordHasher;
