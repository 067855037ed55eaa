use std::sync::Arc;
use std::sync::OnceLock;

use auth::Authenticator;
use auth::KeyPair;
use auth::PasswordHasher;
use auth::SigningKeys;
use auth::TokenService;
use auth::TokenSettings;
use chrono::Duration;
use jsonwebtoken::Algorithm;

pub const ISSUER: &str = "journal-test";

static KEY_PAIR: OnceLock<KeyPair> = OnceLock::new();
static FOREIGN_KEY_PAIR: OnceLock<KeyPair> = OnceLock::new();

fn generate() -> KeyPair {
    KeyPair::generate(2048).expect("Failed to generate key pair")
}

fn settings() -> TokenSettings {
    TokenSettings::new(ISSUER, Algorithm::RS512, Duration::hours(1))
}

fn build(token_service: TokenService) -> Arc<Authenticator> {
    Arc::new(Authenticator::new(
        PasswordHasher::with_cost(1024, 1, 1).expect("Failed to build hasher"),
        token_service,
    ))
}

/// Authenticator over a shared 2048-bit key pair with a cheap hashing cost.
pub fn authenticator() -> Arc<Authenticator> {
    let keys = SigningKeys::from_key_pair(KEY_PAIR.get_or_init(generate))
        .expect("Failed to load signing keys");
    build(TokenService::new(settings(), keys))
}

/// Authenticator whose token operations fail with `KeyUnavailable`.
pub fn keyless_authenticator() -> Arc<Authenticator> {
    build(TokenService::without_keys(settings()))
}

/// A well-formed token signed by a key this process does not trust.
pub fn foreign_token() -> String {
    let keys = SigningKeys::from_key_pair(FOREIGN_KEY_PAIR.get_or_init(generate))
        .expect("Failed to load signing keys");
    TokenService::new(settings(), keys)
        .issue(&auth::Claims::new(
            uuid::Uuid::new_v4(),
            "Mallory",
            "mallory@x.com",
        ))
        .expect("Failed to issue token")
}
