use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::claims::TokenPayload;
use super::errors::JwtError;
use crate::keys::SigningKeys;

/// Issuance and verification settings shared by every token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSettings {
    pub issuer: String,
    pub algorithm: Algorithm,
    pub lifetime: Duration,
}

impl TokenSettings {
    pub fn new(issuer: impl Into<String>, algorithm: Algorithm, lifetime: Duration) -> Self {
        Self {
            issuer: issuer.into(),
            algorithm,
            lifetime,
        }
    }

    /// Whether `algorithm` is an asymmetric RSA signature scheme usable with
    /// the key pair produced by `KeyProvider`.
    pub fn is_supported_algorithm(algorithm: Algorithm) -> bool {
        matches!(
            algorithm,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        )
    }
}

/// Signs and verifies bearer tokens with an RSA key pair.
///
/// Generic over the payload type so services can choose their own claims.
/// Tokens are signed with the private key and verified with the public key.
/// Verification accepts only the configured algorithm and issuer, requires
/// `exp` and `iss`, and allows no clock leeway.
pub struct TokenService {
    settings: TokenSettings,
    keys: Option<SigningKeys>,
    validation: Validation,
}

impl TokenService {
    /// Create a token service backed by loaded key material.
    pub fn new(settings: TokenSettings, keys: SigningKeys) -> Self {
        Self::build(settings, Some(keys))
    }

    /// Create a token service with no key material.
    ///
    /// Every issue and verify call fails with `KeyUnavailable`.
    pub fn without_keys(settings: TokenSettings) -> Self {
        Self::build(settings, None)
    }

    fn build(settings: TokenSettings, keys: Option<SigningKeys>) -> Self {
        let mut validation = Validation::new(settings.algorithm);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            settings,
            keys,
            validation,
        }
    }

    fn keys(&self) -> Result<&SigningKeys, JwtError> {
        self.keys.as_ref().ok_or(JwtError::KeyUnavailable)
    }

    /// Sign `payload` into a token issued now.
    ///
    /// # Errors
    /// * `KeyUnavailable` - No private key loaded
    /// * `EncodingFailed` - Serialization or signing failed
    pub fn issue<T: Serialize>(&self, payload: &T) -> Result<String, JwtError> {
        self.issue_at(payload, Utc::now())
    }

    /// Sign `payload` into a token issued at `issued_at`.
    ///
    /// Expiration is `issued_at` plus the configured lifetime.
    ///
    /// # Errors
    /// * `KeyUnavailable` - No private key loaded
    /// * `EncodingFailed` - Serialization or signing failed
    pub fn issue_at<T: Serialize>(
        &self,
        payload: &T,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let keys = self.keys()?;
        let body = TokenPayload::new(
            payload,
            self.settings.issuer.as_str(),
            issued_at,
            self.settings.lifetime,
        );

        encode(&Header::new(self.settings.algorithm), &body, &keys.encoding)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify a token and return its payload.
    ///
    /// # Errors
    /// * `KeyUnavailable` - No public key loaded
    /// * `MissingToken` - Empty token
    /// * `Malformed` - Not three non-empty dot-separated segments, or undecodable header
    /// * `AlgorithmNotAllowed` - Header algorithm differs from the configured one
    /// * `InvalidSignature` - Signature does not match the key pair
    /// * `TokenExpired` - `exp` is in the past
    /// * `InvalidIssuer` - `iss` differs from the configured issuer
    /// * `DecodingFailed` - Missing claims or payload of the wrong shape
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        let keys = self.keys()?;

        check_shape(token)?;

        let header = decode_header(token).map_err(|e| JwtError::Malformed(e.to_string()))?;
        if header.alg != self.settings.algorithm {
            return Err(JwtError::AlgorithmNotAllowed(format!("{:?}", header.alg)));
        }

        let token_data = decode::<TokenPayload<T>>(token, &keys.decoding, &self.validation)?;

        Ok(token_data.claims.payload)
    }
}

/// Compact serialization: three non-empty, whitespace-free segments.
fn check_shape(token: &str) -> Result<(), JwtError> {
    if token.is_empty() {
        return Err(JwtError::MissingToken);
    }

    let segments: Vec<&str> = token.split('.').collect();
    let well_formed = segments.len() == 3
        && segments
            .iter()
            .all(|s| !s.is_empty() && !s.chars().any(char::is_whitespace));

    if well_formed {
        Ok(())
    } else {
        Err(JwtError::Malformed(
            "expected three non-empty dot-separated segments".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::EncodingKey;

    use super::*;
    use crate::jwt::claims::Claims;
    use crate::keys::testing;

    const ISSUER: &str = "journal-test";

    fn settings() -> TokenSettings {
        TokenSettings::new(ISSUER, Algorithm::RS512, Duration::hours(24))
    }

    fn service() -> TokenService {
        let keys = SigningKeys::from_key_pair(testing::key_pair()).unwrap();
        TokenService::new(settings(), keys)
    }

    fn claims() -> Claims {
        Claims::new("8d0e2a1c-1111-4f00-9c1b-3b7a6b2c9d10", "Alice", "alice@example.com")
            .with_phone("5551234567")
            .with_image("default.png")
    }

    #[test]
    fn test_issue_and_verify() {
        let service = service();

        let token = service.issue(&claims()).expect("Failed to issue token");
        assert_eq!(token.split('.').count(), 3);

        let decoded: Claims = service.verify(&token).expect("Failed to verify token");
        assert_eq!(decoded, claims());
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let other_keys = SigningKeys::from_key_pair(testing::other_key_pair()).unwrap();
        let other = TokenService::new(settings(), other_keys);

        let token = other.issue(&claims()).unwrap();

        let result = service().verify::<Claims>(&token);
        assert_eq!(result, Err(JwtError::InvalidSignature));
    }

    #[test]
    fn test_verify_rejects_swapped_payload() {
        let service = service();
        let original = service.issue(&claims()).unwrap();
        let forged_source = service
            .issue(&Claims::new("someone-else", "Mallory", "mallory@example.com"))
            .unwrap();

        let original_segments: Vec<&str> = original.split('.').collect();
        let forged_segments: Vec<&str> = forged_source.split('.').collect();
        let tampered = format!(
            "{}.{}.{}",
            original_segments[0], forged_segments[1], original_segments[2]
        );

        let result = service.verify::<Claims>(&tampered);
        assert_eq!(result, Err(JwtError::InvalidSignature));
    }

    #[test]
    fn test_verify_rejects_expired() {
        let service = service();
        let issued_at = Utc::now() - Duration::hours(25);

        let token = service.issue_at(&claims(), issued_at).unwrap();

        let result = service.verify::<Claims>(&token);
        assert_eq!(result, Err(JwtError::TokenExpired));
    }

    #[test]
    fn test_verify_rejects_wrong_issuer() {
        let keys = SigningKeys::from_key_pair(testing::key_pair()).unwrap();
        let foreign = TokenService::new(
            TokenSettings::new("someone-else", Algorithm::RS512, Duration::hours(24)),
            keys,
        );

        let token = foreign.issue(&claims()).unwrap();

        let result = service().verify::<Claims>(&token);
        assert_eq!(result, Err(JwtError::InvalidIssuer));
    }

    #[test]
    fn test_verify_rejects_other_rsa_algorithm() {
        let keys = SigningKeys::from_key_pair(testing::key_pair()).unwrap();
        let rs256 = TokenService::new(
            TokenSettings::new(ISSUER, Algorithm::RS256, Duration::hours(24)),
            keys,
        );

        let token = rs256.issue(&claims()).unwrap();

        let result = service().verify::<Claims>(&token);
        assert!(matches!(result, Err(JwtError::AlgorithmNotAllowed(_))));
    }

    #[test]
    fn test_verify_rejects_hmac_signed_with_public_key() {
        let public_pem = testing::key_pair().public_pem();
        let body = TokenPayload::new(claims(), ISSUER, Utc::now(), Duration::hours(1));
        let token = encode(
            &Header::new(Algorithm::HS256),
            &body,
            &EncodingKey::from_secret(public_pem.as_bytes()),
        )
        .unwrap();

        let result = service().verify::<Claims>(&token);
        assert!(matches!(result, Err(JwtError::AlgorithmNotAllowed(_))));
    }

    #[test]
    fn test_verify_rejects_none_algorithm() {
        let service = service();
        let token = service.issue(&claims()).unwrap();
        let payload = token.split('.').nth(1).unwrap();

        // {"alg":"none","typ":"JWT"}
        let none_header = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";

        let unsigned = format!("{}.{}.", none_header, payload);
        assert!(matches!(
            service.verify::<Claims>(&unsigned),
            Err(JwtError::Malformed(_))
        ));

        let fake_signature = format!("{}.{}.c2lnbmF0dXJl", none_header, payload);
        assert!(matches!(
            service.verify::<Claims>(&fake_signature),
            Err(JwtError::Malformed(_))
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_shapes() {
        let service = service();

        for token in ["malformed", "a.b", "a..c", ".b.c", "a.b.c.d", "a b.c.d"] {
            let result = service.verify::<Claims>(token);
            assert!(
                matches!(result, Err(JwtError::Malformed(_))),
                "expected malformed for {:?}, got {:?}",
                token,
                result
            );
        }
    }

    #[test]
    fn test_verify_rejects_empty_token() {
        assert_eq!(service().verify::<Claims>(""), Err(JwtError::MissingToken));
    }

    #[test]
    fn test_three_segments_of_garbage_are_malformed() {
        let result = service().verify::<Claims>("abc.def.ghi");
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_without_keys() {
        let service = TokenService::without_keys(settings());

        assert_eq!(service.issue(&claims()), Err(JwtError::KeyUnavailable));
        assert_eq!(
            service.verify::<Claims>("a.b.c"),
            Err(JwtError::KeyUnavailable)
        );
    }

    #[test]
    fn test_supported_algorithms() {
        assert!(TokenSettings::is_supported_algorithm(Algorithm::RS512));
        assert!(TokenSettings::is_supported_algorithm(Algorithm::PS256));
        assert!(!TokenSettings::is_supported_algorithm(Algorithm::HS256));
        assert!(!TokenSettings::is_supported_algorithm(Algorithm::ES256));
        assert!(!TokenSettings::is_supported_algorithm(Algorithm::EdDSA));
    }
}
