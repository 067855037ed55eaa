use std::fmt;

use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs1::LineEnding;
use rsa::rand_core::OsRng;
use rsa::RsaPrivateKey;
use rsa::RsaPublicKey;

use super::errors::KeyError;

/// PEM-encoded RSA key pair used to sign and verify tokens.
///
/// Both halves are PKCS#1 PEM text. The private half is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    private_pem: String,
    public_pem: String,
}

impl KeyPair {
    /// Modulus size used when none is configured.
    pub const DEFAULT_BITS: usize = 4096;

    /// Smallest modulus accepted for signing keys.
    pub const MIN_BITS: usize = 2048;

    /// Wrap existing PEM text.
    pub fn new(private_pem: String, public_pem: String) -> Self {
        Self {
            private_pem,
            public_pem,
        }
    }

    /// Generate a fresh RSA key pair.
    ///
    /// # Arguments
    /// * `bits` - Modulus size (at least `MIN_BITS`)
    ///
    /// # Errors
    /// * `GenerationFailed` - Modulus too small, or key generation or PEM encoding failed
    pub fn generate(bits: usize) -> Result<Self, KeyError> {
        if bits < Self::MIN_BITS {
            return Err(KeyError::GenerationFailed(format!(
                "modulus of {} bits is below the minimum of {}",
                bits,
                Self::MIN_BITS
            )));
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| KeyError::GenerationFailed(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| KeyError::GenerationFailed(e.to_string()))?;
        let public_pem = public_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| KeyError::GenerationFailed(e.to_string()))?;

        Ok(Self {
            private_pem: private_pem.as_str().to_owned(),
            public_pem,
        })
    }

    pub fn private_pem(&self) -> &str {
        &self.private_pem
    }

    pub fn public_pem(&self) -> &str {
        &self.public_pem
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_pem", &"<redacted>")
            .field("public_pem", &self.public_pem)
            .finish()
    }
}

/// Parsed signing material ready for use by the token service.
///
/// Built once at startup and shared read-only across requests.
#[derive(Clone)]
pub struct SigningKeys {
    pub(crate) encoding: EncodingKey,
    pub(crate) decoding: DecodingKey,
}

impl SigningKeys {
    /// Parse both halves of a key pair.
    ///
    /// # Errors
    /// * `InvalidKey` - Either PEM document is not a usable RSA key
    pub fn from_key_pair(pair: &KeyPair) -> Result<Self, KeyError> {
        let encoding = EncodingKey::from_rsa_pem(pair.private_pem().as_bytes())
            .map_err(|e| KeyError::InvalidKey(format!("private key: {}", e)))?;
        let decoding = DecodingKey::from_rsa_pem(pair.public_pem().as_bytes())
            .map_err(|e| KeyError::InvalidKey(format!("public key: {}", e)))?;

        Ok(Self { encoding, decoding })
    }
}

impl fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKeys { .. }")
    }
}
