use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Identity claims embedded in an access token.
///
/// The minimal projection of a user record that downstream handlers need.
/// Untrusted until the surrounding token has been verified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Normalized (lowercase) email address
    pub email: String,

    pub phone: Option<String>,

    /// Avatar reference
    pub image: Option<String>,
}

impl Claims {
    /// Create claims with the required identity fields.
    pub fn new(id: impl ToString, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.into(),
            email: email.into(),
            phone: None,
            image: None,
        }
    }

    /// Set phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Set avatar reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Signed token body: application payload plus registered fields.
///
/// Serialized as `{"payload": .., "iss": .., "iat": .., "exp": ..}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPayload<T> {
    pub payload: T,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl<T> TokenPayload<T> {
    /// Wrap a payload, stamping issuer and expiration.
    ///
    /// # Arguments
    /// * `payload` - Application claims
    /// * `issuer` - Issuing authority
    /// * `issued_at` - Issue instant
    /// * `lifetime` - Interval after which the token expires
    pub fn new(
        payload: T,
        issuer: impl Into<String>,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            payload,
            iss: issuer.into(),
            iat: issued_at.timestamp(),
            exp: (issued_at + lifetime).timestamp(),
        }
    }
}
