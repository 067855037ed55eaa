use thiserror::Error;

/// Error type for token operations.
///
/// Every variant except `EncodingFailed` and `KeyUnavailable` means the
/// presented token must be rejected. The distinction between them is meant
/// for server logs only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Signing key material is unavailable")]
    KeyUnavailable,

    #[error("Token is missing")]
    MissingToken,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token algorithm is not allowed: {0}")]
    AlgorithmNotAllowed(String),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token issuer is invalid")]
    InvalidIssuer,

    #[error("Token is expired")]
    TokenExpired,

    #[error("Failed to decode token: {0}")]
    DecodingFailed(String),
}

impl JwtError {
    /// Whether this error is a rejection of the presented token.
    pub fn is_invalid_token(&self) -> bool {
        !matches!(self, JwtError::EncodingFailed(_) | JwtError::KeyUnavailable)
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
            ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
                JwtError::AlgorithmNotAllowed(err.to_string())
            }
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
                JwtError::Malformed(err.to_string())
            }
            _ => JwtError::DecodingFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_invalid_token() {
        assert!(JwtError::MissingToken.is_invalid_token());
        assert!(JwtError::Malformed("x".into()).is_invalid_token());
        assert!(JwtError::AlgorithmNotAllowed("HS256".into()).is_invalid_token());
        assert!(JwtError::InvalidSignature.is_invalid_token());
        assert!(JwtError::InvalidIssuer.is_invalid_token());
        assert!(JwtError::TokenExpired.is_invalid_token());
        assert!(JwtError::DecodingFailed("x".into()).is_invalid_token());
    }

    #[test]
    fn test_server_side_failures_are_not_invalid_token() {
        assert!(!JwtError::EncodingFailed("x".into()).is_invalid_token());
        assert!(!JwtError::KeyUnavailable.is_invalid_token());
    }

    #[test]
    fn test_from_jsonwebtoken_kind() {
        use jsonwebtoken::errors::ErrorKind;

        let expired: jsonwebtoken::errors::Error = ErrorKind::ExpiredSignature.into();
        assert_eq!(JwtError::from(expired), JwtError::TokenExpired);

        let issuer: jsonwebtoken::errors::Error = ErrorKind::InvalidIssuer.into();
        assert_eq!(JwtError::from(issuer), JwtError::InvalidIssuer);

        let signature: jsonwebtoken::errors::Error = ErrorKind::InvalidSignature.into();
        assert_eq!(JwtError::from(signature), JwtError::InvalidSignature);
    }
}
