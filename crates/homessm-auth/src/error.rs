//! Error types for SigV4 verification.
//!
//! Each variant is a distinct failure the HTTP layer maps to its own wire
//! error code, so callers can tell a typo in the credential scope apart from
//! an unknown key or a bad signature.

/// Errors that can occur while verifying an AWS Signature Version 4 request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The `Authorization` header is missing or blank.
    #[error("Authorization header is empty")]
    AuthHeaderEmpty,

    /// The header does not start with `AWS4-HMAC-SHA256`.
    #[error("unsupported signature version")]
    UnsupportedSignatureVersion,

    /// The header does not split into the three expected fields, or one of
    /// them has no value.
    #[error("missing fields in Authorization header")]
    MissingFields,

    /// The first field is not `Credential=...`.
    #[error("missing Credential field")]
    MissingCredentialTag,

    /// The credential has fewer than five `/`-separated segments.
    #[error("malformed credential")]
    MalformedCredential,

    /// The credential date is not an 8-digit calendar date.
    #[error("malformed credential date: {0}")]
    MalformedCredentialDate(String),

    /// The credential region does not match the configured region.
    #[error("region mismatch: expected '{expected}', got '{actual}'")]
    RegionMismatch {
        /// Configured region.
        expected: String,
        /// Region found in the credential scope.
        actual: String,
    },

    /// The credential service is not the one this endpoint serves.
    #[error("invalid service '{0}' for this endpoint")]
    InvalidService(String),

    /// The credential scope terminal is not `aws4_request`.
    #[error("invalid request terminal '{0}'")]
    InvalidRequestTerminal(String),

    /// The second field is not `SignedHeaders=...`.
    #[error("missing SignedHeaders field")]
    MissingSignedHeadersTag,

    /// The third field is not `Signature=...`.
    #[error("missing Signature field")]
    MissingSignatureTag,

    /// The access key is too short or not configured.
    #[error("invalid access key id: {0}")]
    InvalidAccessKeyId(String),

    /// `host` is not signed, or a signed header is absent from the request.
    #[error("unsigned or missing header: {0}")]
    UnsignedHeaders(String),

    /// Neither `X-Amz-Date` nor `Date` is present.
    #[error("missing X-Amz-Date or Date header")]
    MissingDateHeader,

    /// The timestamp header is not ISO-8601 basic format.
    #[error("malformed date: {0}")]
    MalformedDate(String),

    /// The computed signature does not match the provided one.
    #[error("signature does not match")]
    SignatureDoesNotMatch,
}
