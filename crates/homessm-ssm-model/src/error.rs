//! SSM error types.
//!
//! Errors are returned as JSON with a `__type` field. Several authentication
//! failures share a wire type (for example `AccessDenied`) while keeping
//! distinct descriptions and status codes.

use std::fmt;

/// Every error HomeSSM can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum SsmErrorCode {
    // Authentication
    /// Request rejected by access control.
    AccessDenied,
    /// Unexpected server failure.
    #[default]
    InternalError,
    /// Access key is not configured.
    InvalidAccessKeyId,
    /// A required header is not in the signed set.
    UnsignedHeaders,
    /// Neither `x-amz-date` nor `Date` is present.
    MissingDateHeader,
    /// Authorization header lacks a required field.
    MissingFields,
    /// Authorization header has no `Credential=`.
    MissingCredentialTag,
    /// Credential scope has the wrong shape.
    MalformedCredential,
    /// Credential scope date is not `YYYYMMDD`.
    MalformedCredentialDate,
    /// Credential scope names the wrong region.
    AuthorizationHeaderMalformed,
    /// Credential scope names another service.
    InvalidServiceForEndpoint,
    /// Credential scope does not end in `aws4_request`.
    InvalidRequestTerminal,
    /// Authorization header has no `Signature=`.
    MissingSignatureTag,
    /// Authorization header has no `SignedHeaders=`.
    MissingSignedHeadersTag,
    /// Request timestamp does not parse.
    MalformedDate,
    /// Computed signature differs from the provided one.
    SignatureDoesNotMatch,
    /// Authorization header is missing or empty.
    AuthHeaderEmpty,
    /// Algorithm is not `AWS4-HMAC-SHA256`.
    UnsupportedSignatureVersion,

    // Parameter API
    /// Malformed or out-of-range request.
    ValidationError,
    /// Parameter does not exist.
    ParameterNotFound,
    /// Parameter exists and overwrite was not requested.
    ParameterAlreadyExists,
    /// Key reference matches no encryption key.
    InvalidKeyId,
    /// Parameter name is malformed or reserved.
    InvalidParameterName,
    /// Unknown parameter tier.
    InvalidParameterTier,
    /// Unknown data type.
    InvalidDataType,
    /// Unknown or disallowed filter key.
    InvalidFilterKey,
    /// Filter option does not fit the key.
    InvalidFilterOption,
    /// Filter value is missing or malformed.
    InvalidFilterValue,
    /// Parameter type is missing or unknown.
    UnsupportedParameterType,
    /// Value does not match `AllowedPattern`.
    ParameterPatternMismatch,
    /// Continuation token does not decode.
    InvalidNextToken,
}

impl SsmErrorCode {
    /// The `__type` written on the wire.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::AccessDenied
            | Self::UnsignedHeaders
            | Self::MissingDateHeader
            | Self::MissingSignatureTag => "AccessDenied",
            Self::MissingCredentialTag | Self::UnsupportedSignatureVersion => "InvalidRequest",
            Self::MalformedCredential
            | Self::MalformedCredentialDate
            | Self::InvalidRequestTerminal => "AuthorizationQueryParametersError",
            Self::InvalidServiceForEndpoint => "AuthorizationParametersError",
            Self::MissingSignedHeadersTag | Self::AuthHeaderEmpty => "InvalidArgument",
            other => other.as_str(),
        }
    }

    /// The variant name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::InternalError => "InternalError",
            Self::InvalidAccessKeyId => "InvalidAccessKeyId",
            Self::UnsignedHeaders => "UnsignedHeaders",
            Self::MissingDateHeader => "MissingDateHeader",
            Self::MissingFields => "MissingFields",
            Self::MissingCredentialTag => "MissingCredentialTag",
            Self::MalformedCredential => "MalformedCredential",
            Self::MalformedCredentialDate => "MalformedCredentialDate",
            Self::AuthorizationHeaderMalformed => "AuthorizationHeaderMalformed",
            Self::InvalidServiceForEndpoint => "InvalidServiceForEndpoint",
            Self::InvalidRequestTerminal => "InvalidRequestTerminal",
            Self::MissingSignatureTag => "MissingSignatureTag",
            Self::MissingSignedHeadersTag => "MissingSignedHeadersTag",
            Self::MalformedDate => "MalformedDate",
            Self::SignatureDoesNotMatch => "SignatureDoesNotMatch",
            Self::AuthHeaderEmpty => "AuthHeaderEmpty",
            Self::UnsupportedSignatureVersion => "UnsupportedSignatureVersion",
            Self::ValidationError => "ValidationError",
            Self::ParameterNotFound => "ParameterNotFound",
            Self::ParameterAlreadyExists => "ParameterAlreadyExists",
            Self::InvalidKeyId => "InvalidKeyId",
            Self::InvalidParameterName => "InvalidParameterName",
            Self::InvalidParameterTier => "InvalidParameterTier",
            Self::InvalidDataType => "InvalidDataType",
            Self::InvalidFilterKey => "InvalidFilterKey",
            Self::InvalidFilterOption => "InvalidFilterOption",
            Self::InvalidFilterValue => "InvalidFilterValue",
            Self::UnsupportedParameterType => "UnsupportedParameterType",
            Self::ParameterPatternMismatch => "ParameterPatternMismatch",
            Self::InvalidNextToken => "InvalidNextToken",
        }
    }

    /// Message used when no more specific one is given.
    #[must_use]
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::AccessDenied => "Access Denied.",
            Self::InternalError => "We encountered an internal error, please try again.",
            Self::InvalidAccessKeyId => {
                "The Access Key Id you provided does not exist in our records."
            }
            Self::UnsignedHeaders => {
                "There were headers present in the request which were not signed"
            }
            Self::MissingDateHeader => {
                "AWS authentication requires a valid Date or x-amz-date header"
            }
            Self::MissingFields => "Missing fields in request.",
            Self::MissingCredentialTag => "Missing Credential field for this request.",
            Self::MalformedCredential => {
                "Error parsing the X-Amz-Credential parameter; the Credential is mal-formed; \
                 expecting \"<YOUR-AKID>/YYYYMMDD/REGION/SERVICE/aws4_request\"."
            }
            Self::MalformedCredentialDate => {
                "Error parsing the X-Amz-Credential parameter; incorrect date format. \
                 This date in the credential must be in the format \"yyyyMMdd\"."
            }
            Self::AuthorizationHeaderMalformed => {
                "The authorization header is malformed; the region is wrong."
            }
            Self::InvalidServiceForEndpoint => {
                "Error parsing the Credential/X-Amz-Credential parameter; incorrect service. \
                 This endpoint belongs to \"ssm\"."
            }
            Self::InvalidRequestTerminal => {
                "Error parsing the X-Amz-Credential parameter; incorrect terminal. \
                 This endpoint uses \"aws4_request\"."
            }
            Self::MissingSignatureTag => "Signature header missing Signature field.",
            Self::MissingSignedHeadersTag => "Signature header missing SignedHeaders field.",
            Self::MalformedDate => {
                "Invalid date format header, expected to be in ISO8601, RFC1123 or RFC1123Z \
                 time format."
            }
            Self::SignatureDoesNotMatch => {
                "The request signature we calculated does not match the signature you \
                 provided. Check your key and signing method."
            }
            Self::AuthHeaderEmpty => {
                "Authorization header is invalid -- one and only one ' ' (space) required."
            }
            Self::UnsupportedSignatureVersion => {
                "The authorization mechanism you have provided is not supported. \
                 Please use AWS4-HMAC-SHA256."
            }
            Self::ValidationError => "The request failed validation.",
            Self::ParameterNotFound => "The Parameter Name provided does not exist.",
            Self::ParameterAlreadyExists => {
                "The parameter already exists. You can't create duplicate parameters."
            }
            Self::InvalidKeyId => "The Parameter KeyId is not valid.",
            Self::InvalidParameterName => "The Parameter Name is not valid.",
            Self::InvalidParameterTier => "The Parameter Tier is not valid.",
            Self::InvalidDataType => "The Parameter DataType is not valid.",
            Self::InvalidFilterKey => "The specified key isn't valid.",
            Self::InvalidFilterOption => {
                "The specified filter option isn't valid. Valid options are Equals and \
                 BeginsWith. For Path filter, valid options are Recursive and OneLevel."
            }
            Self::InvalidFilterValue => {
                "The filter value isn't valid. Verify the value and try again."
            }
            Self::UnsupportedParameterType => "The Parameter Type is not supported.",
            Self::ParameterPatternMismatch => {
                "The parameter value doesn't meet the pattern requirements."
            }
            Self::InvalidNextToken => "The specified token isn't valid.",
        }
    }

    /// Default HTTP status code.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::AccessDenied | Self::InvalidAccessKeyId | Self::SignatureDoesNotMatch => {
                http::StatusCode::FORBIDDEN
            }
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
            _ => http::StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for SsmErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An SSM error response.
#[derive(Debug)]
pub struct SsmError {
    /// The error code.
    pub code: SsmErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for SsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SsmError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for SsmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl SsmError {
    /// Create an error with the code's default message.
    #[must_use]
    pub fn new(code: SsmErrorCode) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: code.default_message().to_owned(),
            code,
            source: None,
        }
    }

    /// Create an error with a custom message.
    #[must_use]
    pub fn with_message(code: SsmErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the `__type` string for the JSON error response.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        self.code.error_type()
    }

    // -- Convenience constructors --

    /// Validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(SsmErrorCode::ValidationError, message)
    }

    /// Internal error with the generic message.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::new(SsmErrorCode::InternalError)
    }

    /// Parameter not found.
    #[must_use]
    pub fn parameter_not_found(name: &str) -> Self {
        Self::with_message(
            SsmErrorCode::ParameterNotFound,
            format!("Parameter {name} not found."),
        )
    }

    /// Missing `X-Amz-Target` header.
    #[must_use]
    pub fn missing_action() -> Self {
        Self::validation("Missing required header: X-Amz-Target")
    }

    /// Unknown operation.
    #[must_use]
    pub fn unknown_operation(target: &str) -> Self {
        Self::validation(format!("Unrecognized operation: {target}"))
    }
}

/// Create an `SsmError` from an error code.
///
/// # Examples
///
/// ```
/// use homessm_ssm_model::error::SsmErrorCode;
/// use homessm_ssm_model::ssm_error;
///
/// let err = ssm_error!(InvalidParameterName);
/// assert_eq!(err.code, SsmErrorCode::InvalidParameterName);
///
/// let err = ssm_error!(ValidationError, "bad input");
/// assert_eq!(err.message, "bad input");
/// ```
#[macro_export]
macro_rules! ssm_error {
    ($code:ident) => {
        $crate::error::SsmError::new($crate::error::SsmErrorCode::$code)
    };
    ($code:ident, $msg:expr) => {
        $crate::error::SsmError::with_message($crate::error::SsmErrorCode::$code, $msg)
    };
}
