//! Input validation for parameter names, paths, enumerations and paging.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use homessm_ssm_model::error::SsmError;
use homessm_ssm_model::ssm_error;
use homessm_ssm_model::types::{DataType, ParameterTier, ParameterType};

/// Longest accepted parameter name, leading slash included.
pub const MAX_NAME_LEN: usize = 2048;

/// Most names a `GetParameters` or `DeleteParameters` call may carry.
pub const MAX_BATCH_NAMES: usize = 10;

/// Page size when `MaxResults` is absent.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// First path segments reserved for AWS-owned parameters.
const RESERVED_ROOTS: [&str; 2] = ["aws", "ssm"];

fn is_reserved(normalized: &str) -> bool {
    normalized
        .trim_start_matches('/')
        .split('/')
        .next()
        .is_some_and(|root| {
            RESERVED_ROOTS
                .iter()
                .any(|reserved| root.eq_ignore_ascii_case(reserved))
        })
}

/// Normalize a parameter name to its absolute storage form.
///
/// `db/password` becomes `/db/password`.
pub fn normalize_name(name: &str) -> Result<String, SsmError> {
    if name.is_empty() || name.ends_with('/') {
        return Err(ssm_error!(InvalidParameterName));
    }

    let normalized = if name.starts_with('/') {
        name.to_owned()
    } else {
        format!("/{name}")
    };

    if normalized.chars().count() > MAX_NAME_LEN || is_reserved(&normalized) {
        return Err(ssm_error!(InvalidParameterName));
    }
    Ok(normalized)
}

/// Validate a hierarchy path. Trailing slashes are dropped; the root is `/`.
pub fn normalize_path(path: &str) -> Result<String, SsmError> {
    if !path.starts_with('/') {
        return Err(SsmError::validation(format!(
            "The parameter path '{path}' must begin with a forward slash (/)."
        )));
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok("/".to_owned());
    }
    if trimmed.chars().count() > MAX_NAME_LEN || is_reserved(trimmed) {
        return Err(ssm_error!(InvalidParameterName));
    }
    Ok(trimmed.to_owned())
}

/// Resolve the requested type. Missing or unrecognized is unsupported.
pub fn parameter_type(requested: Option<&ParameterType>) -> Result<ParameterType, SsmError> {
    match requested {
        Some(t @ (ParameterType::String | ParameterType::StringList | ParameterType::SecureString)) => {
            Ok(t.clone())
        }
        _ => Err(ssm_error!(UnsupportedParameterType)),
    }
}

/// Resolve the requested tier. Blank means `Standard`.
pub fn parameter_tier(requested: Option<&ParameterTier>) -> Result<ParameterTier, SsmError> {
    match requested {
        None => Ok(ParameterTier::Standard),
        Some(ParameterTier::Unknown(s)) if s.is_empty() => Ok(ParameterTier::Standard),
        Some(ParameterTier::Unknown(_)) => Err(ssm_error!(InvalidParameterTier)),
        Some(tier) => Ok(tier.clone()),
    }
}

/// Resolve the requested data type. Blank means `text`.
pub fn data_type(requested: Option<&DataType>) -> Result<DataType, SsmError> {
    match requested {
        None => Ok(DataType::Text),
        Some(DataType::Unknown(s)) if s.is_empty() => Ok(DataType::Text),
        Some(DataType::Unknown(_)) => Err(ssm_error!(InvalidDataType)),
        Some(data_type) => Ok(data_type.clone()),
    }
}

/// Check a batch of names against [`MAX_BATCH_NAMES`].
pub fn batch_size(names: &[String]) -> Result<(), SsmError> {
    if names.is_empty() {
        return Err(SsmError::validation(
            "1 validation error detected: Value at 'names' failed to satisfy constraint: \
             Member must have length greater than or equal to 1",
        ));
    }
    if names.len() > MAX_BATCH_NAMES {
        return Err(SsmError::validation(format!(
            "1 validation error detected: Value at 'names' failed to satisfy constraint: \
             Member must have length less than or equal to {MAX_BATCH_NAMES}"
        )));
    }
    Ok(())
}

/// Resolve `MaxResults` against an upper bound.
pub fn page_size(max_results: Option<i32>, upper: usize) -> Result<usize, SsmError> {
    let Some(requested) = max_results else {
        return Ok(DEFAULT_PAGE_SIZE.min(upper));
    };
    match usize::try_from(requested) {
        Ok(n) if (1..=upper).contains(&n) => Ok(n),
        _ => Err(SsmError::validation(format!(
            "1 validation error detected: Value '{requested}' at 'maxResults' failed to satisfy \
             constraint: Member must have value between 1 and {upper}"
        ))),
    }
}

/// Encode the name a page ended on as a continuation token.
#[must_use]
pub fn encode_next_token(last_name: &str) -> String {
    STANDARD.encode(last_name.as_bytes())
}

/// Decode a continuation token back to the name the previous page ended on.
pub fn decode_next_token(token: &str) -> Result<String, SsmError> {
    STANDARD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .filter(|name| name.starts_with('/'))
        .ok_or_else(|| ssm_error!(InvalidNextToken))
}
