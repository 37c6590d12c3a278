//! AWS Signature Version 4 verification.
//!
//! The flow mirrors what an SDK does when signing, run in reverse:
//!
//! 1. Parse and validate the `Authorization` header and its credential scope.
//! 2. Resolve the secret for the access key.
//! 3. Rebuild the canonical request from the signed headers.
//! 4. Derive the signing key and compute the expected signature.
//! 5. Compare it to the provided signature in constant time.
//!
//! The main entry point is [`SigV4Verifier::verify`].

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::{build_canonical_request, build_signed_headers_string};
use crate::credentials::{Credential, CredentialProvider};
use crate::error::AuthError;

/// The only supported signing algorithm.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Credential scope terminator.
pub const TERMINAL: &str = "aws4_request";

/// Service name of the parameter API.
pub const SERVICE_SSM: &str = "ssm";

/// SHA-256 of an empty payload.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Largest request body read for payload hashing (10 MiB).
pub const MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

const ISO8601_BASIC: &str = "%Y%m%dT%H%M%SZ";
const SCOPE_DATE: &str = "%Y%m%d";

type HmacSha256 = Hmac<Sha256>;

/// The result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// Access key that signed the request.
    pub access_key_id: String,
    /// Owner label of that access key.
    pub owner: String,
    /// Region from the credential scope.
    pub region: String,
    /// Service from the credential scope.
    pub service: String,
    /// Signed header names, as listed by the client.
    pub signed_headers: Vec<String>,
}

/// The `Credential=` element of the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    /// Access key ID. May itself contain `/`.
    pub access_key_id: String,
    /// Scope date (`YYYYMMDD`).
    pub date: String,
    /// Scope region.
    pub region: String,
    /// Scope service.
    pub service: String,
}

impl CredentialScope {
    /// `<date>/<region>/<service>/aws4_request`.
    #[must_use]
    pub fn scope(&self) -> String {
        format!("{}/{}/{}/{TERMINAL}", self.date, self.region, self.service)
    }
}

/// Parsed components of a SigV4 `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAuth {
    /// Credential scope.
    pub credential: CredentialScope,
    /// Signed header names in the order given.
    pub signed_headers: Vec<String>,
    /// Hex-encoded signature.
    pub signature: String,
}

/// Parse and validate an `Authorization` header against the expected region
/// and service.
///
/// All whitespace is removed before parsing. An empty `region` accepts any
/// scope region.
///
/// # Errors
///
/// Returns the [`AuthError`] naming the first field that fails validation.
pub fn parse_authorization_header(
    header: &str,
    region: &str,
    service: &str,
) -> Result<ParsedAuth, AuthError> {
    let compact: String = header.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(AuthError::AuthHeaderEmpty);
    }

    let rest = compact
        .strip_prefix(ALGORITHM)
        .ok_or(AuthError::UnsupportedSignatureVersion)?;

    let fields: Vec<&str> = rest.split(',').collect();
    let [credential, signed_headers, signature] = fields.as_slice() else {
        return Err(AuthError::MissingFields);
    };

    Ok(ParsedAuth {
        credential: parse_credential(credential, region, service)?,
        signed_headers: parse_signed_headers(signed_headers)?,
        signature: parse_signature(signature)?,
    })
}

fn parse_credential(
    element: &str,
    region: &str,
    service: &str,
) -> Result<CredentialScope, AuthError> {
    let (tag, value) = element.split_once('=').ok_or(AuthError::MissingFields)?;
    if tag != "Credential" {
        return Err(AuthError::MissingCredentialTag);
    }

    let segments: Vec<&str> = value.split('/').collect();
    if segments.len() < 5 {
        return Err(AuthError::MalformedCredential);
    }
    let (key_segments, scope) = segments.split_at(segments.len() - 4);
    let access_key_id = key_segments.join("/");
    if access_key_id.len() < 4 {
        return Err(AuthError::InvalidAccessKeyId(access_key_id));
    }

    let [date, scope_region, scope_service, terminal] = scope else {
        return Err(AuthError::MalformedCredential);
    };

    if date.len() != 8
        || !date.bytes().all(|b| b.is_ascii_digit())
        || NaiveDate::parse_from_str(date, SCOPE_DATE).is_err()
    {
        return Err(AuthError::MalformedCredentialDate((*date).to_owned()));
    }
    if !region.is_empty() && *scope_region != region {
        return Err(AuthError::RegionMismatch {
            expected: region.to_owned(),
            actual: (*scope_region).to_owned(),
        });
    }
    if *scope_service != service {
        return Err(AuthError::InvalidService((*scope_service).to_owned()));
    }
    if *terminal != TERMINAL {
        return Err(AuthError::InvalidRequestTerminal((*terminal).to_owned()));
    }

    Ok(CredentialScope {
        access_key_id,
        date: (*date).to_owned(),
        region: (*scope_region).to_owned(),
        service: (*scope_service).to_owned(),
    })
}

fn parse_signed_headers(element: &str) -> Result<Vec<String>, AuthError> {
    let parts: Vec<&str> = element.split('=').collect();
    let [tag, value] = parts.as_slice() else {
        return Err(AuthError::MissingFields);
    };
    if *tag != "SignedHeaders" {
        return Err(AuthError::MissingSignedHeadersTag);
    }
    if value.is_empty() {
        return Err(AuthError::MissingFields);
    }

    let headers: Vec<String> = value.split(';').map(ToOwned::to_owned).collect();
    if !headers.iter().any(|h| h == "host") {
        return Err(AuthError::UnsignedHeaders("host".to_owned()));
    }
    Ok(headers)
}

fn parse_signature(element: &str) -> Result<String, AuthError> {
    let parts: Vec<&str> = element.split('=').collect();
    let [tag, value] = parts.as_slice() else {
        return Err(AuthError::MissingFields);
    };
    if *tag != "Signature" {
        return Err(AuthError::MissingSignatureTag);
    }
    if value.is_empty() {
        return Err(AuthError::MissingFields);
    }
    Ok((*value).to_owned())
}

/// Verifies SigV4-signed requests for one region and service.
pub struct SigV4Verifier {
    region: String,
    service: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for SigV4Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigV4Verifier")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl SigV4Verifier {
    /// Create a verifier. An empty `region` accepts any scope region.
    pub fn new(
        region: impl Into<String>,
        service: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
            credentials,
        }
    }

    /// Configured region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Payload hash used in the canonical request.
    ///
    /// Only the parameter API hashes its body; every other service signs the
    /// empty-payload hash.
    #[must_use]
    pub fn payload_hash(&self, body: &[u8]) -> String {
        if self.service == SERVICE_SSM {
            hash_payload(body)
        } else {
            EMPTY_PAYLOAD_SHA256.to_owned()
        }
    }

    /// Verify a request given its parts and fully collected body.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] describing the first check that failed.
    pub fn verify(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
    ) -> Result<AuthResult, AuthError> {
        let payload_hash = self.payload_hash(body);

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .ok_or(AuthError::AuthHeaderEmpty)?
            .to_str()
            .map_err(|_| AuthError::MissingFields)?;

        let parsed = parse_authorization_header(auth_header, &self.region, &self.service)?;
        let credential = self.credentials.lookup(&parsed.credential.access_key_id)?;

        debug!(
            access_key_id = %parsed.credential.access_key_id,
            region = %parsed.credential.region,
            "verifying SigV4 signature"
        );

        let header_pairs = extract_signed_headers(parts, &parsed.signed_headers, body.len())?;
        let timestamp = request_timestamp(parts)?;

        let signed_refs: Vec<&str> = parsed.signed_headers.iter().map(String::as_str).collect();
        let canonical_request = build_canonical_request(
            parts.method.as_str(),
            parts.uri.path(),
            parts.uri.query().unwrap_or(""),
            &header_pairs,
            &signed_refs,
            &payload_hash,
        );
        debug!(canonical_request, "built canonical request");

        let canonical_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign =
            build_string_to_sign(&timestamp, &parsed.credential.scope(), &canonical_hash);
        debug!(string_to_sign, "built string to sign");

        let signing_key = derive_signing_key(
            &credential.secret_key,
            &parsed.credential.date,
            &parsed.credential.region,
            &parsed.credential.service,
        );
        let expected = compute_signature(&signing_key, &string_to_sign);

        if expected.as_bytes().ct_eq(parsed.signature.as_bytes()).into() {
            Ok(AuthResult {
                access_key_id: credential.access_key_id,
                owner: credential.owner,
                region: parsed.credential.region,
                service: parsed.credential.service,
                signed_headers: parsed.signed_headers,
            })
        } else {
            debug!(
                expected = %expected,
                provided = %parsed.signature,
                "signature mismatch"
            );
            Err(AuthError::SignatureDoesNotMatch)
        }
    }
}

/// Resolve the value of every signed header.
///
/// The header map wins, then the query string. `expect`, `host`,
/// `transfer-encoding` and `content-length` are synthesized when absent from
/// both.
fn extract_signed_headers(
    parts: &http::request::Parts,
    signed_headers: &[String],
    body_len: usize,
) -> Result<Vec<(String, String)>, AuthError> {
    let query: Vec<(String, String)> = parts
        .uri
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let mut pairs = Vec::with_capacity(signed_headers.len());
    for name in signed_headers {
        let before = pairs.len();

        for value in parts.headers.get_all(name.as_str()) {
            pairs.push((
                name.clone(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            ));
        }
        if pairs.len() > before {
            continue;
        }

        pairs.extend(
            query
                .iter()
                .filter(|(k, _)| k == name)
                .map(|(_, v)| (name.clone(), v.clone())),
        );
        if pairs.len() > before {
            continue;
        }

        let synthesized = match name.as_str() {
            "expect" => "100-continue".to_owned(),
            "host" => parts
                .uri
                .authority()
                .map(|a| a.as_str().to_owned())
                .ok_or_else(|| AuthError::UnsignedHeaders(name.clone()))?,
            "transfer-encoding" => String::new(),
            "content-length" => body_len.to_string(),
            _ => return Err(AuthError::UnsignedHeaders(name.clone())),
        };
        pairs.push((name.clone(), synthesized));
    }
    Ok(pairs)
}

/// `X-Amz-Date`, else `Date`, normalized to ISO-8601 basic format.
fn request_timestamp(parts: &http::request::Parts) -> Result<String, AuthError> {
    let raw = ["x-amz-date", "date"]
        .iter()
        .filter_map(|name| parts.headers.get(*name))
        .filter_map(|v| v.to_str().ok())
        .find(|v| !v.is_empty())
        .ok_or(AuthError::MissingDateHeader)?;

    let parsed = NaiveDateTime::parse_from_str(raw, ISO8601_BASIC)
        .map_err(|_| AuthError::MalformedDate(raw.to_owned()))?;
    Ok(parsed.format(ISO8601_BASIC).to_string())
}

/// Build the SigV4 string to sign.
///
/// ```
/// use homessm_auth::sigv4::build_string_to_sign;
///
/// let sts = build_string_to_sign("20240101T000000Z", "20240101/us-east-1/ssm/aws4_request", "abc");
/// assert_eq!(sts, "AWS4-HMAC-SHA256\n20240101T000000Z\n20240101/us-east-1/ssm/aws4_request\nabc");
/// ```
#[must_use]
pub fn build_string_to_sign(timestamp: &str, scope: &str, canonical_request_hash: &str) -> String {
    format!("{ALGORITHM}\n{timestamp}\n{scope}\n{canonical_request_hash}")
}

/// Derive the signing key.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, TERMINAL.as_bytes())
}

/// Hex-encoded HMAC-SHA256 of `data`.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}

/// Hex-encoded SHA-256 of a payload.
///
/// ```
/// use homessm_auth::sigv4::{EMPTY_PAYLOAD_SHA256, hash_payload};
///
/// assert_eq!(hash_payload(b""), EMPTY_PAYLOAD_SHA256);
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Produce an `Authorization` header value for a request, signing every
/// header currently present.
///
/// `timestamp` must match the request's `X-Amz-Date` header. Used by
/// clients and tests that talk to the server without an SDK.
#[must_use]
pub fn sign_request(
    parts: &http::request::Parts,
    body: &[u8],
    credential: &Credential,
    region: &str,
    service: &str,
    timestamp: &str,
) -> String {
    let mut names: Vec<String> = parts
        .headers
        .keys()
        .map(|k| k.as_str().to_owned())
        .filter(|k| k != "authorization")
        .collect();
    names.sort_unstable();
    names.dedup();

    let header_pairs: Vec<(String, String)> = parts
        .headers
        .iter()
        .filter(|(k, _)| k.as_str() != "authorization")
        .map(|(k, v)| {
            (
                k.as_str().to_owned(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();

    let payload_hash = if service == SERVICE_SSM {
        hash_payload(body)
    } else {
        EMPTY_PAYLOAD_SHA256.to_owned()
    };

    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let canonical = build_canonical_request(
        parts.method.as_str(),
        parts.uri.path(),
        parts.uri.query().unwrap_or(""),
        &header_pairs,
        &refs,
        &payload_hash,
    );

    let date = timestamp.get(..8).unwrap_or(timestamp);
    let scope = format!("{date}/{region}/{service}/{TERMINAL}");
    let string_to_sign = build_string_to_sign(
        timestamp,
        &scope,
        &hex::encode(Sha256::digest(canonical.as_bytes())),
    );
    let signing_key = derive_signing_key(&credential.secret_key, date, region, service);
    let signature = compute_signature(&signing_key, &string_to_sign);

    format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={}, Signature={signature}",
        credential.access_key_id,
        build_signed_headers_string(&refs),
    )
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
