//! SSM HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;

use homessm_auth::sigv4::MAX_PAYLOAD_BYTES;
use homessm_auth::{AuthError, SigV4Verifier};
use homessm_ssm_model::error::{SsmError, SsmErrorCode};

use crate::body::SsmResponseBody;
use crate::dispatch::{RequestContext, SsmHandler, dispatch_operation};
use crate::response::{CONTENT_TYPE, error_to_response};
use crate::router::resolve_operation;

/// Value of the `Server` response header.
const SERVER_NAME: &str = "HomeSSM";

/// Configuration for the SSM HTTP service.
#[derive(Debug, Clone)]
pub struct SsmHttpConfig {
    /// Verifier every request must pass before dispatch.
    pub verifier: Arc<SigV4Verifier>,
}

/// Hyper `Service` implementation for the parameter API.
#[derive(Debug)]
pub struct SsmHttpService<H: SsmHandler> {
    handler: Arc<H>,
    config: Arc<SsmHttpConfig>,
}

impl<H: SsmHandler> SsmHttpService<H> {
    /// Create a new `SsmHttpService`.
    pub fn new(handler: Arc<H>, config: SsmHttpConfig) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }
}

impl<H: SsmHandler> Clone for SsmHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: SsmHandler> hyper::service::Service<http::Request<Incoming>> for SsmHttpService<H> {
    type Response = http::Response<SsmResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let config = Arc::clone(&self.config);
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            Ok(process_request(req, handler.as_ref(), &config, &request_id).await)
        })
    }
}

/// Run one request through the full pipeline and return the final response.
///
/// Collect the body, verify the signature, require `POST`, resolve the
/// operation and dispatch. Any failure becomes the JSON error envelope.
pub async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    config: &SsmHttpConfig,
    request_id: &str,
) -> http::Response<SsmResponseBody>
where
    H: SsmHandler,
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, incoming) = req.into_parts();

    let response = match collect_body(incoming).await {
        Ok(body) => match handle_request(&parts, body, handler, config, request_id).await {
            Ok(response) => response,
            Err(err) => error_to_response(&err, request_id),
        },
        Err(err) => error_to_response(&err, request_id),
    };

    add_common_headers(response, request_id)
}

async fn handle_request<H: SsmHandler>(
    parts: &http::request::Parts,
    body: Bytes,
    handler: &H,
    config: &SsmHttpConfig,
    request_id: &str,
) -> Result<http::Response<SsmResponseBody>, SsmError> {
    let auth = config.verifier.verify(parts, &body).map_err(|e| {
        tracing::debug!(error = %e, "request authentication failed");
        auth_error_to_ssm(e)
    })?;

    if parts.method != http::Method::POST {
        return Err(SsmError::validation(format!(
            "SSM requires POST method, got {}",
            parts.method,
        )));
    }

    let op = resolve_operation(&parts.headers)?;
    dispatch_operation(handler, op, body, RequestContext::from_auth(auth, request_id)).await
}

/// Collect the body, refusing anything over [`MAX_PAYLOAD_BYTES`].
async fn collect_body<B>(body: B) -> Result<Bytes, SsmError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(body, MAX_PAYLOAD_BYTES)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                tracing::error!(limit = MAX_PAYLOAD_BYTES, "request body exceeds limit");
            } else {
                tracing::error!(error = %e, "failed to read request body");
            }
            SsmError::internal_error()
        })
}

/// Map a verification failure to its wire error.
#[must_use]
pub fn auth_error_to_ssm(err: AuthError) -> SsmError {
    let code = match &err {
        AuthError::AuthHeaderEmpty => SsmErrorCode::AuthHeaderEmpty,
        AuthError::UnsupportedSignatureVersion => SsmErrorCode::UnsupportedSignatureVersion,
        AuthError::MissingFields => SsmErrorCode::MissingFields,
        AuthError::MissingCredentialTag => SsmErrorCode::MissingCredentialTag,
        AuthError::MalformedCredential => SsmErrorCode::MalformedCredential,
        AuthError::MalformedCredentialDate(_) => SsmErrorCode::MalformedCredentialDate,
        AuthError::RegionMismatch { expected, .. } => {
            let message = format!(
                "The authorization header is malformed; the region is wrong; expecting '{expected}'."
            );
            return SsmError::with_message(SsmErrorCode::AuthorizationHeaderMalformed, message)
                .with_source(err.clone());
        }
        AuthError::InvalidService(_) => SsmErrorCode::InvalidServiceForEndpoint,
        AuthError::InvalidRequestTerminal(_) => SsmErrorCode::InvalidRequestTerminal,
        AuthError::MissingSignedHeadersTag => SsmErrorCode::MissingSignedHeadersTag,
        AuthError::MissingSignatureTag => SsmErrorCode::MissingSignatureTag,
        AuthError::InvalidAccessKeyId(_) => SsmErrorCode::InvalidAccessKeyId,
        AuthError::UnsignedHeaders(_) => SsmErrorCode::UnsignedHeaders,
        AuthError::MissingDateHeader => SsmErrorCode::MissingDateHeader,
        AuthError::MalformedDate(_) => SsmErrorCode::MalformedDate,
        AuthError::SignatureDoesNotMatch => SsmErrorCode::SignatureDoesNotMatch,
    };
    SsmError::new(code).with_source(err)
}

/// Add the headers every response carries.
fn add_common_headers(
    mut response: http::Response<SsmResponseBody>,
    request_id: &str,
) -> http::Response<SsmResponseBody> {
    let content_length = http_body::Body::size_hint(response.body())
        .exact()
        .unwrap_or(0);
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry("x-amzn-requestid").or_insert(hv);
    }
    headers
        .entry("content-type")
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));
    headers.insert(http::header::CONTENT_LENGTH, http::HeaderValue::from(content_length));
    headers.insert("accept-ranges", http::HeaderValue::from_static("bytes"));
    headers.insert("server", http::HeaderValue::from_static(SERVER_NAME));

    response
}
