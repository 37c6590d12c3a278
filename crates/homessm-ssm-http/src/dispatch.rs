//! SSM handler trait and operation dispatch.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use homessm_ssm_model::error::SsmError;
use homessm_ssm_model::operations::SsmOperation;

use crate::body::SsmResponseBody;

/// The authenticated caller, handed to the handler with every operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestContext {
    /// Access key that signed the request.
    pub access_key_id: String,
    /// Owner label of that key.
    pub owner: String,
    /// Region from the credential scope.
    pub region: String,
    /// Request ID echoed in `x-amzn-RequestId`.
    pub request_id: String,
}

impl RequestContext {
    /// Build the context for a verified request.
    #[must_use]
    pub fn from_auth(auth: homessm_auth::AuthResult, request_id: &str) -> Self {
        Self {
            access_key_id: auth.access_key_id,
            owner: auth.owner,
            region: auth.region,
            request_id: request_id.to_owned(),
        }
    }
}

/// Trait the parameter service implements.
///
/// The handler receives the resolved operation, the raw JSON body and the
/// caller, and returns a complete HTTP response.
pub trait SsmHandler: Send + Sync + 'static {
    /// Handle an SSM operation and produce an HTTP response.
    fn handle_operation(
        &self,
        op: SsmOperation,
        body: Bytes,
        ctx: RequestContext,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<SsmResponseBody>, SsmError>> + Send>>;
}

/// Dispatch an SSM operation to the handler.
pub async fn dispatch_operation<H: SsmHandler>(
    handler: &H,
    op: SsmOperation,
    body: Bytes,
    ctx: RequestContext,
) -> Result<http::Response<SsmResponseBody>, SsmError> {
    tracing::debug!(
        operation = %op,
        access_key_id = %ctx.access_key_id,
        write = op.is_write(),
        "dispatching SSM operation"
    );
    handler.handle_operation(op, body, ctx).await
}
