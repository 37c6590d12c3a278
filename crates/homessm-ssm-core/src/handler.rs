//! SSM handler implementation bridging HTTP to the provider.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;

use homessm_ssm_http::body::SsmResponseBody;
use homessm_ssm_http::dispatch::{RequestContext, SsmHandler};
use homessm_ssm_http::response::json_response;
use homessm_ssm_model::error::SsmError;
use homessm_ssm_model::operations::SsmOperation;

use crate::provider::HomeSsmProvider;

/// Handler that runs provider calls on the blocking pool.
#[derive(Debug, Clone)]
pub struct HomeSsmHandler {
    provider: Arc<HomeSsmProvider>,
}

impl HomeSsmHandler {
    /// Create a new handler wrapping a provider.
    #[must_use]
    pub fn new(provider: Arc<HomeSsmProvider>) -> Self {
        Self { provider }
    }
}

impl SsmHandler for HomeSsmHandler {
    fn handle_operation(
        &self,
        op: SsmOperation,
        body: Bytes,
        ctx: RequestContext,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<SsmResponseBody>, SsmError>> + Send>> {
        let provider = Arc::clone(&self.provider);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || dispatch(&provider, op, &body, &ctx))
                .await
                .map_err(|e| {
                    tracing::error!(operation = %op, error = %e, "provider task failed");
                    SsmError::internal_error().with_source(e)
                })?
        })
    }
}

/// Dispatch an SSM operation to the matching provider method.
fn dispatch(
    provider: &HomeSsmProvider,
    op: SsmOperation,
    body: &[u8],
    ctx: &RequestContext,
) -> Result<http::Response<SsmResponseBody>, SsmError> {
    let request_id = ctx.request_id.as_str();

    match op {
        SsmOperation::GetParameter => {
            let input = deserialize(body)?;
            let output = provider.handle_get_parameter(ctx, input)?;
            serialize(&output, request_id)
        }
        SsmOperation::GetParameters => {
            let input = deserialize(body)?;
            let output = provider.handle_get_parameters(ctx, input)?;
            serialize(&output, request_id)
        }
        SsmOperation::GetParametersByPath => {
            let input = deserialize(body)?;
            let output = provider.handle_get_parameters_by_path(ctx, input)?;
            serialize(&output, request_id)
        }
        SsmOperation::DescribeParameters => {
            let input = deserialize(body)?;
            let output = provider.handle_describe_parameters(ctx, input)?;
            serialize(&output, request_id)
        }
        SsmOperation::PutParameter => {
            let input = deserialize(body)?;
            let output = provider.handle_put_parameter(ctx, input)?;
            serialize(&output, request_id)
        }
        SsmOperation::DeleteParameter => {
            let input = deserialize(body)?;
            let output = provider.handle_delete_parameter(ctx, input)?;
            serialize(&output, request_id)
        }
        SsmOperation::DeleteParameters => {
            let input = deserialize(body)?;
            let output = provider.handle_delete_parameters(ctx, input)?;
            serialize(&output, request_id)
        }
        SsmOperation::AddTagsToResource => {
            let input = deserialize(body)?;
            let output = provider.handle_add_tags_to_resource(ctx, input)?;
            serialize(&output, request_id)
        }
        SsmOperation::RemoveTagsFromResource => {
            let input = deserialize(body)?;
            let output = provider.handle_remove_tags_from_resource(ctx, input)?;
            serialize(&output, request_id)
        }
        SsmOperation::ListTagsForResource => {
            let input = deserialize(body)?;
            let output = provider.handle_list_tags_for_resource(ctx, input)?;
            serialize(&output, request_id)
        }
    }
}

/// Deserialize a JSON request body into the input type.
fn deserialize<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, SsmError> {
    serde_json::from_slice(body)
        .map_err(|e| SsmError::validation(format!("Failed to deserialize request body: {e}")))
}

/// Serialize an output type into a JSON HTTP response.
fn serialize<T: serde::Serialize>(
    output: &T,
    request_id: &str,
) -> Result<http::Response<SsmResponseBody>, SsmError> {
    let json = serde_json::to_vec(output).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize response");
        SsmError::internal_error().with_source(e)
    })?;
    Ok(json_response(json, request_id))
}
