//! SSM response serialization and error formatting.

use homessm_ssm_model::error::SsmError;

use crate::body::SsmResponseBody;

/// Content type for every response.
pub const CONTENT_TYPE: &str = "application/json";

/// Serialize an error into the JSON envelope.
///
/// ```json
/// {
///   "__type": "ParameterNotFound",
///   "Message": "Parameter /a not found.",
///   "RequestId": "…",
///   "HostId": "…"
/// }
/// ```
#[must_use]
pub fn error_to_json(error: &SsmError, request_id: &str, host_id: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "__type": error.error_type(),
        "Message": error.message,
        "RequestId": request_id,
        "HostId": host_id,
    }))
    .expect("JSON serialization of error cannot fail")
}

/// Convert an `SsmError` into a complete HTTP error response.
#[must_use]
pub fn error_to_response(error: &SsmError, request_id: &str) -> http::Response<SsmResponseBody> {
    let host_id = uuid::Uuid::new_v4().to_string();
    let body = SsmResponseBody::from_json(error_to_json(error, request_id, &host_id));

    http::Response::builder()
        .status(error.status_code)
        .header("content-type", CONTENT_TYPE)
        .header("x-amzn-requestid", request_id)
        .body(body)
        .expect("valid error response")
}

/// Build a success response from JSON bytes.
#[must_use]
pub fn json_response(json: Vec<u8>, request_id: &str) -> http::Response<SsmResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", CONTENT_TYPE)
        .header("x-amzn-requestid", request_id)
        .body(SsmResponseBody::from_json(json))
        .expect("valid JSON response")
}
