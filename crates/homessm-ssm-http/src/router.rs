//! SSM request router.
//!
//! Every call is a `POST` with the operation in `X-Amz-Target`:
//!
//! ```text
//! X-Amz-Target: AmazonSSM.GetParameter
//! ```

use homessm_ssm_model::error::SsmError;
use homessm_ssm_model::operations::SsmOperation;

/// The expected prefix for the `X-Amz-Target` header value.
const TARGET_PREFIX: &str = "AmazonSSM.";

/// Resolve the SSM operation from the request headers.
pub fn resolve_operation(headers: &http::HeaderMap) -> Result<SsmOperation, SsmError> {
    let target = headers
        .get("x-amz-target")
        .ok_or_else(SsmError::missing_action)?
        .to_str()
        .map_err(|_| SsmError::missing_action())?;

    target
        .strip_prefix(TARGET_PREFIX)
        .and_then(SsmOperation::from_name)
        .ok_or_else(|| SsmError::unknown_operation(target))
}

#[cfg(test)]
mod tests {
    use homessm_ssm_model::error::SsmErrorCode;

    use super::*;

    fn headers_with_target(target: &str) -> http::HeaderMap {
        let mut map = http::HeaderMap::new();
        map.insert("x-amz-target", http::HeaderValue::from_str(target).unwrap());
        map
    }

    #[test]
    fn test_should_resolve_all_operations() {
        let ops = [
            ("AmazonSSM.GetParameter", SsmOperation::GetParameter),
            ("AmazonSSM.GetParameters", SsmOperation::GetParameters),
            ("AmazonSSM.GetParametersByPath", SsmOperation::GetParametersByPath),
            ("AmazonSSM.DescribeParameters", SsmOperation::DescribeParameters),
            ("AmazonSSM.PutParameter", SsmOperation::PutParameter),
            ("AmazonSSM.DeleteParameter", SsmOperation::DeleteParameter),
            ("AmazonSSM.DeleteParameters", SsmOperation::DeleteParameters),
            ("AmazonSSM.AddTagsToResource", SsmOperation::AddTagsToResource),
            ("AmazonSSM.RemoveTagsFromResource", SsmOperation::RemoveTagsFromResource),
            ("AmazonSSM.ListTagsForResource", SsmOperation::ListTagsForResource),
        ];
        for (target, expected) in ops {
            let op = resolve_operation(&headers_with_target(target)).unwrap();
            assert_eq!(op, expected, "failed for target: {target}");
        }
    }

    #[test]
    fn test_should_error_on_missing_target() {
        let err = resolve_operation(&http::HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, SsmErrorCode::ValidationError);
        assert!(err.message.contains("X-Amz-Target"));
    }

    #[test]
    fn test_should_name_unknown_operation_in_message() {
        let err = resolve_operation(&headers_with_target("AmazonSSM.SendCommand")).unwrap_err();
        assert_eq!(err.code, SsmErrorCode::ValidationError);
        assert!(err.message.contains("AmazonSSM.SendCommand"));
    }

    #[test]
    fn test_should_error_on_wrong_prefix() {
        let err =
            resolve_operation(&headers_with_target("DynamoDB_20120810.GetParameter")).unwrap_err();
        assert_eq!(err.code, SsmErrorCode::ValidationError);
    }
}
