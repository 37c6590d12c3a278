//! Signature verification integration tests.

#[cfg(test)]
mod tests {
    use crate::{endpoint_url, ssm_client_with, test_prefix};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_access_key() {
        let client = ssm_client_with("AKIAUNKNOWNKEY", "whatever");

        let err = client
            .get_parameter()
            .name(format!("{}/x", test_prefix("auth")))
            .send()
            .await
            .expect_err("unknown key should be rejected");
        let code = aws_sdk_ssm::error::ProvideErrorMetadata::code(&err);
        assert_eq!(code, Some("InvalidAccessKeyId"), "{err:?}");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_wrong_secret() {
        let client = ssm_client_with("test", "not-the-secret");

        let err = client
            .get_parameter()
            .name(format!("{}/x", test_prefix("auth")))
            .send()
            .await
            .expect_err("bad signature should be rejected");
        let code = aws_sdk_ssm::error::ProvideErrorMetadata::code(&err);
        assert_eq!(code, Some("SignatureDoesNotMatch"), "{err:?}");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unsigned_request() {
        let resp = reqwest::Client::new()
            .post(endpoint_url())
            .header("Content-Type", "application/x-amz-json-1.1")
            .header("X-Amz-Target", "AmazonSSM.GetParameter")
            .body(r#"{"Name":"/x"}"#)
            .send()
            .await
            .expect("request should complete");

        assert_eq!(resp.status().as_u16(), 400);
        assert_eq!(
            resp.headers()
                .get("server")
                .and_then(|v| v.to_str().ok()),
            Some("HomeSSM")
        );
        let body: serde_json::Value = resp.json().await.expect("error body is JSON");
        assert_eq!(body["__type"], "InvalidArgument");
        assert!(body["RequestId"].is_string());
    }
}
