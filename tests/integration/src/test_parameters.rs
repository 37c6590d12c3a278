//! Parameter lifecycle integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_ssm::types::{ParameterTier, ParameterType};

    use crate::{cleanup_prefix, ssm_client, test_prefix};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_and_get_string_parameter() {
        let client = ssm_client();
        let prefix = test_prefix("string");
        let name = format!("{prefix}/greeting");

        let put = client
            .put_parameter()
            .name(&name)
            .value("hello")
            .r#type(ParameterType::String)
            .send()
            .await
            .expect("put should succeed");
        assert_eq!(put.version(), 1);
        assert_eq!(put.tier(), Some(&ParameterTier::Standard));

        let got = client
            .get_parameter()
            .name(&name)
            .send()
            .await
            .expect("get should succeed");
        let param = got.parameter().expect("parameter present");
        assert_eq!(param.value(), Some("hello"));
        assert_eq!(param.version(), 1);
        assert_eq!(param.r#type(), Some(&ParameterType::String));
        assert!(
            param
                .arn()
                .is_some_and(|arn| arn.ends_with(&format!("parameter{name}")))
        );

        cleanup_prefix(&client, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_hide_secure_string_without_decryption() {
        let client = ssm_client();
        let prefix = test_prefix("secure");
        let name = format!("{prefix}/db/password");

        client
            .put_parameter()
            .name(&name)
            .value("hunter2")
            .r#type(ParameterType::SecureString)
            .send()
            .await
            .expect("put should succeed");

        let sealed = client
            .get_parameter()
            .name(&name)
            .send()
            .await
            .expect("get should succeed");
        let sealed_value = sealed.parameter().and_then(|p| p.value()).unwrap_or("");
        assert_ne!(sealed_value, "hunter2");
        assert!(!sealed_value.is_empty());

        let plain = client
            .get_parameter()
            .name(&name)
            .with_decryption(true)
            .send()
            .await
            .expect("get should succeed");
        assert_eq!(plain.parameter().and_then(|p| p.value()), Some("hunter2"));

        cleanup_prefix(&client, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_bump_version_on_overwrite() {
        let client = ssm_client();
        let prefix = test_prefix("overwrite");
        let name = format!("{prefix}/value");

        client
            .put_parameter()
            .name(&name)
            .value("one")
            .r#type(ParameterType::String)
            .send()
            .await
            .expect("first put should succeed");

        let err = client
            .put_parameter()
            .name(&name)
            .value("two")
            .r#type(ParameterType::String)
            .send()
            .await
            .expect_err("second put without overwrite should fail")
            .into_service_error();
        assert!(err.is_parameter_already_exists(), "{err:?}");

        let put = client
            .put_parameter()
            .name(&name)
            .value("two")
            .r#type(ParameterType::String)
            .overwrite(true)
            .send()
            .await
            .expect("overwrite should succeed");
        assert_eq!(put.version(), 2);

        cleanup_prefix(&client, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_missing_parameter() {
        let client = ssm_client();
        let name = format!("{}/missing", test_prefix("missing"));

        let err = client
            .get_parameter()
            .name(&name)
            .send()
            .await
            .expect_err("get of missing parameter should fail")
            .into_service_error();
        assert!(err.is_parameter_not_found(), "{err:?}");

        let err = client
            .delete_parameter()
            .name(&name)
            .send()
            .await
            .expect_err("delete of missing parameter should fail")
            .into_service_error();
        assert!(err.is_parameter_not_found(), "{err:?}");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_split_batch_get_into_found_and_invalid() {
        let client = ssm_client();
        let prefix = test_prefix("batch");
        let present = format!("{prefix}/present");
        let absent = format!("{prefix}/absent");

        client
            .put_parameter()
            .name(&present)
            .value("x")
            .r#type(ParameterType::String)
            .send()
            .await
            .expect("put should succeed");

        let got = client
            .get_parameters()
            .names(&present)
            .names(&absent)
            .send()
            .await
            .expect("batch get should succeed");
        assert_eq!(got.parameters().len(), 1);
        assert_eq!(got.invalid_parameters(), [absent.clone()]);

        let deleted = client
            .delete_parameters()
            .names(&present)
            .names(&absent)
            .send()
            .await
            .expect("batch delete should succeed");
        assert_eq!(deleted.deleted_parameters(), [present]);
        assert_eq!(deleted.invalid_parameters(), [absent]);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_reserved_names() {
        let client = ssm_client();

        let err = client
            .put_parameter()
            .name("/aws/reserved")
            .value("x")
            .r#type(ParameterType::String)
            .send()
            .await
            .expect_err("reserved name should be rejected")
            .into_service_error();
        assert_eq!(
            aws_sdk_ssm::error::ProvideErrorMetadata::code(&err),
            Some("InvalidParameterName")
        );
    }
}
