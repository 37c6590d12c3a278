//! Hierarchy and describe integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_ssm::types::{ParameterStringFilter, ParameterType};

    use crate::{cleanup_prefix, ssm_client, test_prefix};

    async fn seed(client: &aws_sdk_ssm::Client, names: &[String]) {
        for name in names {
            client
                .put_parameter()
                .name(name)
                .value("v")
                .r#type(ParameterType::String)
                .send()
                .await
                .unwrap_or_else(|e| panic!("failed to put {name}: {e}"));
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_one_level_or_recursively() {
        let client = ssm_client();
        let prefix = test_prefix("path");
        let names = vec![
            format!("{prefix}/a"),
            format!("{prefix}/b"),
            format!("{prefix}/nested/c"),
        ];
        seed(&client, &names).await;

        let one_level = client
            .get_parameters_by_path()
            .path(&prefix)
            .send()
            .await
            .expect("by-path should succeed");
        let mut found: Vec<&str> = one_level.parameters().iter().filter_map(|p| p.name()).collect();
        found.sort_unstable();
        assert_eq!(found, [names[0].as_str(), names[1].as_str()]);

        let recursive = client
            .get_parameters_by_path()
            .path(&prefix)
            .recursive(true)
            .send()
            .await
            .expect("recursive by-path should succeed");
        assert_eq!(recursive.parameters().len(), 3);

        cleanup_prefix(&client, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_paginate_by_path() {
        let client = ssm_client();
        let prefix = test_prefix("page");
        let names: Vec<String> = (0..5).map(|i| format!("{prefix}/p{i}")).collect();
        seed(&client, &names).await;

        let mut seen = Vec::new();
        let mut next_token = None;
        loop {
            let mut req = client
                .get_parameters_by_path()
                .path(&prefix)
                .max_results(2);
            if let Some(token) = next_token.take() {
                req = req.next_token(token);
            }
            let resp = req.send().await.expect("page should succeed");
            assert!(resp.parameters().len() <= 2);
            seen.extend(
                resp.parameters()
                    .iter()
                    .filter_map(|p| p.name().map(ToOwned::to_owned)),
            );
            match resp.next_token() {
                Some(token) => next_token = Some(token.to_owned()),
                None => break,
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, names);

        cleanup_prefix(&client, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_describe_with_begins_with_filter() {
        let client = ssm_client();
        let prefix = test_prefix("describe");
        let names = vec![format!("{prefix}/x"), format!("{prefix}/deep/y")];
        seed(&client, &names).await;

        let filter = ParameterStringFilter::builder()
            .key("Name")
            .option("BeginsWith")
            .values(&prefix)
            .build()
            .expect("filter should build");
        let described = client
            .describe_parameters()
            .parameter_filters(filter)
            .max_results(50)
            .send()
            .await
            .expect("describe should succeed");
        assert_eq!(described.parameters().len(), 2);
        assert!(described.parameters().iter().all(|m| m.version() == 1));

        cleanup_prefix(&client, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_name_filter_in_by_path() {
        let client = ssm_client();
        let filter = ParameterStringFilter::builder()
            .key("Name")
            .values("/x")
            .build()
            .expect("filter should build");

        let err = client
            .get_parameters_by_path()
            .path("/")
            .parameter_filters(filter)
            .send()
            .await
            .expect_err("Name filter should be rejected")
            .into_service_error();
        assert!(err.is_invalid_filter_key(), "{err:?}");
    }
}
